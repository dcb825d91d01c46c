//! Query expression evaluation and scoring over JSON documents.
//!
//! An expression either rejects a document or accepts it with a relevance score: every
//! satisfied clause contributes `1.0`, except free-text match clauses which contribute the
//! number of distinct query terms found in the field.

use serde_json::Value;
use std::{cmp::Ordering, collections::HashMap};

use searchlayer_core::{
    error::SearchLayerError,
    mapping::QUERYABLE_FIELD,
    query::{Expr, FieldOp, QueryVisitor},
};

/// Comparable view of JSON values, with all numbers normalized to `f64`.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Value> for Comparable<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Null => Comparable::Null,
            Value::Bool(value) => Comparable::Bool(*value),
            Value::Number(value) => value
                .as_f64()
                .map(Comparable::Number)
                .unwrap_or(Comparable::Null),
            Value::String(value) => Comparable::String(value),
            Value::Array(values) => Comparable::Array(values.iter().map(Comparable::from).collect()),
            Value::Object(map) => Comparable::Map(
                map.iter()
                    .map(|(key, value)| (key.as_str(), Comparable::from(value)))
                    .collect(),
            ),
        }
    }
}

impl PartialEq for Comparable<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for Comparable<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Resolves a dotted path, descending into arrays of objects.
///
/// A path ending in the analyzed sub-field of a multi-field falls back to the parent value,
/// since stored documents only hold the original.
pub(crate) fn resolve<'a>(document: &'a Value, path: &str) -> Vec<&'a Value> {
    let values = resolve_path(document, path);

    if values.is_empty() {
        if let Some(parent) = path
            .strip_suffix(QUERYABLE_FIELD)
            .and_then(|rest| rest.strip_suffix('.'))
        {
            return resolve_path(document, parent);
        }
    }

    values
}

fn resolve_path<'a>(document: &'a Value, path: &str) -> Vec<&'a Value> {
    let mut current = vec![document];

    for segment in path.split('.') {
        current = current
            .into_iter()
            .flat_map(|value| match value {
                Value::Object(map) => map.get(segment).into_iter().collect::<Vec<_>>(),
                Value::Array(items) => items
                    .iter()
                    .filter_map(|item| item.as_object().and_then(|map| map.get(segment)))
                    .collect(),
                _ => Vec::new(),
            })
            .collect();
    }

    current.retain(|value| !value.is_null());
    current
}

/// Lower-cased alphanumeric terms of a text.
pub(crate) fn analyze(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|term| !term.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn terms_of(value: &Value, terms: &mut Vec<String>) {
    match value {
        Value::String(text) => terms.extend(analyze(text)),
        Value::Array(items) => items.iter().for_each(|item| terms_of(item, terms)),
        Value::Number(number) => terms.push(number.to_string()),
        Value::Bool(flag) => terms.push(flag.to_string()),
        _ => {}
    }
}

const CLAUSE_SCORE: f32 = 1.0;

fn accept(matched: bool) -> Option<f32> {
    matched.then_some(CLAUSE_SCORE)
}

pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Value,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Value) -> Self {
        Self { document }
    }

    /// Returns the score of the document, or `None` if the expression rejects it.
    pub fn score(&mut self, expr: &Expr) -> Option<f32> {
        self.visit_expr(expr).unwrap_or(None)
    }

    pub fn matches(&mut self, expr: &Expr) -> bool {
        self.score(expr).is_some()
    }

    fn compare(field_value: &Value, op: &FieldOp, value: &Value) -> bool {
        let left = Comparable::from(field_value);
        let right = Comparable::from(value);

        match op {
            FieldOp::Eq => left == right,
            FieldOp::Ne => left != right,
            FieldOp::Gt | FieldOp::Gte | FieldOp::Lt | FieldOp::Lte => match left.partial_cmp(&right) {
                Some(ordering) => match op {
                    FieldOp::Gt => ordering == Ordering::Greater,
                    FieldOp::Gte => ordering != Ordering::Less,
                    FieldOp::Lt => ordering == Ordering::Less,
                    _ => ordering != Ordering::Greater,
                },
                None => false,
            },
            FieldOp::Contains => Self::contains(&left, &right),
            FieldOp::NotContains => !Self::contains(&left, &right),
            FieldOp::StartsWith => match (left, right) {
                (Comparable::String(left), Comparable::String(right)) => left.starts_with(right),
                _ => false,
            },
            FieldOp::EndsWith => match (left, right) {
                (Comparable::String(left), Comparable::String(right)) => left.ends_with(right),
                _ => false,
            },
            FieldOp::AnyOf => Self::any_of(&left, &right),
            FieldOp::NoneOf => !Self::any_of(&left, &right),
            FieldOp::Match => Self::match_terms(field_value, value) > 0,
        }
    }

    fn contains(left: &Comparable<'_>, right: &Comparable<'_>) -> bool {
        match (left, right) {
            (Comparable::Array(items), _) => items.iter().any(|item| item == right),
            (Comparable::String(left), Comparable::String(right)) => left.contains(right),
            _ => false,
        }
    }

    fn any_of(left: &Comparable<'_>, right: &Comparable<'_>) -> bool {
        match (left, right) {
            (Comparable::Array(items), Comparable::Array(values)) => {
                values.iter().any(|value| items.contains(value))
            }
            (Comparable::Array(items), single) => items.contains(single),
            (single, Comparable::Array(values)) => values.contains(single),
            _ => false,
        }
    }

    /// Number of distinct query terms found among the terms of the field.
    fn match_terms(field_value: &Value, text: &Value) -> usize {
        let mut field_terms = Vec::new();
        terms_of(field_value, &mut field_terms);

        let mut query_terms = Vec::new();
        terms_of(text, &mut query_terms);
        query_terms.sort();
        query_terms.dedup();

        query_terms
            .iter()
            .filter(|term| field_terms.contains(term))
            .count()
    }
}

impl QueryVisitor for DocumentEvaluator<'_> {
    type Output = Option<f32>;
    type Error = SearchLayerError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        let mut total = 0.0;

        for expr in exprs {
            match self.visit_expr(expr)? {
                Some(score) => total += score,
                None => return Ok(None),
            }
        }

        Ok(Some(total))
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        let mut total = None;

        for expr in exprs {
            if let Some(score) = self.visit_expr(expr)? {
                total = Some(total.unwrap_or(0.0) + score);
            }
        }

        Ok(total)
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        Ok(accept(self.visit_expr(expr)?.is_none()))
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        Ok(accept(!resolve(self.document, field).is_empty() == should_exist))
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Value) -> Result<Self::Output, Self::Error> {
        let values = resolve(self.document, field);

        if values.is_empty() {
            return Ok(None);
        }

        if let FieldOp::Match = op {
            let best = values
                .iter()
                .map(|field_value| Self::match_terms(field_value, value))
                .max()
                .unwrap_or(0);

            return Ok((best > 0).then_some(best as f32));
        }

        let matched = match op {
            FieldOp::Ne | FieldOp::NotContains | FieldOp::NoneOf => {
                values.iter().all(|field_value| Self::compare(field_value, op, value))
            }
            _ => values.iter().any(|field_value| Self::compare(field_value, op, value)),
        };

        Ok(accept(matched))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use searchlayer_core::query::Filter;
    use serde_json::json;

    fn tweet() -> Value {
        json!({
            "user": "kimchy",
            "message": "The quick brown dog jumps over the lazy dog",
            "likes": 12,
            "tags": ["animals", "fox"],
            "replies": [{ "author": "shay" }, { "author": "clint" }],
        })
    }

    fn score(expr: Expr) -> Option<f32> {
        let document = tweet();
        DocumentEvaluator::new(&document).score(&expr)
    }

    #[test]
    fn comparisons() {
        assert_eq!(score(Filter::eq("user", "kimchy")), Some(1.0));
        assert_eq!(score(Filter::ne("user", "kimchy")), None);
        assert_eq!(score(Filter::gte("likes", 12)), Some(1.0));
        assert_eq!(score(Filter::lt("likes", 12.5)), Some(1.0));
        assert_eq!(score(Filter::gt("user", 1)), None);
    }

    #[test]
    fn missing_fields_never_match_field_clauses() {
        assert_eq!(score(Filter::eq("retweets", 0)), None);
        assert_eq!(score(Filter::not_exists("retweets")), Some(1.0));
    }

    #[test]
    fn arrays_and_dotted_paths() {
        assert_eq!(score(Filter::contains("tags", "fox")), Some(1.0));
        assert_eq!(score(Filter::any_of("tags", json!(["cats", "animals"]))), Some(1.0));
        assert_eq!(score(Filter::eq("replies.author", "clint")), Some(1.0));
        assert_eq!(score(Filter::none_of("tags", json!(["cats"]))), Some(1.0));
    }

    #[test]
    fn match_scores_distinct_terms() {
        assert_eq!(score(Filter::matches("message", "dog")), Some(1.0));
        assert_eq!(score(Filter::matches("message", "lazy DOG dog cat")), Some(2.0));
        assert_eq!(score(Filter::matches("message", "cat")), None);
    }

    #[test]
    fn queryable_sub_field_falls_back_to_parent() {
        assert_eq!(score(Filter::matches("user.queryable", "KIMCHY")), Some(1.0));
    }

    #[test]
    fn boolean_combinators_sum_scores() {
        let expr = Filter::or([
            Filter::matches("message", "quick dog"),
            Filter::eq("user", "nobody"),
            Filter::exists("likes"),
        ]);
        assert_eq!(score(expr), Some(3.0));

        let expr = Filter::and([Filter::eq("user", "kimchy"), Filter::eq("likes", 0)]);
        assert_eq!(score(expr), None);

        assert_eq!(score(Filter::eq("likes", 0).not()), Some(1.0));
    }
}
