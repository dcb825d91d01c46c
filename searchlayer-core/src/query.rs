//! Query construction for searches and delete-by-query.
//!
//! Expressions are built with [`Filter`] and combined into a [`ComplexQuery`], the request
//! handed to [`Repository::execute_search`](crate::repository::Repository::execute_search).
//! A complex query separates the `query` part, which contributes to relevance scoring, from the
//! `filter` part, which only restricts the result set.
//!
//! ```ignore
//! use searchlayer::query::{ComplexQuery, Filter, SortDirection};
//!
//! let query = ComplexQuery::builder()
//!     .candidate("tweet")
//!     .query(Filter::matches("message", "dog"))
//!     .filter(Filter::gte("postDate", "2024-01-01"))
//!     .sort("postDate", SortDirection::Desc)
//!     .limit(20)
//!     .build();
//! ```
//!
//! # Filter Expression API
//!
//! - Comparison: `eq`, `ne`, `gt`, `gte`, `lt`, `lte`
//! - String: `starts_with`, `ends_with`, `contains`, `not_contains`
//! - Free text: `matches`
//! - Existence: `exists`, `not_exists`
//! - Array: `any_of`, `none_of`
//! - Logical: `and`, `or`

use serde_json::Value;

use crate::{error::SearchLayerError, page::PaginationParams};

/// Order of sorted search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Smallest value first.
    Asc,
    /// Largest value first.
    Desc,
}

/// Sort specification for search results.
///
/// Sorting replaces score order. Ties keep insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    /// Property name, or a dotted path into a nested object.
    pub field: String,
    /// Whether the smallest or the largest value comes first.
    pub direction: SortDirection,
}

/// Field operators for expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOp {
    /// Field value equals the operand exactly.
    Eq,
    /// Field value differs from the operand.
    Ne,
    /// Field value is greater than the operand.
    Gt,
    /// Field value is greater than or equal to the operand.
    Gte,
    /// Field value is less than the operand.
    Lt,
    /// Field value is less than or equal to the operand.
    Lte,
    /// String or array contains value.
    Contains,
    /// String or array does not contain value.
    NotContains,
    /// String field begins with the operand.
    StartsWith,
    /// String field ends with the operand.
    EndsWith,
    /// Array contains any of the values.
    AnyOf,
    /// Array contains none of the values.
    NoneOf,
    /// Analyzed free-text match: any term of the value occurs in the field.
    Match,
}

/// A query or filter expression.
///
/// The same tree serves as the scored query and as the unscored filter of a
/// [`ComplexQuery`]. Build it with [`Filter`] and the chaining methods below.
///
/// ```ignore
/// let expr = Filter::and([
///     Filter::eq("user", "kimchy"),
///     Filter::gte("likes", 10),
/// ]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Every sub-expression matches. An empty list matches everything.
    And(Vec<Expr>),
    /// At least one sub-expression matches.
    Or(Vec<Expr>),
    /// The inner expression does not match.
    Not(Box<Expr>),
    /// Checks that a field exists (`true`) or is absent (`false`).
    Exists(String, bool),
    /// Compares one field against an operand.
    Field {
        /// Property name, or a dotted path into a nested object.
        field: String,
        /// How the field is compared.
        op: FieldOp,
        /// The operand, as the JSON the field is stored as.
        value: Value,
    },
}

impl Expr {
    /// Creates a single field comparison.
    pub fn field(field: String, op: FieldOp, value: Value) -> Self {
        Expr::Field { field, op, value }
    }

    /// Combines with another expression using logical AND, flattening nested ANDs.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut list) => {
                list.push(other);
                Expr::And(list)
            }
            _ => Expr::And(vec![self, other]),
        }
    }

    /// Combines with another expression using logical OR, flattening nested ORs.
    pub fn or(self, other: Expr) -> Self {
        match self {
            Expr::Or(mut list) => {
                list.push(other);
                Expr::Or(list)
            }
            _ => Expr::Or(vec![self, other]),
        }
    }

    /// Wraps the expression in a logical NOT.
    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }
}

/// Constructors for [`Expr`] values.
///
/// Field names take anything `Into<String>` and operands anything `Into<Value>`, so plain
/// literals work.
///
/// ```ignore
/// let expr = Filter::eq("user", "kimchy").and(Filter::matches("message", "trying out"));
/// ```
pub struct Filter;

impl Filter {
    /// Matches documents whose field equals `value`.
    ///
    /// Equality is exact, so target the non-analyzed form of a string property.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::field(field.into(), FieldOp::Eq, value.into())
    }

    /// Matches documents whose field does not equal `value`.
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::field(field.into(), FieldOp::Ne, value.into())
    }

    /// Matches documents whose field is greater than `value`.
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::field(field.into(), FieldOp::Gt, value.into())
    }

    /// Matches documents whose field is greater than or equal to `value`.
    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::field(field.into(), FieldOp::Gte, value.into())
    }

    /// Matches documents whose field is less than `value`.
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::field(field.into(), FieldOp::Lt, value.into())
    }

    /// Matches documents whose field is less than or equal to `value`.
    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::field(field.into(), FieldOp::Lte, value.into())
    }

    /// Matches documents whose string field starts with `value`.
    pub fn starts_with(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::field(field.into(), FieldOp::StartsWith, value.into())
    }

    /// Matches documents whose string field ends with `value`.
    pub fn ends_with(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::field(field.into(), FieldOp::EndsWith, value.into())
    }

    /// Matches documents whose string or array field contains `value`.
    pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::field(field.into(), FieldOp::Contains, value.into())
    }

    /// Matches documents whose string or array field does not contain `value`.
    pub fn not_contains(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::field(field.into(), FieldOp::NotContains, value.into())
    }

    /// Free-text match against an analyzed field.
    ///
    /// For multi-field properties, target the analyzed sub-field, e.g. `"user.queryable"`.
    pub fn matches(field: impl Into<String>, text: impl Into<String>) -> Expr {
        Expr::field(field.into(), FieldOp::Match, Value::String(text.into()))
    }

    /// Matches documents that have the field.
    pub fn exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), true)
    }

    /// Matches documents that lack the field.
    pub fn not_exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), false)
    }

    /// Matches documents that satisfy every expression.
    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::And(exprs.into_iter().collect())
    }

    /// Matches documents that satisfy at least one expression.
    pub fn or(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::Or(exprs.into_iter().collect())
    }

    /// Matches documents whose array field shares an element with the `value` array.
    pub fn any_of(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::field(field.into(), FieldOp::AnyOf, value.into())
    }

    /// Matches documents whose array field shares no element with the `value` array.
    pub fn none_of(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::field(field.into(), FieldOp::NoneOf, value.into())
    }
}

/// A search request.
///
/// `candidates` lists the document-type names a search may return. A single-type repository
/// ignores it and always searches its bound type; a multi-type repository requires at least one
/// candidate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComplexQuery {
    pub candidates: Vec<String>,
    /// Scored part of the request. `None` matches everything with a neutral score.
    pub query: Option<Expr>,
    /// Unscored restriction of the result set.
    pub filter: Option<Expr>,
    pub sort: Option<Sort>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl ComplexQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> ComplexQueryBuilder {
        ComplexQueryBuilder::new()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ComplexQueryBuilder {
    query: ComplexQuery,
}

impl ComplexQueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a document-type name to the candidates.
    pub fn candidate(mut self, document_type: impl Into<String>) -> Self {
        self.query.candidates.push(document_type.into());
        self
    }

    pub fn candidates<S: Into<String>>(mut self, document_types: impl IntoIterator<Item = S>) -> Self {
        self.query
            .candidates
            .extend(document_types.into_iter().map(Into::into));
        self
    }

    /// Sets the scored part of the request.
    ///
    /// # Arguments
    ///
    /// * `query` - The expression documents are matched and scored against
    pub fn query(mut self, query: Expr) -> Self {
        self.query.query = Some(query);
        self
    }

    /// Sets the unscored restriction of the request.
    ///
    /// # Arguments
    ///
    /// * `filter` - The expression every returned document must satisfy
    pub fn filter(mut self, filter: Expr) -> Self {
        self.query.filter = Some(filter);
        self
    }

    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.query.sort = Some(Sort {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.query.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = Some(limit);
        self
    }

    /// Sets offset and limit from pagination parameters.
    pub fn paginate(self, params: &PaginationParams) -> Self {
        self.offset(params.offset()).limit(params.limit())
    }

    pub fn build(self) -> ComplexQuery {
        self.query
    }
}

/// Walks an [`Expr`] tree, producing one output per node.
pub trait QueryVisitor {
    type Output;
    type Error: Into<SearchLayerError>;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error>;
    fn visit_exists(
        &mut self,
        field: &str,
        should_exist: bool,
    ) -> Result<Self::Output, Self::Error>;
    fn visit_field(
        &mut self,
        field: &str,
        op: &FieldOp,
        value: &Value,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Or(exprs) => self.visit_or(exprs),
            Expr::Not(expr) => self.visit_not(expr),
            Expr::Exists(field, should_exist) => self.visit_exists(field, *should_exist),
            Expr::Field { field, op, value } => self.visit_field(field, op, value),
        }
    }
}
