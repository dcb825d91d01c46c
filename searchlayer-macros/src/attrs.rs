use syn::{
    Attribute, Error, Field, LitBool, LitStr, Result, Type, meta::ParseNestedMeta, parenthesized,
    parse::Parse, punctuated::Punctuated, token::Comma,
};

const SEARCH: &str = "search";
const SERDE: &str = "serde";

const FIELD_TYPES: &[(&str, &str)] = &[
    ("string", "String"),
    ("integer", "Integer"),
    ("float", "Float"),
    ("long", "Long"),
    ("double", "Double"),
    ("boolean", "Boolean"),
    ("null", "Null"),
    ("date", "Date"),
    ("multi_field", "MultiField"),
];

///
/// ContainerAttrs
///

#[derive(Default)]
pub struct ContainerAttrs {
    pub index: Option<LitStr>,
    pub strategy: Option<LitStr>,
    pub document_type: Option<LitStr>,
    pub rename_all: Option<RenameRule>,
}

impl ContainerAttrs {
    pub fn parse(attrs: &[Attribute]) -> Result<Self> {
        let mut parsed = Self::default();

        for attr in attrs {
            if attr.path().is_ident(SEARCH) {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("index") {
                        parsed.index = Some(meta.value()?.parse()?);
                    } else if meta.path.is_ident("strategy") {
                        parsed.strategy = Some(meta.value()?.parse()?);
                    } else if meta.path.is_ident("document_type") {
                        parsed.document_type = Some(meta.value()?.parse()?);
                    } else {
                        return Err(meta.error("unsupported search attribute"));
                    }

                    Ok(())
                })?;
            } else if attr.path().is_ident(SERDE) {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("rename_all") {
                        if let Some(rule) = serialize_name(&meta)? {
                            parsed.rename_all = Some(RenameRule::parse(&rule)?);
                        }
                    } else {
                        skip_serde_meta(&meta)?;
                    }

                    Ok(())
                })?;
            }
        }

        Ok(parsed)
    }
}

///
/// RenameRule
///
/// Field renaming as understood by `#[serde(rename_all = "...")]`.
///

#[derive(Clone, Copy)]
pub enum RenameRule {
    Lower,
    Upper,
    Pascal,
    Camel,
    Snake,
    ScreamingSnake,
    Kebab,
    ScreamingKebab,
}

impl RenameRule {
    fn parse(rule: &LitStr) -> Result<Self> {
        Ok(match rule.value().as_str() {
            "lowercase" => RenameRule::Lower,
            "UPPERCASE" => RenameRule::Upper,
            "PascalCase" => RenameRule::Pascal,
            "camelCase" => RenameRule::Camel,
            "snake_case" => RenameRule::Snake,
            "SCREAMING_SNAKE_CASE" => RenameRule::ScreamingSnake,
            "kebab-case" => RenameRule::Kebab,
            "SCREAMING-KEBAB-CASE" => RenameRule::ScreamingKebab,
            other => {
                return Err(Error::new_spanned(
                    rule,
                    format!("unknown rename rule `{other}`"),
                ));
            }
        })
    }

    /// Renames a snake_case field name the way serde does.
    pub fn apply(self, field: &str) -> String {
        match self {
            RenameRule::Lower | RenameRule::Snake => field.to_string(),
            RenameRule::Upper | RenameRule::ScreamingSnake => field.to_ascii_uppercase(),
            RenameRule::Pascal => pascal(field),
            RenameRule::Camel => {
                let name = pascal(field);
                let mut chars = name.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
                    None => String::new(),
                }
            }
            RenameRule::Kebab => field.replace('_', "-"),
            RenameRule::ScreamingKebab => field.to_ascii_uppercase().replace('_', "-"),
        }
    }
}

// upper-cases the first letter and every letter after `_`, dropping the underscores
fn pascal(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut capitalize = true;

    for ch in field.chars() {
        if ch == '_' {
            capitalize = true;
        } else if capitalize {
            out.push(ch.to_ascii_uppercase());
            capitalize = false;
        } else {
            out.push(ch);
        }
    }

    out
}

///
/// Nested
///

pub enum Nested {
    /// Every type argument of the field type is a stored type.
    All,
    /// Only the listed type arguments are stored types.
    Only(Vec<Type>),
}

///
/// FieldAttrs
///

#[derive(Default)]
pub struct FieldAttrs {
    pub kind: Option<LitStr>,
    pub filterable: Option<LitBool>,
    pub free_text_searchable: Option<LitBool>,
    pub id: bool,
    pub auto_generate: bool,
    pub nested: Option<Nested>,
    pub skip: bool,
    pub write_only: bool,
    pub rename: Option<String>,
}

impl FieldAttrs {
    pub fn parse(field: &Field) -> Result<Self> {
        let mut parsed = Self::default();

        for attr in &field.attrs {
            if attr.path().is_ident(SEARCH) {
                attr.parse_nested_meta(|meta| parsed.parse_search_meta(&meta))?;
            } else if attr.path().is_ident(SERDE) {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("rename") {
                        if let Some(name) = serialize_name(&meta)? {
                            parsed.rename = Some(name.value());
                        }
                    } else if meta.path.is_ident("skip") {
                        parsed.skip = true;
                    } else {
                        skip_serde_meta(&meta)?;
                    }

                    Ok(())
                })?;
            }
        }

        parsed.validate(field)?;

        Ok(parsed)
    }

    fn parse_search_meta(&mut self, meta: &ParseNestedMeta<'_>) -> Result<()> {
        if meta.path.is_ident("kind") {
            let kind: LitStr = meta.value()?.parse()?;
            if !FIELD_TYPES.iter().any(|(name, _)| *name == kind.value()) {
                return Err(Error::new_spanned(
                    &kind,
                    format!("unknown field type `{}`", kind.value()),
                ));
            }
            self.kind = Some(kind);
        } else if meta.path.is_ident("filterable") {
            self.filterable = Some(meta.value()?.parse()?);
        } else if meta.path.is_ident("free_text_searchable") {
            self.free_text_searchable = Some(meta.value()?.parse()?);
        } else if meta.path.is_ident("id") {
            self.id = true;
        } else if meta.path.is_ident("auto_generate") {
            self.auto_generate = true;
        } else if meta.path.is_ident("nested") {
            if meta.input.peek(syn::token::Paren) {
                let content;
                parenthesized!(content in meta.input);
                let types: Punctuated<Type, Comma> = content.parse_terminated(Type::parse, Comma)?;
                self.nested = Some(Nested::Only(types.into_iter().collect()));
            } else {
                self.nested = Some(Nested::All);
            }
        } else if meta.path.is_ident("skip") {
            self.skip = true;
        } else if meta.path.is_ident("write_only") {
            self.write_only = true;
        } else {
            return Err(meta.error("unsupported search attribute"));
        }

        Ok(())
    }

    fn validate(&self, field: &Field) -> Result<()> {
        let configured = self.filterable.is_some() || self.free_text_searchable.is_some();

        if configured && self.kind.is_none() {
            return Err(Error::new_spanned(
                field,
                "`filterable` and `free_text_searchable` require a `kind`",
            ));
        }

        if self.auto_generate && !self.id {
            return Err(Error::new_spanned(field, "`auto_generate` requires `id`"));
        }

        if self.skip && self.id {
            return Err(Error::new_spanned(field, "the id property cannot be skipped"));
        }

        Ok(())
    }

    /// Returns the `FieldType` variant named by `kind`.
    pub fn field_type_variant(&self) -> Option<&'static str> {
        let kind = self.kind.as_ref()?.value();

        FIELD_TYPES
            .iter()
            .find(|(name, _)| *name == kind)
            .map(|(_, variant)| *variant)
    }
}

// serialize_name
// reads `rename = ".."` or the serialize half of `rename(serialize = "..", deserialize = "..")`
fn serialize_name(meta: &ParseNestedMeta<'_>) -> Result<Option<LitStr>> {
    if !meta.input.peek(syn::token::Paren) {
        return Ok(Some(meta.value()?.parse()?));
    }

    let mut name = None;
    meta.parse_nested_meta(|inner| {
        let value: LitStr = inner.value()?.parse()?;
        if inner.path.is_ident("serialize") {
            name = Some(value);
        } else if !inner.path.is_ident("deserialize") {
            return Err(inner.error("expected `serialize` or `deserialize`"));
        }

        Ok(())
    })?;

    Ok(name)
}

// skip_serde_meta
// consumes serde options this derive does not interpret
fn skip_serde_meta(meta: &ParseNestedMeta<'_>) -> Result<()> {
    if meta.input.peek(syn::Token![=]) {
        meta.value()?.parse::<syn::Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        let content;
        parenthesized!(content in meta.input);
        content.parse::<proc_macro2::TokenStream>()?;
    }

    Ok(())
}
