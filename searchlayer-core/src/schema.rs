//! Declarative schema tables describing how a type is stored and mapped.
//!
//! A [`TypeSchema`] lists the properties of a stored type together with their optional
//! [`FieldMapping`] configuration, and carries the type-level configuration used to bind a
//! repository: the document-type name, the index configuration and the id configuration.
//! Schemas are normally produced by `#[derive(Searchable)]`, but can be written by hand with
//! [`TypeSchema::builder`].
//!
//! # Example
//!
//! ```ignore
//! use searchlayer::schema::{FieldMapping, FieldType, PropertyDescriptor, TypeSchema};
//!
//! let schema = TypeSchema::builder("Tweet")
//!     .document_type("tweet")
//!     .index("twitter")
//!     .property(
//!         PropertyDescriptor::new("message")
//!             .mapped(FieldMapping::new(FieldType::String).free_text_searchable(true).filterable(false)),
//!     )
//!     .build();
//!
//! assert_eq!(schema.document_type_name(), "tweet");
//! ```

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::{
    error::{SearchLayerError, SearchLayerResult},
    index::ANNOTATED_STRATEGY,
};

/// Field type tags understood by the document store mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Integer,
    Float,
    Long,
    Double,
    Boolean,
    Null,
    Date,
    /// A logical field materialized as an exact-match field plus an analyzed `queryable` field.
    MultiField,
}

impl FieldType {
    /// Returns the name the document store uses for this type in a mapping.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Long => "long",
            FieldType::Double => "double",
            FieldType::Boolean => "boolean",
            FieldType::Null => "null",
            FieldType::Date => "date",
            FieldType::MultiField => "multi_field",
        }
    }

    /// Looks up a field type by its mapping name.
    ///
    /// # Errors
    ///
    /// Returns [`SearchLayerError::Mapping`] if no field type uses the given name.
    pub fn from_mapping_name(name: &str) -> SearchLayerResult<Self> {
        [
            FieldType::String,
            FieldType::Integer,
            FieldType::Float,
            FieldType::Long,
            FieldType::Double,
            FieldType::Boolean,
            FieldType::Null,
            FieldType::Date,
            FieldType::MultiField,
        ]
        .into_iter()
        .find(|field_type| field_type.as_str() == name)
        .ok_or_else(|| SearchLayerError::Mapping(format!("Unknown field type: {name}")))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = SearchLayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldType::from_mapping_name(s)
    }
}

/// How the document store treats the value of a field when indexing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexMode {
    /// Tokenized for free-text search.
    Analyzed,
    /// Indexed verbatim for exact-match filtering.
    NotAnalyzed,
}

impl IndexMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexMode::Analyzed => "analyzed",
            IndexMode::NotAnalyzed => "not_analyzed",
        }
    }
}

impl fmt::Display for IndexMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Explicit mapping configuration attached to a property.
///
/// A property is `filterable` unless stated otherwise, and not free-text searchable unless
/// stated otherwise. Setting both produces a multi-field mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub field_type: FieldType,
    pub filterable: bool,
    pub free_text_searchable: bool,
}

impl FieldMapping {
    pub const fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            filterable: true,
            free_text_searchable: false,
        }
    }

    pub const fn filterable(mut self, filterable: bool) -> Self {
        self.filterable = filterable;
        self
    }

    pub const fn free_text_searchable(mut self, free_text_searchable: bool) -> Self {
        self.free_text_searchable = free_text_searchable;
        self
    }
}

/// Produces the schema of a nested type.
pub type SchemaFn = fn() -> TypeSchema;

/// A type argument of a generic property type.
#[derive(Debug, Clone, Copy)]
pub enum TypeArgument {
    /// A type without a schema of its own, such as `String` in `HashMap<String, Comment>`.
    Opaque,
    /// A type whose configured properties can be discovered.
    Schema(SchemaFn),
}

/// The declared value type of a property.
#[derive(Debug, Clone, Default)]
pub enum ValueType {
    /// A non-generic type.
    #[default]
    Scalar,
    /// A parameterized type such as `Vec<Comment>` or `Option<Author>`.
    Generic(Vec<TypeArgument>),
}

impl ValueType {
    pub fn is_generic(&self) -> bool {
        matches!(self, ValueType::Generic(_))
    }

    /// Returns the type arguments of a generic type, or an empty slice for scalars.
    pub fn type_arguments(&self) -> &[TypeArgument] {
        match self {
            ValueType::Generic(arguments) => arguments,
            ValueType::Scalar => &[],
        }
    }
}

/// A property of a stored type.
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    pub name: String,
    pub readable: bool,
    pub writable: bool,
    pub mapping: Option<FieldMapping>,
    pub value_type: ValueType,
}

impl PropertyDescriptor {
    /// Creates a readable and writable scalar property without mapping configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            readable: true,
            writable: true,
            mapping: None,
            value_type: ValueType::Scalar,
        }
    }

    pub fn mapped(mut self, mapping: FieldMapping) -> Self {
        self.mapping = Some(mapping);
        self
    }

    pub fn generic(mut self, arguments: impl IntoIterator<Item = TypeArgument>) -> Self {
        self.value_type = ValueType::Generic(arguments.into_iter().collect());
        self
    }

    pub fn read_only(mut self) -> Self {
        self.readable = true;
        self.writable = false;
        self
    }

    pub fn write_only(mut self) -> Self {
        self.readable = false;
        self.writable = true;
        self
    }
}

/// Index configuration of a stored type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    /// The declared index name, read by the annotated strategy.
    pub name: String,
    /// Identifier of the index-name strategy to use.
    pub strategy: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            strategy: ANNOTATED_STRATEGY.to_string(),
        }
    }
}

/// Id configuration of a stored type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdConfig {
    pub property: String,
    /// When set, ids are left to the document store.
    pub auto_generate: bool,
}

/// Declarative description of a stored type.
#[derive(Debug, Clone)]
pub struct TypeSchema {
    type_name: String,
    document_type: Option<String>,
    index: Option<IndexConfig>,
    id: Option<IdConfig>,
    properties: Vec<PropertyDescriptor>,
}

impl TypeSchema {
    /// Creates a builder for the type with the given simple name.
    pub fn builder(type_name: impl Into<String>) -> TypeSchemaBuilder {
        TypeSchemaBuilder::new(type_name)
    }

    /// Returns the simple name of the type.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns the document-type name, falling back to the simple type name.
    pub fn document_type_name(&self) -> &str {
        self.document_type
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.type_name)
    }

    pub fn index(&self) -> Option<&IndexConfig> {
        self.index.as_ref()
    }

    pub fn id(&self) -> Option<&IdConfig> {
        self.id.as_ref()
    }

    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }
}

/// Builder for [`TypeSchema`].
#[derive(Debug, Clone)]
pub struct TypeSchemaBuilder {
    schema: TypeSchema,
}

impl TypeSchemaBuilder {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            schema: TypeSchema {
                type_name: type_name.into(),
                document_type: None,
                index: None,
                id: None,
                properties: Vec::new(),
            },
        }
    }

    /// Sets the document-type name. An empty name keeps the simple-name fallback.
    pub fn document_type(mut self, name: impl Into<String>) -> Self {
        self.schema.document_type = Some(name.into());
        self
    }

    /// Sets the declared index name.
    pub fn index(mut self, name: impl Into<String>) -> Self {
        self.schema.index.get_or_insert_with(IndexConfig::default).name = name.into();
        self
    }

    /// Sets the index-name strategy identifier.
    pub fn index_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.schema.index.get_or_insert_with(IndexConfig::default).strategy = strategy.into();
        self
    }

    pub fn id(mut self, property: impl Into<String>, auto_generate: bool) -> Self {
        self.schema.id = Some(IdConfig {
            property: property.into(),
            auto_generate,
        });
        self
    }

    pub fn property(mut self, property: PropertyDescriptor) -> Self {
        self.schema.properties.push(property);
        self
    }

    pub fn properties(mut self, properties: impl IntoIterator<Item = PropertyDescriptor>) -> Self {
        self.schema.properties.extend(properties);
        self
    }

    pub fn build(self) -> TypeSchema {
        self.schema
    }
}
