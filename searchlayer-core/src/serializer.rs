//! Rendering of [`Mapping`] trees into the document-store mapping format.
//!
//! ```text
//! { "<document type>": { "properties": { "<name>": { "index": "...", "type": "...", "fields": { ... } } } } }
//! ```
//!
//! Each node writes `index` then `type` when they are set. Sub-fields go under `fields` for a
//! multi-field node and under `properties` for any other node. A mapping without properties
//! renders as `{ "<document type>": {} }`. Key order follows the tree, so output is stable.

use serde::{
    Serialize, Serializer,
    ser::SerializeMap,
};
use serde_json::Value;

use crate::{
    error::SearchLayerResult,
    mapping::{Mapping, MappingProperty},
};

impl Serialize for Mapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.name, &TypeBody(&self.properties))?;
        map.end()
    }
}

impl Serialize for MappingProperty {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;

        if let Some(index) = &self.index {
            map.serialize_entry("index", index.as_str())?;
        }
        if let Some(field_type) = &self.field_type {
            map.serialize_entry("type", field_type.as_str())?;
        }
        if !self.fields.is_empty() {
            let key = if self.is_multi_field() { "fields" } else { "properties" };
            map.serialize_entry(key, &Properties(&self.fields))?;
        }

        map.end()
    }
}

struct TypeBody<'a>(&'a [MappingProperty]);

impl Serialize for TypeBody<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.is_empty() {
            return serializer.serialize_map(Some(0))?.end();
        }

        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("properties", &Properties(self.0))?;
        map.end()
    }
}

struct Properties<'a>(&'a [MappingProperty]);

impl Serialize for Properties<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for property in self.0 {
            map.serialize_entry(&property.name, property)?;
        }
        map.end()
    }
}

/// Renders mappings as JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct MappingSerializer;

impl MappingSerializer {
    /// Renders the mapping as a compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`SearchLayerError::Serialization`](crate::error::SearchLayerError::Serialization)
    /// if the JSON writer fails.
    pub fn to_json_string(&self, mapping: &Mapping) -> SearchLayerResult<String> {
        Ok(serde_json::to_string(mapping)?)
    }

    /// Renders the mapping as a JSON value with key order preserved.
    pub fn to_value(&self, mapping: &Mapping) -> SearchLayerResult<Value> {
        Ok(serde_json::to_value(mapping)?)
    }
}
