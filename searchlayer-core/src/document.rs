//! Traits implemented by stored types, and type-erased access to them.
//!
//! A stored type implements [`Searchable`], usually through `#[derive(Searchable)]`, which ties
//! it to its declarative [`TypeSchema`]. Searches spanning several types return
//! [`AnySearchable`] trait objects, resolved from the document-type tag of each hit through a
//! [`TypeRegistry`].

use serde::{Serialize, de::DeserializeOwned};
use std::{any::Any, collections::HashMap, fmt};
use tracing::warn;

use crate::{
    codec::{Codec, JsonCodec},
    error::{SearchLayerError, SearchLayerResult},
    schema::TypeSchema,
};

/// Core trait of every type stored through a repository.
///
/// # Example
///
/// ```ignore
/// use searchlayer::prelude::*;
///
/// #[derive(Debug, Clone, Serialize, Deserialize, Searchable)]
/// #[search(index = "twitter", document_type = "tweet")]
/// pub struct Tweet {
///     #[search(id)]
///     pub id: String,
///     #[search(kind = "string", filterable = false, free_text_searchable = true)]
///     pub message: String,
/// }
/// ```
pub trait Searchable: Serialize + DeserializeOwned + Send + Sync + Clone + 'static {
    /// Returns the declarative schema of the type.
    fn schema() -> TypeSchema;

    /// Returns the id of this value, or `None` when it has none.
    ///
    /// Writes of auto-generated types ignore it and let the store assign one. Deletes still
    /// read it, so a value without an id cannot be deleted.
    fn id(&self) -> Option<String> {
        None
    }

    /// Returns the document-type name, falling back to the simple type name.
    fn document_type() -> String {
        Self::schema().document_type_name().to_string()
    }
}

/// Type-erased stored value.
pub trait AnySearchable: Send + Sync {
    fn document_id(&self) -> Option<String>;

    fn document_type_name(&self) -> String;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn clone_box(&self) -> Box<dyn AnySearchable>;
}

impl dyn AnySearchable {
    /// Attempts to downcast to a concrete stored type.
    ///
    /// ```ignore
    /// if let Some(tweet) = result.document.downcast_ref::<Tweet>() {
    ///     println!("{}", tweet.message);
    /// }
    /// ```
    pub fn downcast_ref<T: Searchable>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Searchable>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    pub fn is<T: Searchable>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

impl<T: Searchable> AnySearchable for T {
    fn document_id(&self) -> Option<String> {
        self.id()
    }

    fn document_type_name(&self) -> String {
        T::document_type()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn AnySearchable> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn AnySearchable> {
    fn clone(&self) -> Box<dyn AnySearchable> {
        self.clone_box()
    }
}

impl fmt::Debug for dyn AnySearchable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnySearchable")
            .field("document_type", &self.document_type_name())
            .field("id", &self.document_id())
            .finish()
    }
}

/// Decodes a stored body into a type-erased value.
pub type DecodeFn<C> = fn(&C, &str) -> SearchLayerResult<Box<dyn AnySearchable>>;

fn decode_as<T: Searchable, C: Codec>(codec: &C, body: &str) -> SearchLayerResult<Box<dyn AnySearchable>> {
    let value: T = codec.deserialize(body)?;
    Ok(Box::new(value))
}

/// A type known to a [`TypeRegistry`].
#[derive(Debug)]
pub struct RegisteredType<C> {
    schema: TypeSchema,
    decode: DecodeFn<C>,
}

impl<C: Codec> RegisteredType<C> {
    pub fn schema(&self) -> &TypeSchema {
        &self.schema
    }

    pub fn document_type_name(&self) -> &str {
        self.schema.document_type_name()
    }

    /// Decodes a stored body as this type.
    ///
    /// # Errors
    ///
    /// Returns [`SearchLayerError::Serialization`] if the body does not decode.
    pub fn decode(&self, codec: &C, body: &str) -> SearchLayerResult<Box<dyn AnySearchable>> {
        (self.decode)(codec, body)
    }
}

/// Explicit registry of stored types keyed by document-type name.
///
/// Populated at startup and shared read-only afterwards.
#[derive(Debug)]
pub struct TypeRegistry<C = JsonCodec> {
    types: HashMap<String, RegisteredType<C>>,
}

impl<C> Default for TypeRegistry<C> {
    fn default() -> Self {
        Self {
            types: HashMap::new(),
        }
    }
}

impl<C: Codec> TypeRegistry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a stored type under its document-type name.
    pub fn register<T: Searchable>(mut self) -> Self {
        let schema = T::schema();
        let name = schema.document_type_name().to_string();

        let previous = self.types.insert(
            name.clone(),
            RegisteredType {
                schema,
                decode: decode_as::<T, C>,
            },
        );

        if previous.is_some() {
            warn!(document_type = name.as_str(), "replaced registered type");
        }

        self
    }

    /// Looks up a type by document-type name.
    ///
    /// # Errors
    ///
    /// Returns [`SearchLayerError::Resolution`] if no type is registered under the name.
    pub fn resolve(&self, document_type: &str) -> SearchLayerResult<&RegisteredType<C>> {
        self.types.get(document_type).ok_or_else(|| {
            SearchLayerError::Resolution(format!("No type registered for document type {document_type}"))
        })
    }

    pub fn contains(&self, document_type: &str) -> bool {
        self.types.contains_key(document_type)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
