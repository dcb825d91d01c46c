//! Error types and result types for mapping and repository operations.
//!
//! Collaborators (codec, store client, index-name strategies, mapping builder) report failures as
//! [`SearchLayerError`]. The repositories wrap every failure that crosses their boundary into a
//! [`RepositoryError`], which keeps the original cause and adds the operation name and the
//! offending id or type name.

use serde_json::Error as SerdeJsonError;
use std::fmt;
use thiserror::Error;

/// Represents all possible errors raised by the collaborators of a repository.
#[derive(Error, Debug)]
pub enum SearchLayerError {
    /// Missing or invalid index configuration, or an unknown index-name strategy.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// Encoding a value to, or decoding a value from, its stored representation failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// A document-type tag could not be resolved to a registered or permitted type.
    #[error("Resolution error: {0}")]
    Resolution(String),
    /// The document store reported a failure.
    #[error("Store operation error: {0}")]
    StoreOperation(String),
    /// A required input was empty or out of range.
    #[error("Validation error: {0}")]
    Validation(String),
    /// A field mapping could not be derived or rendered.
    #[error("Mapping error: {0}")]
    Mapping(String),
}

impl SearchLayerError {
    /// Prefixes the message with `context`, keeping the variant.
    pub fn with_context(self, context: impl fmt::Display) -> Self {
        match self {
            SearchLayerError::Configuration(msg) => SearchLayerError::Configuration(format!("{context}: {msg}")),
            SearchLayerError::Serialization(msg) => SearchLayerError::Serialization(format!("{context}: {msg}")),
            SearchLayerError::Resolution(msg) => SearchLayerError::Resolution(format!("{context}: {msg}")),
            SearchLayerError::StoreOperation(msg) => SearchLayerError::StoreOperation(format!("{context}: {msg}")),
            SearchLayerError::Validation(msg) => SearchLayerError::Validation(format!("{context}: {msg}")),
            SearchLayerError::Mapping(msg) => SearchLayerError::Mapping(format!("{context}: {msg}")),
        }
    }
}

/// A specialized `Result` type for collaborator operations.
pub type SearchLayerResult<T> = Result<T, SearchLayerError>;

impl From<SerdeJsonError> for SearchLayerError {
    fn from(err: SerdeJsonError) -> Self {
        SearchLayerError::Serialization(err.to_string())
    }
}

/// The repository operation during which an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Bind,
    IndexObject,
    IndexObjects,
    GetObject,
    GetObjects,
    DeleteObject,
    DeleteObjects,
    DeleteByQuery,
    CreateIndex,
    DeleteIndex,
    IndexExists,
    CreateMapping,
    ExecuteSearch,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Bind => "bind",
            Operation::IndexObject => "index_object",
            Operation::IndexObjects => "index_objects",
            Operation::GetObject => "get_object",
            Operation::GetObjects => "get_objects",
            Operation::DeleteObject => "delete_object",
            Operation::DeleteObjects => "delete_objects",
            Operation::DeleteByQuery => "delete_by_query",
            Operation::CreateIndex => "create_index",
            Operation::DeleteIndex => "delete_index",
            Operation::IndexExists => "index_exists",
            Operation::CreateMapping => "create_mapping",
            Operation::ExecuteSearch => "execute_search",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error surfaced by a repository, carrying the operation, diagnostic context and cause.
#[derive(Error, Debug)]
#[error("{operation} failed ({context}): {source}")]
pub struct RepositoryError {
    pub operation: Operation,
    pub context: String,
    #[source]
    pub source: SearchLayerError,
}

impl RepositoryError {
    pub fn new(operation: Operation, context: impl Into<String>, source: SearchLayerError) -> Self {
        Self {
            operation,
            context: context.into(),
            source,
        }
    }

    /// Returns the underlying collaborator error.
    pub fn cause(&self) -> &SearchLayerError {
        &self.source
    }
}

/// A specialized `Result` type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Attaches repository context to collaborator results.
pub trait ResultExt<T> {
    fn context(self, operation: Operation, context: impl FnOnce() -> String) -> RepositoryResult<T>;
}

impl<T> ResultExt<T> for SearchLayerResult<T> {
    fn context(self, operation: Operation, context: impl FnOnce() -> String) -> RepositoryResult<T> {
        self.map_err(|err| RepositoryError::new(operation, context(), err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_error_keeps_operation_context_and_cause() {
        let result: SearchLayerResult<()> =
            Err(SearchLayerError::Serialization("bad payload".into()));

        let err = result
            .context(Operation::IndexObjects, || "id 42 of type Tweet".to_string())
            .unwrap_err();

        assert_eq!(err.operation, Operation::IndexObjects);
        assert!(matches!(err.cause(), SearchLayerError::Serialization(_)));
        assert_eq!(
            err.to_string(),
            "index_objects failed (id 42 of type Tweet): Serialization error: bad payload"
        );
    }

    #[test]
    fn with_context_keeps_variant() {
        let err = SearchLayerError::Resolution("type not permitted".into()).with_context("hit 3");

        assert!(matches!(&err, SearchLayerError::Resolution(msg) if msg == "hit 3: type not permitted"));
    }

    #[test]
    fn serde_json_errors_map_to_serialization() {
        let err: SearchLayerError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, SearchLayerError::Serialization(_)));
    }
}
