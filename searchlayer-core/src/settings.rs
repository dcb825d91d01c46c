//! Repository configuration.

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

use crate::error::{SearchLayerError, SearchLayerResult};

/// Number of documents sent per bulk request unless configured otherwise.
pub const DEFAULT_BULK_SIZE: usize = 50;

/// Settings applied when binding a repository.
///
/// Missing fields take their defaults, so settings can be loaded from partial configuration:
///
/// ```ignore
/// let settings: RepositorySettings = serde_json::from_str(r#"{"bulk_size": 200}"#)?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositorySettings {
    /// Maximum number of documents per bulk request. Must be positive.
    pub bulk_size: usize,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            bulk_size: DEFAULT_BULK_SIZE,
        }
    }
}

impl RepositorySettings {
    pub fn new(bulk_size: usize) -> Self {
        Self { bulk_size }
    }

    /// Parses settings from JSON.
    pub fn from_json(json: &str) -> SearchLayerResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Returns the bulk size.
    ///
    /// # Errors
    ///
    /// Returns [`SearchLayerError::Validation`] if the bulk size is zero.
    pub fn bulk_size(&self) -> SearchLayerResult<NonZeroUsize> {
        NonZeroUsize::new(self.bulk_size)
            .ok_or_else(|| SearchLayerError::Validation("Bulk size must be positive".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        assert_eq!(RepositorySettings::from_json("{}").unwrap().bulk_size, DEFAULT_BULK_SIZE);
        assert_eq!(RepositorySettings::from_json(r#"{"bulk_size":3}"#).unwrap().bulk_size, 3);
    }

    #[test]
    fn zero_bulk_size_is_rejected() {
        assert!(matches!(
            RepositorySettings::new(0).bulk_size(),
            Err(SearchLayerError::Validation(_))
        ));
    }
}
