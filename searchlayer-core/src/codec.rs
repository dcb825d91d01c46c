//! Encoding of stored values to and from their document-store representation.

use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Debug;

use crate::error::SearchLayerResult;

/// Converts values to and from document bodies.
///
/// # Errors
///
/// Both directions fail with [`SearchLayerError::Serialization`](crate::error::SearchLayerError::Serialization).
pub trait Codec: Send + Sync + Debug {
    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> SearchLayerResult<String>;

    fn deserialize<T: DeserializeOwned>(&self, body: &str) -> SearchLayerResult<T>;
}

/// JSON codec backed by `serde_json`.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> SearchLayerResult<String> {
        Ok(serde_json::to_string(value)?)
    }

    fn deserialize<T: DeserializeOwned>(&self, body: &str) -> SearchLayerResult<T> {
        Ok(serde_json::from_str(body)?)
    }
}

impl<C: Codec> Codec for &C {
    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> SearchLayerResult<String> {
        (*self).serialize(value)
    }

    fn deserialize<T: DeserializeOwned>(&self, body: &str) -> SearchLayerResult<T> {
        (*self).deserialize(body)
    }
}
