//! Document-store client abstraction.
//!
//! The [`DocumentStoreClient`] trait is the boundary between the repositories and a concrete
//! search document store. Documents are addressed by the composite key
//! `(index, document type, id)` and carried as already-encoded bodies; the repository owns
//! encoding through its [`Codec`](crate::codec::Codec).
//!
//! # Examples
//!
//! ```ignore
//! use searchlayer::client::DocumentStoreClient;
//!
//! let id = client
//!     .put_document("twitter", "tweet", None, r#"{"user":"kimchy"}"#.to_string(), true)
//!     .await?;
//! let response = client.get_document("twitter", "tweet", &id).await?;
//! assert!(response.exists);
//! ```

use async_trait::async_trait;
use std::{collections::BTreeMap, fmt::Debug, sync::Arc};

use crate::{
    error::SearchLayerResult,
    query::{Expr, Sort},
};

/// Settings applied when creating an index, such as `number_of_shards`.
pub type IndexSettings = BTreeMap<String, String>;

/// One action of a bulk request.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkRequest {
    /// Upserts a document. A missing id asks the store to generate one.
    Index {
        index: String,
        doc_type: String,
        id: Option<String>,
        body: String,
    },
    Delete {
        index: String,
        doc_type: String,
        id: String,
    },
}

impl BulkRequest {
    pub fn id(&self) -> Option<&str> {
        match self {
            BulkRequest::Index { id, .. } => id.as_deref(),
            BulkRequest::Delete { id, .. } => Some(id),
        }
    }
}

/// Outcome of one bulk action, in request order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkItemResponse {
    /// The id the action applied to, generated by the store for auto-id upserts.
    pub id: Option<String>,
    /// The failure message, if the action failed.
    pub error: Option<String>,
}

impl BulkItemResponse {
    pub fn success(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            error: None,
        }
    }

    pub fn failure(id: Option<String>, error: impl Into<String>) -> Self {
        Self {
            id,
            error: Some(error.into()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Response to a single-document get.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetResponse {
    pub exists: bool,
    pub doc_type: String,
    pub id: String,
    /// The stored body; `None` or empty when the store returned no source.
    pub source: Option<String>,
}

impl GetResponse {
    pub fn missing(doc_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            exists: false,
            doc_type: doc_type.into(),
            id: id.into(),
            source: None,
        }
    }
}

/// A search over one or more indexes and document types.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchRequest {
    pub indexes: Vec<String>,
    /// Document types to search. Empty means every type in the indexes.
    pub types: Vec<String>,
    pub query: Option<Expr>,
    pub filter: Option<Expr>,
    pub sort: Option<Sort>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub index: String,
    pub doc_type: String,
    pub id: String,
    pub score: f32,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResponse {
    /// The page of hits selected by offset and limit.
    pub hits: Vec<SearchHit>,
    /// Number of matching documents before offset and limit were applied.
    pub total_hits: u64,
}

/// Abstract interface of a search document store.
///
/// Implementations must be thread-safe. Writes made with `refresh` set are visible to reads
/// and searches issued after the call returns.
///
/// # Errors
///
/// Store failures are reported as
/// [`SearchLayerError::StoreOperation`](crate::error::SearchLayerError::StoreOperation).
#[async_trait]
pub trait DocumentStoreClient: Send + Sync + Debug {
    /// Upserts a document and returns its id.
    ///
    /// # Arguments
    ///
    /// * `index` - The target index, created if missing
    /// * `doc_type` - The document-type name
    /// * `id` - The document id, or `None` to let the store generate one
    /// * `body` - The encoded document
    /// * `refresh` - Whether the write must be visible on return
    async fn put_document(
        &self,
        index: &str,
        doc_type: &str,
        id: Option<&str>,
        body: String,
        refresh: bool,
    ) -> SearchLayerResult<String>;

    /// Executes a batch of upserts and deletes.
    ///
    /// Per-action failures are reported in the returned items rather than as an error; the
    /// call itself fails only when the store cannot process the batch.
    async fn bulk(
        &self,
        requests: Vec<BulkRequest>,
        refresh: bool,
    ) -> SearchLayerResult<Vec<BulkItemResponse>>;

    async fn get_document(&self, index: &str, doc_type: &str, id: &str) -> SearchLayerResult<GetResponse>;

    /// Fetches several documents, one response per requested id in request order.
    async fn multi_get_documents(
        &self,
        index: &str,
        doc_type: &str,
        ids: &[String],
    ) -> SearchLayerResult<Vec<GetResponse>>;

    /// Deletes a document. Deleting a missing document is not an error.
    async fn delete_document(&self, index: &str, doc_type: &str, id: &str) -> SearchLayerResult<()>;

    /// Deletes every document of the index matching the expression.
    async fn delete_by_query(&self, index: &str, query: &Expr) -> SearchLayerResult<()>;

    async fn search(&self, request: SearchRequest) -> SearchLayerResult<SearchResponse>;

    /// Creates an index. Fails if the index exists.
    async fn create_index(&self, name: &str, settings: Option<IndexSettings>) -> SearchLayerResult<()>;

    /// Deletes an index and its documents. Fails if the index is missing.
    async fn delete_index(&self, name: &str) -> SearchLayerResult<()>;

    async fn index_exists(&self, name: &str) -> SearchLayerResult<bool>;

    /// Installs the mapping of a document type in an existing index.
    ///
    /// # Arguments
    ///
    /// * `mapping` - The mapping as rendered by [`MappingSerializer`](crate::serializer::MappingSerializer)
    async fn put_mapping(&self, index: &str, doc_type: &str, mapping: String) -> SearchLayerResult<()>;
}

#[async_trait]
impl<B> DocumentStoreClient for &B
where
    B: DocumentStoreClient + ?Sized,
{
    async fn put_document(
        &self,
        index: &str,
        doc_type: &str,
        id: Option<&str>,
        body: String,
        refresh: bool,
    ) -> SearchLayerResult<String> {
        (**self)
            .put_document(index, doc_type, id, body, refresh)
            .await
    }

    async fn bulk(
        &self,
        requests: Vec<BulkRequest>,
        refresh: bool,
    ) -> SearchLayerResult<Vec<BulkItemResponse>> {
        (**self).bulk(requests, refresh).await
    }

    async fn get_document(&self, index: &str, doc_type: &str, id: &str) -> SearchLayerResult<GetResponse> {
        (**self).get_document(index, doc_type, id).await
    }

    async fn multi_get_documents(
        &self,
        index: &str,
        doc_type: &str,
        ids: &[String],
    ) -> SearchLayerResult<Vec<GetResponse>> {
        (**self)
            .multi_get_documents(index, doc_type, ids)
            .await
    }

    async fn delete_document(&self, index: &str, doc_type: &str, id: &str) -> SearchLayerResult<()> {
        (**self).delete_document(index, doc_type, id).await
    }

    async fn delete_by_query(&self, index: &str, query: &Expr) -> SearchLayerResult<()> {
        (**self).delete_by_query(index, query).await
    }

    async fn search(&self, request: SearchRequest) -> SearchLayerResult<SearchResponse> {
        (**self).search(request).await
    }

    async fn create_index(&self, name: &str, settings: Option<IndexSettings>) -> SearchLayerResult<()> {
        (**self).create_index(name, settings).await
    }

    async fn delete_index(&self, name: &str) -> SearchLayerResult<()> {
        (**self).delete_index(name).await
    }

    async fn index_exists(&self, name: &str) -> SearchLayerResult<bool> {
        (**self).index_exists(name).await
    }

    async fn put_mapping(&self, index: &str, doc_type: &str, mapping: String) -> SearchLayerResult<()> {
        (**self).put_mapping(index, doc_type, mapping).await
    }
}

#[async_trait]
impl<B> DocumentStoreClient for Arc<B>
where
    B: DocumentStoreClient + ?Sized,
{
    async fn put_document(
        &self,
        index: &str,
        doc_type: &str,
        id: Option<&str>,
        body: String,
        refresh: bool,
    ) -> SearchLayerResult<String> {
        (**self)
            .put_document(index, doc_type, id, body, refresh)
            .await
    }

    async fn bulk(
        &self,
        requests: Vec<BulkRequest>,
        refresh: bool,
    ) -> SearchLayerResult<Vec<BulkItemResponse>> {
        (**self).bulk(requests, refresh).await
    }

    async fn get_document(&self, index: &str, doc_type: &str, id: &str) -> SearchLayerResult<GetResponse> {
        (**self).get_document(index, doc_type, id).await
    }

    async fn multi_get_documents(
        &self,
        index: &str,
        doc_type: &str,
        ids: &[String],
    ) -> SearchLayerResult<Vec<GetResponse>> {
        (**self)
            .multi_get_documents(index, doc_type, ids)
            .await
    }

    async fn delete_document(&self, index: &str, doc_type: &str, id: &str) -> SearchLayerResult<()> {
        (**self).delete_document(index, doc_type, id).await
    }

    async fn delete_by_query(&self, index: &str, query: &Expr) -> SearchLayerResult<()> {
        (**self).delete_by_query(index, query).await
    }

    async fn search(&self, request: SearchRequest) -> SearchLayerResult<SearchResponse> {
        (**self).search(request).await
    }

    async fn create_index(&self, name: &str, settings: Option<IndexSettings>) -> SearchLayerResult<()> {
        (**self).create_index(name, settings).await
    }

    async fn delete_index(&self, name: &str) -> SearchLayerResult<()> {
        (**self).delete_index(name).await
    }

    async fn index_exists(&self, name: &str) -> SearchLayerResult<bool> {
        (**self).index_exists(name).await
    }

    async fn put_mapping(&self, index: &str, doc_type: &str, mapping: String) -> SearchLayerResult<()> {
        (**self).put_mapping(index, doc_type, mapping).await
    }
}

/// Factory for store clients.
#[async_trait]
pub trait DocumentStoreClientBuilder {
    type Client: DocumentStoreClient;

    async fn build(self) -> SearchLayerResult<Self::Client>;
}
