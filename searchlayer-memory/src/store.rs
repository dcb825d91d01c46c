//! In-memory document store.
//!
//! Indexes hold their creation settings, the mappings installed per document type and the
//! documents keyed by `(document type, id)`. Bodies are kept both parsed, for evaluation, and
//! verbatim, to be returned as the stored source.

use async_trait::async_trait;
use mea::rwlock::RwLock;
use serde_json::Value;
use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
    sync::Arc,
};
use tracing::debug;
use uuid::Uuid;

use searchlayer_core::{
    client::{
        BulkItemResponse, BulkRequest, DocumentStoreClient, DocumentStoreClientBuilder, GetResponse,
        IndexSettings, SearchHit, SearchRequest, SearchResponse,
    },
    error::{SearchLayerError, SearchLayerResult},
    query::{Expr, SortDirection},
};

use crate::evaluator::{Comparable, DocumentEvaluator, resolve};

type DocumentKey = (String, String);

#[derive(Debug, Clone)]
struct StoredDocument {
    value: Value,
    source: String,
    /// Global insertion order, kept across overwrites.
    sequence: u64,
}

#[derive(Debug, Default)]
struct IndexState {
    settings: IndexSettings,
    mappings: BTreeMap<String, Value>,
    documents: HashMap<DocumentKey, StoredDocument>,
}

#[derive(Debug, Default)]
struct StoreState {
    indexes: HashMap<String, IndexState>,
    next_sequence: u64,
}

impl StoreState {
    fn index_mut(&mut self, name: &str, auto_create: bool) -> SearchLayerResult<&mut IndexState> {
        if auto_create && !self.indexes.contains_key(name) {
            debug!(index = name, "auto-creating index");
        }

        match auto_create {
            true => Ok(self.indexes.entry(name.to_string()).or_default()),
            false => self.indexes.get_mut(name).ok_or_else(|| index_not_found(name)),
        }
    }

    fn put(
        &mut self,
        index: &str,
        doc_type: &str,
        id: Option<&str>,
        body: String,
        auto_create: bool,
    ) -> SearchLayerResult<String> {
        let value: Value = serde_json::from_str(&body).map_err(|err| {
            SearchLayerError::StoreOperation(format!("Document body is not valid JSON: {err}"))
        })?;
        let id = id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let sequence = self.next_sequence;

        let state = self.index_mut(index, auto_create)?;
        let key = (doc_type.to_string(), id.clone());
        let sequence = state
            .documents
            .get(&key)
            .map(|existing| existing.sequence)
            .unwrap_or(sequence);

        state.documents.insert(
            key,
            StoredDocument {
                value,
                source: body,
                sequence,
            },
        );
        self.next_sequence += 1;

        Ok(id)
    }

    fn delete(&mut self, index: &str, doc_type: &str, id: &str) {
        if let Some(state) = self.indexes.get_mut(index) {
            state
                .documents
                .remove(&(doc_type.to_string(), id.to_string()));
        }
    }

    fn get(&self, index: &str, doc_type: &str, id: &str) -> GetResponse {
        self.indexes
            .get(index)
            .and_then(|state| {
                state
                    .documents
                    .get(&(doc_type.to_string(), id.to_string()))
            })
            .map(|document| GetResponse {
                exists: true,
                doc_type: doc_type.to_string(),
                id: id.to_string(),
                source: Some(document.source.clone()),
            })
            .unwrap_or_else(|| GetResponse::missing(doc_type, id))
    }
}

fn index_not_found(name: &str) -> SearchLayerError {
    SearchLayerError::StoreOperation(format!("Index not found: {name}"))
}

/// Thread-safe in-memory document store.
///
/// Clones share the same underlying data. Every write is visible to subsequent reads, so the
/// `refresh` flag of writes has no effect. Searches scan every document of the targeted indexes.
///
/// # Example
///
/// ```ignore
/// use searchlayer_memory::InMemoryStore;
/// use searchlayer::client::DocumentStoreClient;
///
/// let store = InMemoryStore::new();
/// store.create_index("twitter", None).await?;
/// let id = store
///     .put_document("twitter", "tweet", None, r#"{"user":"kimchy"}"#.to_string(), true)
///     .await?;
/// ```
#[derive(Clone, Debug)]
pub struct InMemoryStore {
    state: Arc<RwLock<StoreState>>,
    auto_create_indexes: bool,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Creates an empty store that creates indexes on first write.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreState::default())),
            auto_create_indexes: true,
        }
    }

    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }

    /// Returns the mapping installed for a document type, if any.
    pub async fn mapping(&self, index: &str, doc_type: &str) -> Option<Value> {
        self.state
            .read()
            .await
            .indexes
            .get(index)
            .and_then(|state| state.mappings.get(doc_type).cloned())
    }

    /// Returns the settings an index was created with.
    pub async fn settings(&self, index: &str) -> Option<IndexSettings> {
        self.state
            .read()
            .await
            .indexes
            .get(index)
            .map(|state| state.settings.clone())
    }

    /// Returns the number of documents in an index, across all document types.
    pub async fn document_count(&self, index: &str) -> usize {
        self.state
            .read()
            .await
            .indexes
            .get(index)
            .map(|state| state.documents.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStoreClient for InMemoryStore {
    async fn put_document(
        &self,
        index: &str,
        doc_type: &str,
        id: Option<&str>,
        body: String,
        _refresh: bool,
    ) -> SearchLayerResult<String> {
        self.state
            .write()
            .await
            .put(index, doc_type, id, body, self.auto_create_indexes)
    }

    async fn bulk(
        &self,
        requests: Vec<BulkRequest>,
        _refresh: bool,
    ) -> SearchLayerResult<Vec<BulkItemResponse>> {
        let mut state = self.state.write().await;
        let mut items = Vec::with_capacity(requests.len());

        for request in requests {
            let item = match request {
                BulkRequest::Index {
                    index,
                    doc_type,
                    id,
                    body,
                } => match state.put(&index, &doc_type, id.as_deref(), body, self.auto_create_indexes) {
                    Ok(id) => BulkItemResponse::success(id),
                    Err(err) => BulkItemResponse::failure(id, err.to_string()),
                },
                BulkRequest::Delete { index, doc_type, id } => {
                    state.delete(&index, &doc_type, &id);
                    BulkItemResponse::success(id)
                }
            };

            items.push(item);
        }

        Ok(items)
    }

    async fn get_document(&self, index: &str, doc_type: &str, id: &str) -> SearchLayerResult<GetResponse> {
        Ok(self.state.read().await.get(index, doc_type, id))
    }

    async fn multi_get_documents(
        &self,
        index: &str,
        doc_type: &str,
        ids: &[String],
    ) -> SearchLayerResult<Vec<GetResponse>> {
        let state = self.state.read().await;

        Ok(ids
            .iter()
            .map(|id| state.get(index, doc_type, id))
            .collect())
    }

    async fn delete_document(&self, index: &str, doc_type: &str, id: &str) -> SearchLayerResult<()> {
        self.state.write().await.delete(index, doc_type, id);
        Ok(())
    }

    async fn delete_by_query(&self, index: &str, query: &Expr) -> SearchLayerResult<()> {
        let mut state = self.state.write().await;
        let index_state = state
            .indexes
            .get_mut(index)
            .ok_or_else(|| index_not_found(index))?;

        index_state
            .documents
            .retain(|_, document| !DocumentEvaluator::new(&document.value).matches(query));

        Ok(())
    }

    async fn search(&self, request: SearchRequest) -> SearchLayerResult<SearchResponse> {
        let state = self.state.read().await;
        let mut matches = Vec::new();

        for index in &request.indexes {
            let index_state = state
                .indexes
                .get(index)
                .ok_or_else(|| index_not_found(index))?;

            for ((doc_type, id), document) in &index_state.documents {
                if !request.types.is_empty() && !request.types.contains(doc_type) {
                    continue;
                }

                if let Some(filter) = &request.filter {
                    if !DocumentEvaluator::new(&document.value).matches(filter) {
                        continue;
                    }
                }

                let score = match &request.query {
                    Some(query) => match DocumentEvaluator::new(&document.value).score(query) {
                        Some(score) => score,
                        None => continue,
                    },
                    None => 1.0,
                };

                matches.push((index.as_str(), doc_type.as_str(), id.as_str(), document, score));
            }
        }

        match &request.sort {
            Some(sort) => matches.sort_by(|a, b| {
                let left = resolve(&a.3.value, &sort.field)
                    .first()
                    .map(|value| Comparable::from(*value))
                    .unwrap_or(Comparable::Null);
                let right = resolve(&b.3.value, &sort.field)
                    .first()
                    .map(|value| Comparable::from(*value))
                    .unwrap_or(Comparable::Null);

                let ordering = match sort.direction {
                    SortDirection::Asc => left.partial_cmp(&right),
                    SortDirection::Desc => right.partial_cmp(&left),
                };

                ordering
                    .unwrap_or(Ordering::Equal)
                    .then(a.3.sequence.cmp(&b.3.sequence))
            }),
            None => matches.sort_by(|a, b| {
                b.4.partial_cmp(&a.4)
                    .unwrap_or(Ordering::Equal)
                    .then(a.3.sequence.cmp(&b.3.sequence))
            }),
        }

        let total_hits = matches.len() as u64;
        let hits = matches
            .into_iter()
            .skip(request.offset.unwrap_or(0))
            .take(request.limit.unwrap_or(usize::MAX))
            .map(|(index, doc_type, id, document, score)| SearchHit {
                index: index.to_string(),
                doc_type: doc_type.to_string(),
                id: id.to_string(),
                score,
                source: Some(document.source.clone()),
            })
            .collect();

        Ok(SearchResponse { hits, total_hits })
    }

    async fn create_index(&self, name: &str, settings: Option<IndexSettings>) -> SearchLayerResult<()> {
        let mut state = self.state.write().await;

        if state.indexes.contains_key(name) {
            return Err(SearchLayerError::StoreOperation(format!("Index already exists: {name}")));
        }

        state.indexes.insert(
            name.to_string(),
            IndexState {
                settings: settings.unwrap_or_default(),
                ..Default::default()
            },
        );

        Ok(())
    }

    async fn delete_index(&self, name: &str) -> SearchLayerResult<()> {
        self.state
            .write()
            .await
            .indexes
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| index_not_found(name))
    }

    async fn index_exists(&self, name: &str) -> SearchLayerResult<bool> {
        Ok(self.state.read().await.indexes.contains_key(name))
    }

    async fn put_mapping(&self, index: &str, doc_type: &str, mapping: String) -> SearchLayerResult<()> {
        let mapping: Value = serde_json::from_str(&mapping).map_err(|err| {
            SearchLayerError::StoreOperation(format!("Mapping is not valid JSON: {err}"))
        })?;

        self.state
            .write()
            .await
            .indexes
            .get_mut(index)
            .ok_or_else(|| index_not_found(index))?
            .mappings
            .insert(doc_type.to_string(), mapping);

        Ok(())
    }
}

/// Builder for [`InMemoryStore`].
///
/// ```ignore
/// let store = InMemoryStore::builder().auto_create_indexes(false).build().await?;
/// ```
#[derive(Debug)]
pub struct InMemoryStoreBuilder {
    auto_create_indexes: bool,
}

impl Default for InMemoryStoreBuilder {
    fn default() -> Self {
        Self {
            auto_create_indexes: true,
        }
    }
}

impl InMemoryStoreBuilder {
    /// Whether writes to a missing index create it. Enabled by default.
    pub fn auto_create_indexes(mut self, enabled: bool) -> Self {
        self.auto_create_indexes = enabled;
        self
    }
}

#[async_trait]
impl DocumentStoreClientBuilder for InMemoryStoreBuilder {
    type Client = InMemoryStore;

    async fn build(self) -> SearchLayerResult<Self::Client> {
        Ok(InMemoryStore {
            auto_create_indexes: self.auto_create_indexes,
            ..InMemoryStore::new()
        })
    }
}
