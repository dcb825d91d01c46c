//! Typed repository over a document store.
//!
//! A [`Repository`] binds one stored type to its index, its document-type name and a bulk chunk
//! size, all resolved once when the repository is built. It then offers CRUD, bulk, search and
//! schema-provisioning operations against the store client it was given.
//!
//! # Example
//!
//! ```ignore
//! use searchlayer::prelude::*;
//!
//! let tweets = Repository::<Tweet, _>::builder(&store).bulk_size(100).build()?;
//!
//! tweets.create_index().await?;
//! tweets.create_mapping().await?;
//! tweets.index_objects(&batch).await?;
//!
//! let results = tweets
//!     .execute_search(&ComplexQuery::builder().query(Filter::matches("message", "dog")).build())
//!     .await?;
//! ```

use std::{fmt, marker::PhantomData, num::NonZeroUsize, sync::Arc};
use tracing::{debug, error, warn};

use crate::{
    client::{BulkRequest, DocumentStoreClient, IndexSettings, SearchRequest},
    codec::{Codec, JsonCodec},
    document::Searchable,
    error::{Operation, RepositoryError, RepositoryResult, ResultExt, SearchLayerError},
    index::StrategyRegistry,
    mapping::{Mapping, MappingBuilder},
    query::{ComplexQuery, Expr},
    result::{ResultMarshaller, SearchResults, TypedDecoder},
    serializer::MappingSerializer,
    settings::RepositorySettings,
};

/// Repository of one stored type.
///
/// # Type Parameters
///
/// * `T` - The stored type
/// * `B` - The store client, typically `&Client`, `Arc<Client>` or `Arc<dyn DocumentStoreClient>`
/// * `C` - The codec used for document bodies
pub struct Repository<T, B, C = JsonCodec> {
    client: B,
    codec: C,
    index: String,
    document_type: String,
    auto_generate_ids: bool,
    bulk_size: NonZeroUsize,
    _marker: PhantomData<fn() -> T>,
}

impl<T, B: fmt::Debug, C: fmt::Debug> fmt::Debug for Repository<T, B, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("client", &self.client)
            .field("codec", &self.codec)
            .field("index", &self.index)
            .field("document_type", &self.document_type)
            .field("auto_generate_ids", &self.auto_generate_ids)
            .field("bulk_size", &self.bulk_size)
            .finish()
    }
}

impl<T: Searchable, B: DocumentStoreClient> Repository<T, B> {
    /// Creates a builder binding `T` to the given client.
    pub fn builder(client: B) -> RepositoryBuilder<T, B> {
        RepositoryBuilder::new(client)
    }

    /// Binds `T` with the built-in strategies and default settings.
    ///
    /// # Errors
    ///
    /// See [`RepositoryBuilder::build`].
    pub fn new(client: B) -> RepositoryResult<Self> {
        Self::builder(client).build()
    }
}

impl<T: Searchable, B: DocumentStoreClient, C: Codec> Repository<T, B, C> {
    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn document_type(&self) -> &str {
        &self.document_type
    }

    pub fn bulk_size(&self) -> usize {
        self.bulk_size.get()
    }

    pub fn client(&self) -> &B {
        &self.client
    }

    /// Upserts a single object, visible to searches once this returns.
    ///
    /// Returns the id of the stored document, generated by the store when the type uses
    /// auto-generated ids.
    ///
    /// # Errors
    ///
    /// Fails if the object does not encode or the store rejects the write.
    pub async fn index_object(&self, object: &T) -> RepositoryResult<String> {
        let id = self.id_for_write(object);
        let body = self
            .codec
            .serialize(object)
            .map_err(|err| self.serialization_failure(Operation::IndexObject, id.as_deref(), err))?;

        debug!(
            index = self.index.as_str(),
            document_type = self.document_type.as_str(),
            id = id.as_deref(),
            "indexing object"
        );

        self.client
            .put_document(&self.index, &self.document_type, id.as_deref(), body, true)
            .await
            .context(Operation::IndexObject, || self.describe(id.as_deref()))
    }

    /// Upserts objects in chunks of at most the bulk size, one bulk request per chunk.
    ///
    /// Chunks are sent in order and each is visible to searches once it is acknowledged. A
    /// failure aborts the remaining chunks; chunks already sent are not rolled back.
    ///
    /// # Errors
    ///
    /// - Serialization error naming the id of the first object that does not encode
    /// - Store-operation error if the bulk request or any of its items fails
    pub async fn index_objects(&self, objects: &[T]) -> RepositoryResult<()> {
        if objects.is_empty() {
            return Ok(());
        }

        for chunk in objects.chunks(self.bulk_size.get()) {
            let mut requests = Vec::with_capacity(chunk.len());

            for object in chunk {
                let id = self.id_for_write(object);
                let body = match self.codec.serialize(object) {
                    Ok(body) => body,
                    Err(err) => {
                        error!(
                            document_type = self.document_type.as_str(),
                            id = id.as_deref(),
                            error = %err,
                            "failed to serialize bulk item"
                        );
                        return Err(self.serialization_failure(Operation::IndexObjects, id.as_deref(), err));
                    }
                };

                requests.push(BulkRequest::Index {
                    index: self.index.clone(),
                    doc_type: self.document_type.clone(),
                    id,
                    body,
                });
            }

            self.send_bulk(Operation::IndexObjects, requests, true).await?;
        }

        Ok(())
    }

    /// Fetches an object by id. Missing documents and empty bodies yield `None`.
    pub async fn get_object(&self, id: &str) -> RepositoryResult<Option<T>> {
        let response = self
            .client
            .get_document(&self.index, &self.document_type, id)
            .await
            .context(Operation::GetObject, || self.describe(Some(id)))?;

        ResultMarshaller
            .from_get(&response, &self.decoder())
            .context(Operation::GetObject, || self.describe(Some(id)))
    }

    /// Fetches the objects with the given ids, in request order, skipping missing ones.
    pub async fn get_objects<I>(&self, ids: I) -> RepositoryResult<Vec<T>>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let responses = self
            .client
            .multi_get_documents(&self.index, &self.document_type, &ids)
            .await
            .context(Operation::GetObjects, || self.describe_type())?;

        ResultMarshaller
            .from_multi_get(&responses, &self.decoder())
            .context(Operation::GetObjects, || self.describe_type())
    }

    /// Deletes the document of an object.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the object has no id.
    pub async fn delete_object(&self, object: &T) -> RepositoryResult<()> {
        let id = self.id_for_delete(Operation::DeleteObject, object)?;

        debug!(
            index = self.index.as_str(),
            document_type = self.document_type.as_str(),
            id = id.as_str(),
            "deleting object"
        );

        self.client
            .delete_document(&self.index, &self.document_type, &id)
            .await
            .context(Operation::DeleteObject, || self.describe(Some(&id)))
    }

    /// Deletes the documents of several objects, chunked like [`index_objects`](Self::index_objects).
    pub async fn delete_objects(&self, objects: &[T]) -> RepositoryResult<()> {
        if objects.is_empty() {
            return Ok(());
        }

        for chunk in objects.chunks(self.bulk_size.get()) {
            let mut requests = Vec::with_capacity(chunk.len());

            for object in chunk {
                requests.push(BulkRequest::Delete {
                    index: self.index.clone(),
                    doc_type: self.document_type.clone(),
                    id: self.id_for_delete(Operation::DeleteObjects, object)?,
                });
            }

            self.send_bulk(Operation::DeleteObjects, requests, false).await?;
        }

        Ok(())
    }

    /// Deletes every document of the bound index matching the query. `None` does nothing.
    pub async fn delete_by_query(&self, query: Option<&Expr>) -> RepositoryResult<()> {
        let Some(query) = query else {
            return Ok(());
        };

        debug!(index = self.index.as_str(), ?query, "deleting by query");

        self.client
            .delete_by_query(&self.index, query)
            .await
            .context(Operation::DeleteByQuery, || self.describe_index())
    }

    /// Creates the bound index. Returns `false` and does nothing if it already exists.
    pub async fn create_index(&self) -> RepositoryResult<bool> {
        self.create_index_inner(None).await
    }

    /// Creates the bound index with settings. Returns `false` and does nothing if it already
    /// exists.
    pub async fn create_index_with_settings(&self, settings: IndexSettings) -> RepositoryResult<bool> {
        self.create_index_inner(Some(settings)).await
    }

    async fn create_index_inner(&self, settings: Option<IndexSettings>) -> RepositoryResult<bool> {
        if self.probe_index(Operation::CreateIndex).await? {
            warn!(index = self.index.as_str(), "index already exists, not creating it");
            return Ok(false);
        }

        debug!(index = self.index.as_str(), ?settings, "creating index");

        self.client
            .create_index(&self.index, settings)
            .await
            .context(Operation::CreateIndex, || self.describe_index())?;

        Ok(true)
    }

    /// Deletes the bound index. Returns `false` and does nothing if it does not exist.
    pub async fn delete_index(&self) -> RepositoryResult<bool> {
        if !self.probe_index(Operation::DeleteIndex).await? {
            warn!(index = self.index.as_str(), "index does not exist, not deleting it");
            return Ok(false);
        }

        debug!(index = self.index.as_str(), "deleting index");

        self.client
            .delete_index(&self.index)
            .await
            .context(Operation::DeleteIndex, || self.describe_index())?;

        Ok(true)
    }

    pub async fn index_exists(&self) -> RepositoryResult<bool> {
        self.probe_index(Operation::IndexExists).await
    }

    /// Derives the field mapping of the bound type.
    pub fn mapping(&self) -> Mapping {
        MappingBuilder::new().build(&T::schema())
    }

    /// Derives the field mapping of the bound type and installs it in the bound index.
    ///
    /// # Errors
    ///
    /// Fails with a mapping error if the mapping cannot be rendered, or with the store's error
    /// if it rejects the mapping.
    pub async fn create_mapping(&self) -> RepositoryResult<()> {
        let body = MappingSerializer
            .to_json_string(&self.mapping())
            .map_err(|err| SearchLayerError::Mapping(err.to_string()))
            .context(Operation::CreateMapping, || self.describe_type())?;

        debug!(
            index = self.index.as_str(),
            document_type = self.document_type.as_str(),
            mapping = body.as_str(),
            "putting mapping"
        );

        self.client
            .put_mapping(&self.index, &self.document_type, body)
            .await
            .context(Operation::CreateMapping, || self.describe_type())
    }

    /// Searches the bound index for documents of the bound type.
    ///
    /// The candidates of the query are ignored. Results carry their score, and the total hit
    /// count is that of the whole match set.
    ///
    /// # Errors
    ///
    /// Returns a resolution error if the store returns a hit of another document type.
    pub async fn execute_search(&self, query: &ComplexQuery) -> RepositoryResult<SearchResults<T>> {
        let request = SearchRequest {
            indexes: vec![self.index.clone()],
            types: vec![self.document_type.clone()],
            query: query.query.clone(),
            filter: query.filter.clone(),
            sort: query.sort.clone(),
            offset: query.offset,
            limit: query.limit,
        };

        debug!(
            index = self.index.as_str(),
            document_type = self.document_type.as_str(),
            ?request,
            "executing search"
        );

        let response = self
            .client
            .search(request)
            .await
            .context(Operation::ExecuteSearch, || self.describe_type())?;

        ResultMarshaller
            .from_search(response, &self.decoder())
            .context(Operation::ExecuteSearch, || self.describe_type())
    }

    async fn probe_index(&self, operation: Operation) -> RepositoryResult<bool> {
        self.client
            .index_exists(&self.index)
            .await
            .context(operation, || self.describe_index())
    }

    async fn send_bulk(
        &self,
        operation: Operation,
        requests: Vec<BulkRequest>,
        refresh: bool,
    ) -> RepositoryResult<()> {
        let size = requests.len();

        debug!(
            index = self.index.as_str(),
            document_type = self.document_type.as_str(),
            %operation,
            size,
            refresh,
            "sending bulk request"
        );

        let items = self
            .client
            .bulk(requests, refresh)
            .await
            .context(operation, || self.describe_type())?;

        let failures: Vec<_> = items.iter().filter(|item| item.is_failure()).collect();

        if let Some(first) = failures.first() {
            return Err(RepositoryError::new(
                operation,
                self.describe(first.id.as_deref()),
                SearchLayerError::StoreOperation(format!(
                    "{} of {size} bulk items failed, first failure: {}",
                    failures.len(),
                    first.error.as_deref().unwrap_or_default()
                )),
            ));
        }

        Ok(())
    }

    fn decoder(&self) -> TypedDecoder<'_, T, C> {
        TypedDecoder::new(&self.codec, &self.document_type)
    }

    fn id_for_write(&self, object: &T) -> Option<String> {
        if self.auto_generate_ids {
            None
        } else {
            object.id()
        }
    }

    fn id_for_delete(&self, operation: Operation, object: &T) -> RepositoryResult<String> {
        object.id().ok_or_else(|| {
            RepositoryError::new(
                operation,
                self.describe_type(),
                SearchLayerError::Validation("Object has no id".to_string()),
            )
        })
    }

    fn serialization_failure(&self, operation: Operation, id: Option<&str>, err: SearchLayerError) -> RepositoryError {
        RepositoryError::new(operation, self.describe(id), err)
    }

    fn describe(&self, id: Option<&str>) -> String {
        match id {
            Some(id) => format!("id {id} of type {}", self.document_type),
            None => self.describe_type(),
        }
    }

    fn describe_type(&self) -> String {
        format!("type {}", self.document_type)
    }

    fn describe_index(&self) -> String {
        format!("index {}", self.index)
    }
}

/// Builder for [`Repository`].
pub struct RepositoryBuilder<T, B, C = JsonCodec> {
    client: B,
    codec: C,
    strategies: Option<Arc<StrategyRegistry>>,
    settings: RepositorySettings,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Searchable, B: DocumentStoreClient> RepositoryBuilder<T, B> {
    pub fn new(client: B) -> Self {
        Self {
            client,
            codec: JsonCodec,
            strategies: None,
            settings: RepositorySettings::default(),
            _marker: PhantomData,
        }
    }
}

impl<T: Searchable, B: DocumentStoreClient, C: Codec> RepositoryBuilder<T, B, C> {
    /// Sets the strategy registry used to resolve the index name. Defaults to a fresh registry
    /// with the built-in strategies.
    pub fn strategies(mut self, strategies: Arc<StrategyRegistry>) -> Self {
        self.strategies = Some(strategies);
        self
    }

    pub fn settings(mut self, settings: RepositorySettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn bulk_size(mut self, bulk_size: usize) -> Self {
        self.settings.bulk_size = bulk_size;
        self
    }

    /// Replaces the codec used for document bodies.
    pub fn codec<D: Codec>(self, codec: D) -> RepositoryBuilder<T, B, D> {
        RepositoryBuilder {
            client: self.client,
            codec,
            strategies: self.strategies,
            settings: self.settings,
            _marker: PhantomData,
        }
    }

    /// Resolves the binding of `T` and builds the repository.
    ///
    /// # Errors
    ///
    /// - Configuration error if the index name cannot be resolved
    /// - Validation error if the resolved index name is empty or the bulk size is zero
    pub fn build(self) -> RepositoryResult<Repository<T, B, C>> {
        let schema = T::schema();
        let describe = || format!("type {}", schema.type_name());

        let strategies = self
            .strategies
            .unwrap_or_else(|| Arc::new(StrategyRegistry::new()));
        let index = strategies
            .resolve(&schema)
            .context(Operation::Bind, describe)?;
        let bulk_size = self
            .settings
            .bulk_size()
            .context(Operation::Bind, describe)?;
        let document_type = schema.document_type_name().to_string();
        let auto_generate_ids = schema.id().is_some_and(|id| id.auto_generate);

        debug!(
            index = index.as_str(),
            document_type = document_type.as_str(),
            bulk_size = bulk_size.get(),
            "bound repository"
        );

        Ok(Repository {
            client: self.client,
            codec: self.codec,
            index,
            document_type,
            auto_generate_ids,
            bulk_size,
            _marker: PhantomData,
        })
    }
}
