//! Searches spanning several stored types.
//!
//! A [`MultiTypeRepository`] fans one query out across the indexes of the candidate types named
//! in the query and decodes each hit as the registered type of its document-type tag.
//!
//! ```ignore
//! let registry = Arc::new(TypeRegistry::new().register::<Tweet>().register::<Retweet>());
//! let search = MultiTypeRepository::new(&store, registry);
//!
//! let results = search
//!     .execute_search(&ComplexQuery::builder().candidates(["tweet", "retweet"]).build())
//!     .await?;
//!
//! for result in results {
//!     if let Some(tweet) = result.document.downcast_ref::<Tweet>() {
//!         println!("{}", tweet.message);
//!     }
//! }
//! ```

use std::sync::Arc;
use tracing::debug;

use crate::{
    client::{DocumentStoreClient, SearchRequest},
    codec::{Codec, JsonCodec},
    document::{AnySearchable, TypeRegistry},
    error::{Operation, RepositoryError, RepositoryResult, ResultExt, SearchLayerError},
    index::StrategyRegistry,
    query::ComplexQuery,
    result::{RegistryDecoder, ResultMarshaller, SearchResults},
};

/// Search facade over every type of a [`TypeRegistry`].
#[derive(Debug)]
pub struct MultiTypeRepository<B, C = JsonCodec> {
    client: B,
    codec: C,
    registry: Arc<TypeRegistry<C>>,
    strategies: Arc<StrategyRegistry>,
}

impl<B: DocumentStoreClient> MultiTypeRepository<B> {
    /// Creates a repository using the built-in index-name strategies.
    pub fn new(client: B, registry: Arc<TypeRegistry<JsonCodec>>) -> Self {
        Self::with_codec(client, JsonCodec, registry, Arc::new(StrategyRegistry::new()))
    }
}

impl<B: DocumentStoreClient, C: Codec> MultiTypeRepository<B, C> {
    pub fn with_codec(
        client: B,
        codec: C,
        registry: Arc<TypeRegistry<C>>,
        strategies: Arc<StrategyRegistry>,
    ) -> Self {
        Self {
            client,
            codec,
            registry,
            strategies,
        }
    }

    pub fn registry(&self) -> &TypeRegistry<C> {
        &self.registry
    }

    /// Searches the indexes of the candidate types and decodes every hit.
    ///
    /// # Errors
    ///
    /// - Validation error if the query names no candidate
    /// - Resolution error if a candidate is not registered, or a hit has a document type that
    ///   is not a candidate
    /// - Configuration error if the index of a candidate cannot be resolved
    pub async fn execute_search(
        &self,
        query: &ComplexQuery,
    ) -> RepositoryResult<SearchResults<Box<dyn AnySearchable>>> {
        let describe = || format!("candidates [{}]", query.candidates.join(", "));

        if query.candidates.is_empty() {
            return Err(RepositoryError::new(
                Operation::ExecuteSearch,
                describe(),
                SearchLayerError::Validation("Query names no candidate type".to_string()),
            ));
        }

        let mut indexes: Vec<String> = Vec::new();

        for candidate in &query.candidates {
            let registered = self
                .registry
                .resolve(candidate)
                .context(Operation::ExecuteSearch, describe)?;
            let index = self
                .strategies
                .resolve(registered.schema())
                .context(Operation::ExecuteSearch, describe)?;

            if !indexes.contains(&index) {
                indexes.push(index);
            }
        }

        let request = SearchRequest {
            indexes,
            types: query.candidates.clone(),
            query: query.query.clone(),
            filter: query.filter.clone(),
            sort: query.sort.clone(),
            offset: query.offset,
            limit: query.limit,
        };

        debug!(?request, "executing multi-type search");

        let response = self
            .client
            .search(request)
            .await
            .context(Operation::ExecuteSearch, describe)?;

        let decoder = RegistryDecoder::new(&self.codec, &self.registry, &query.candidates);

        ResultMarshaller
            .from_search(response, &decoder)
            .context(Operation::ExecuteSearch, describe)
    }
}
