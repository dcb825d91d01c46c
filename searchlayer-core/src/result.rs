//! Marshalling of raw store responses into typed results.

use std::marker::PhantomData;
use tracing::error;

use crate::{
    client::{GetResponse, SearchHit, SearchResponse},
    codec::Codec,
    document::{AnySearchable, Searchable, TypeRegistry},
    error::{SearchLayerError, SearchLayerResult},
    page::{Page, PaginationParams},
};

/// A decoded document with the identity and relevance score of the hit it came from.
#[derive(Debug, Clone)]
pub struct SearchResult<T> {
    pub document: T,
    pub document_type: String,
    pub id: String,
    /// Relevance score, set for search hits only.
    pub score: Option<f32>,
}

/// The decoded hits of a search, in store order.
#[derive(Debug, Clone)]
pub struct SearchResults<T> {
    pub results: Vec<SearchResult<T>>,
    /// Number of matching documents before offset and limit were applied.
    pub total_hits: u64,
}

impl<T> Default for SearchResults<T> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
            total_hits: 0,
        }
    }
}

impl<T> SearchResults<T> {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SearchResult<T>> {
        self.results.iter()
    }

    /// Drops scores and identities, keeping the documents.
    pub fn into_documents(self) -> Vec<T> {
        self.results.into_iter().map(|result| result.document).collect()
    }

    /// Wraps the results as the page selected by `params`.
    ///
    /// The search must have been issued with the same parameters, e.g. through
    /// [`ComplexQueryBuilder::paginate`](crate::query::ComplexQueryBuilder::paginate).
    pub fn into_page(self, params: &PaginationParams) -> Page<SearchResult<T>> {
        let total = usize::try_from(self.total_hits).unwrap_or(usize::MAX);
        params.page_of(self.results, total)
    }
}

impl<T> IntoIterator for SearchResults<T> {
    type Item = SearchResult<T>;
    type IntoIter = std::vec::IntoIter<SearchResult<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

/// Turns the body of a hit into a value, given the hit's document-type tag.
pub trait HitDecoder<T> {
    fn decode(&self, document_type: &str, body: &str) -> SearchLayerResult<T>;
}

/// Decodes hits of exactly one stored type.
#[derive(Debug)]
pub struct TypedDecoder<'a, T, C> {
    codec: &'a C,
    document_type: &'a str,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T, C> TypedDecoder<'a, T, C> {
    pub fn new(codec: &'a C, document_type: &'a str) -> Self {
        Self {
            codec,
            document_type,
            _marker: PhantomData,
        }
    }
}

impl<T: Searchable, C: Codec> HitDecoder<T> for TypedDecoder<'_, T, C> {
    fn decode(&self, document_type: &str, body: &str) -> SearchLayerResult<T> {
        if document_type != self.document_type {
            return Err(SearchLayerError::Resolution(format!(
                "Document type {document_type} is not permitted, expected {}",
                self.document_type
            )));
        }

        self.codec.deserialize(body)
    }
}

/// Decodes hits of any registered type among a set of permitted document types.
#[derive(Debug)]
pub struct RegistryDecoder<'a, C> {
    codec: &'a C,
    registry: &'a TypeRegistry<C>,
    permitted: &'a [String],
}

impl<'a, C> RegistryDecoder<'a, C> {
    pub fn new(codec: &'a C, registry: &'a TypeRegistry<C>, permitted: &'a [String]) -> Self {
        Self {
            codec,
            registry,
            permitted,
        }
    }
}

impl<C: Codec> HitDecoder<Box<dyn AnySearchable>> for RegistryDecoder<'_, C> {
    fn decode(&self, document_type: &str, body: &str) -> SearchLayerResult<Box<dyn AnySearchable>> {
        if !self.permitted.iter().any(|permitted| permitted == document_type) {
            return Err(SearchLayerError::Resolution(format!(
                "Document type {document_type} is not among the query candidates"
            )));
        }

        self.registry.resolve(document_type)?.decode(self.codec, body)
    }
}

/// Converts get, multi-get and search responses into decoded values.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResultMarshaller;

impl ResultMarshaller {
    /// Decodes a get response. Missing documents and empty bodies yield `None`.
    ///
    /// # Errors
    ///
    /// Returns the decoder's error, prefixed with the document id and type.
    pub fn from_get<T>(&self, response: &GetResponse, decoder: &impl HitDecoder<T>) -> SearchLayerResult<Option<T>> {
        if !response.exists {
            return Ok(None);
        }

        match response.source.as_deref() {
            Some(body) if !body.is_empty() => {
                Self::decode(decoder, &response.doc_type, &response.id, body).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Decodes the documents of a multi-get response, skipping missing ones.
    pub fn from_multi_get<T>(
        &self,
        responses: &[GetResponse],
        decoder: &impl HitDecoder<T>,
    ) -> SearchLayerResult<Vec<T>> {
        let mut documents = Vec::with_capacity(responses.len());

        for response in responses {
            if let Some(document) = self.from_get(response, decoder)? {
                documents.push(document);
            }
        }

        Ok(documents)
    }

    /// Decodes every hit of a search response, keeping scores and the total hit count.
    ///
    /// # Errors
    ///
    /// Fails on the first hit that has no body, has a document type the decoder does not
    /// accept, or does not decode.
    pub fn from_search<T>(
        &self,
        response: SearchResponse,
        decoder: &impl HitDecoder<T>,
    ) -> SearchLayerResult<SearchResults<T>> {
        let mut results = Vec::with_capacity(response.hits.len());

        for hit in response.hits {
            let SearchHit {
                doc_type,
                id,
                score,
                source,
                ..
            } = hit;

            let body = source.filter(|body| !body.is_empty()).ok_or_else(|| {
                SearchLayerError::Serialization(format!("Hit {id} of type {doc_type} has no source"))
            })?;

            let document = Self::decode(decoder, &doc_type, &id, &body)?;

            results.push(SearchResult {
                document,
                document_type: doc_type,
                id,
                score: Some(score),
            });
        }

        Ok(SearchResults {
            results,
            total_hits: response.total_hits,
        })
    }

    fn decode<T>(decoder: &impl HitDecoder<T>, document_type: &str, id: &str, body: &str) -> SearchLayerResult<T> {
        decoder.decode(document_type, body).map_err(|err| {
            error!(document_type, id, error = %err, "failed to unmarshal hit");
            err.with_context(format!("hit {id} of type {document_type}"))
        })
    }
}
