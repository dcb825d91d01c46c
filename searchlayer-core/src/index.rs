//! Index-name resolution.
//!
//! Every stored type names an index-name strategy in its [`IndexConfig`](crate::schema::IndexConfig).
//! Strategies are looked up by that identifier in a [`StrategyRegistry`], which holds the
//! constructors registered at startup and caches the instances it creates. Two strategies are
//! built in:
//!
//! - [`ANNOTATED_STRATEGY`]: the index name declared on the type
//! - [`TYPE_NAME_STRATEGY`]: the lower-cased document-type name
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use searchlayer::index::StrategyRegistry;
//!
//! let strategies = Arc::new(StrategyRegistry::new());
//! let index = strategies.resolve(&Tweet::schema())?;
//! ```

use dashmap::DashMap;
use std::{collections::HashMap, fmt::Debug, sync::Arc};
use tracing::debug;

use crate::{
    error::{SearchLayerError, SearchLayerResult},
    schema::TypeSchema,
};

/// Identifier of the strategy that reads the declared index name.
pub const ANNOTATED_STRATEGY: &str = "annotated";
/// Identifier of the strategy that derives the index name from the document type.
pub const TYPE_NAME_STRATEGY: &str = "type_name";

/// Maps a stored type to the name of the index holding its documents.
pub trait IndexNameStrategy: Send + Sync + Debug {
    /// Returns the index name for the given type.
    ///
    /// # Errors
    ///
    /// Implementations return [`SearchLayerError::Configuration`] when the type lacks the
    /// configuration they need.
    fn index_for(&self, schema: &TypeSchema) -> SearchLayerResult<String>;
}

/// Uses the index name declared in the type's index configuration.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnnotatedIndexNameStrategy;

impl IndexNameStrategy for AnnotatedIndexNameStrategy {
    fn index_for(&self, schema: &TypeSchema) -> SearchLayerResult<String> {
        let config = schema.index().ok_or_else(|| {
            SearchLayerError::Configuration(format!(
                "No index configuration found on type {}",
                schema.type_name()
            ))
        })?;

        if config.name.is_empty() {
            return Err(SearchLayerError::Configuration(format!(
                "Index name declared on type {} is empty",
                schema.type_name()
            )));
        }

        Ok(config.name.clone())
    }
}

/// Uses the lower-cased document-type name.
#[derive(Debug, Default, Clone, Copy)]
pub struct TypeNameIndexNameStrategy;

impl IndexNameStrategy for TypeNameIndexNameStrategy {
    fn index_for(&self, schema: &TypeSchema) -> SearchLayerResult<String> {
        Ok(schema.document_type_name().to_lowercase())
    }
}

/// Creates a strategy instance.
pub type StrategyConstructor = fn() -> Arc<dyn IndexNameStrategy>;

fn annotated() -> Arc<dyn IndexNameStrategy> {
    Arc::new(AnnotatedIndexNameStrategy)
}

fn type_name() -> Arc<dyn IndexNameStrategy> {
    Arc::new(TypeNameIndexNameStrategy)
}

/// Lookup-or-create registry of index-name strategies keyed by identifier.
///
/// Constructors are registered up front; instances are created on first use and cached for
/// the lifetime of the registry. Two callers racing on the first lookup of an identifier may
/// both construct an instance, in which case the first one cached is kept.
#[derive(Debug)]
pub struct StrategyRegistry {
    constructors: HashMap<String, StrategyConstructor>,
    instances: DashMap<String, Arc<dyn IndexNameStrategy>>,
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::empty()
            .with_strategy(ANNOTATED_STRATEGY, annotated)
            .with_strategy(TYPE_NAME_STRATEGY, type_name)
    }
}

impl StrategyRegistry {
    /// Creates a registry with the built-in strategies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry without any strategy.
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
            instances: DashMap::new(),
        }
    }

    /// Registers a constructor under the given identifier, replacing any previous one.
    pub fn with_strategy(mut self, id: impl Into<String>, constructor: StrategyConstructor) -> Self {
        self.constructors.insert(id.into(), constructor);
        self
    }

    /// Returns the strategy registered under `id`, creating and caching it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`SearchLayerError::Configuration`] if no constructor is registered under `id`.
    pub fn strategy(&self, id: &str) -> SearchLayerResult<Arc<dyn IndexNameStrategy>> {
        if let Some(instance) = self.instances.get(id) {
            return Ok(Arc::clone(instance.value()));
        }

        let constructor = self.constructors.get(id).ok_or_else(|| {
            SearchLayerError::Configuration(format!("Unknown index name strategy: {id}"))
        })?;

        let instance = self
            .instances
            .entry(id.to_string())
            .or_insert_with(*constructor);

        Ok(Arc::clone(instance.value()))
    }

    /// Returns whether an instance of the strategy has been created already.
    pub fn is_cached(&self, id: &str) -> bool {
        self.instances.contains_key(id)
    }

    /// Resolves the index name of a type through the strategy named in its index configuration.
    ///
    /// # Errors
    ///
    /// - [`SearchLayerError::Configuration`] if the type has no index configuration, names an
    ///   unknown strategy, or the strategy rejects the type
    /// - [`SearchLayerError::Validation`] if the strategy returns an empty name
    pub fn resolve(&self, schema: &TypeSchema) -> SearchLayerResult<String> {
        let config = schema.index().ok_or_else(|| {
            SearchLayerError::Configuration(format!(
                "No index configuration found on type {}",
                schema.type_name()
            ))
        })?;

        let name = self.strategy(&config.strategy)?.index_for(schema)?;

        if name.is_empty() {
            return Err(SearchLayerError::Validation(format!(
                "Strategy {} returned an empty index name for type {}",
                config.strategy,
                schema.type_name()
            )));
        }

        debug!(
            type_name = schema.type_name(),
            strategy = config.strategy.as_str(),
            index = name.as_str(),
            "resolved index name"
        );

        Ok(name)
    }
}
