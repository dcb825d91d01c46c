//! Typed repositories and derived field mappings for search document stores.
//!
//! This crate is the primary entry point of the searchlayer project. It re-exports the core
//! types from the sub-crates, the `Searchable` derive macro and the in-memory store.
//!
//! # Features
//!
//! - **Derived mappings** - Field mappings computed from `#[search(...)]` attributes
//! - **Typed repositories** - Index, fetch, delete and search one stored type
//! - **Multi-type search** - One query over several stored types, decoded per hit
//! - **Pluggable index naming** - Index-name strategies selected per type
//!
//! # Quick Start
//!
//! ```ignore
//! use searchlayer::{prelude::*, memory::InMemoryStore};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize, Searchable)]
//! #[search(index = "twitter", document_type = "tweet")]
//! pub struct Tweet {
//!     #[search(id)]
//!     pub id: String,
//!     #[search(kind = "string", filterable = false, free_text_searchable = true)]
//!     pub message: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), RepositoryError> {
//!     let store = InMemoryStore::new();
//!     let tweets = Repository::<Tweet, _>::new(&store)?;
//!
//!     tweets.create_index().await?;
//!     tweets.create_mapping().await?;
//!     tweets
//!         .index_object(&Tweet { id: "1".into(), message: "a lazy dog".into() })
//!         .await?;
//!
//!     let results = tweets
//!         .execute_search(&ComplexQuery::builder().query(Filter::matches("message", "dog")).build())
//!         .await?;
//!
//!     println!("{} hits", results.total_hits);
//!     Ok(())
//! }
//! ```
//!
//! # Stores
//!
//! - [`memory`] - In-memory document store for development and testing

#[allow(unused_extern_crates)]
extern crate self as searchlayer;

pub mod prelude;

pub use searchlayer_core::{
    client, codec, document, error, index, introspect, mapping, multi, page, query, repository,
    result, schema, serializer, settings,
};

pub use searchlayer_macros::Searchable;

/// In-memory document store implementations.
pub mod memory {
    pub use searchlayer_memory::{InMemoryStore, InMemoryStoreBuilder};
}
