//! In-memory document store for searchlayer.
//!
//! This crate provides a thread-safe, in-memory implementation of the `DocumentStoreClient`
//! trait. It uses async-aware read-write locks for concurrent access and is meant for
//! development, testing and embedding.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using an async-aware RwLock
//! - **Search evaluation** - Query and filter expressions with relevance scoring, sorting and pagination
//! - **Index bookkeeping** - Index settings and per-type mappings are kept for inspection
//!
//! # Quick Start
//!
//! ```ignore
//! use searchlayer::{prelude::*, memory::InMemoryStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = InMemoryStore::new();
//!     let tweets = Repository::<Tweet, _>::new(&store)?;
//!
//!     tweets.create_index().await?;
//!     tweets.index_object(&tweet).await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as searchlayer_memory;

pub mod evaluator;
pub mod store;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
