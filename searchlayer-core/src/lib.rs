//! Typed repositories and derived field mappings for search document stores.
//!
//! This crate is the core of the searchlayer project and provides:
//!
//! - **Type schemas** ([`schema`]) - Declarative description of stored types and their field configuration
//! - **Property introspection** ([`introspect`]) - Discovery of accessible and configured properties
//! - **Mapping derivation** ([`mapping`], [`serializer`]) - Field-mapping trees and their wire rendering
//! - **Index-name strategies** ([`index`]) - Pluggable resolution of index names
//! - **Store client abstraction** ([`client`]) - The async interface of a document store
//! - **Codecs** ([`codec`]) - Encoding of document bodies
//! - **Queries** ([`query`]) - Expression AST and search requests
//! - **Results and pagination** ([`result`], [`page`]) - Typed, scored search results
//! - **Repositories** ([`repository`], [`multi`]) - Single-type and multi-type repositories
//! - **Error handling** ([`error`]) - Error types and result types
//!
//! # Example
//!
//! ```ignore
//! use searchlayer_core::{document::Searchable, schema::*};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct Tweet {
//!     pub id: String,
//!     pub message: String,
//! }
//!
//! impl Searchable for Tweet {
//!     fn schema() -> TypeSchema {
//!         TypeSchema::builder("Tweet")
//!             .document_type("tweet")
//!             .index("twitter")
//!             .id("id", false)
//!             .property(PropertyDescriptor::new("id"))
//!             .property(PropertyDescriptor::new("message").mapped(
//!                 FieldMapping::new(FieldType::String).filterable(false).free_text_searchable(true),
//!             ))
//!             .build()
//!     }
//!
//!     fn id(&self) -> Option<String> {
//!         Some(self.id.clone())
//!     }
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as searchlayer_core;

pub mod client;
pub mod codec;
pub mod document;
pub mod error;
pub mod index;
pub mod introspect;
pub mod mapping;
pub mod multi;
pub mod page;
pub mod query;
pub mod repository;
pub mod result;
pub mod schema;
pub mod serializer;
pub mod settings;
