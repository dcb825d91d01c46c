//! Procedural macros for the searchlayer project.
//!
//! `#[derive(Searchable)]` implements `searchlayer::document::Searchable` from attributes on
//! a struct with named fields.
//!
//! # Container attributes
//!
//! - `#[search(index = "...")]` - The declared index name
//! - `#[search(strategy = "...")]` - The index-name strategy identifier
//! - `#[search(document_type = "...")]` - The document-type name
//!
//! # Field attributes
//!
//! - `#[search(kind = "string", filterable = bool, free_text_searchable = bool)]` - Mapping configuration
//! - `#[search(id)]`, `#[search(id, auto_generate)]` - The id property
//! - `#[search(nested)]`, `#[search(nested(Reply))]` - Type arguments that are stored types
//! - `#[search(skip)]` - Not a property
//! - `#[search(write_only)]` - A property that cannot be read back
//!
//! Property names follow `#[serde(rename)]` and `#[serde(rename_all)]`.
//!
//! ```ignore
//! use searchlayer::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize, Searchable)]
//! #[search(index = "twitter", document_type = "tweet")]
//! #[serde(rename_all = "camelCase")]
//! pub struct Tweet {
//!     #[search(id)]
//!     pub id: String,
//!     #[search(kind = "string", filterable = false, free_text_searchable = true)]
//!     pub message: String,
//!     #[search(kind = "date")]
//!     pub post_date: String,
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as searchlayer_macros;

mod attrs;
mod searchable;

use proc_macro::TokenStream;

#[proc_macro_derive(Searchable, attributes(search))]
pub fn derive_searchable(input: TokenStream) -> TokenStream {
    searchable::derive_searchable(input.into()).into()
}
