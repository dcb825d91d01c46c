//! Convenient re-exports of commonly used types from searchlayer.
//!
//! ```ignore
//! use searchlayer::prelude::*;
//! ```

pub use searchlayer_core::{
    client::{DocumentStoreClient, DocumentStoreClientBuilder, IndexSettings},
    codec::{Codec, JsonCodec},
    document::{AnySearchable, Searchable, TypeRegistry},
    error::{Operation, RepositoryError, RepositoryResult, SearchLayerError, SearchLayerResult},
    index::{IndexNameStrategy, StrategyRegistry},
    mapping::{Mapping, MappingBuilder},
    multi::MultiTypeRepository,
    page::{Page, PaginationParams},
    query::{ComplexQuery, Expr, FieldOp, Filter, QueryVisitor, Sort, SortDirection},
    repository::{Repository, RepositoryBuilder},
    result::{SearchResult, SearchResults},
    schema::{FieldMapping, FieldType, PropertyDescriptor, TypeSchema},
    serializer::MappingSerializer,
    settings::RepositorySettings,
};

pub use searchlayer_macros::Searchable;
