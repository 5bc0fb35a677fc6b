//! Custom extractors for Axum handlers.
//!
//! Each rejection renders the standard error envelope, so handlers only see
//! well-formed input.

pub mod id_path;
pub mod validated_json;
pub mod validated_query;

pub use id_path::IdPath;
pub use validated_json::ValidatedJson;
pub use validated_query::ValidatedQuery;
