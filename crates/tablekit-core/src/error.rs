//! The access-layer error type.

use tablekit_model::StoreError;

use crate::expression::ExpressionError;

/// Errors surfaced by the retrieval engine and entity facade.
///
/// Expression and request-shape errors are raised before any remote call.
/// Store errors propagate from the first failing remote call, aborting any
/// in-flight multi-page retrieval with no partial result.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    /// The request shape is invalid (detected before any remote call).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A condition tree could not be compiled.
    #[error(transparent)]
    Expression(#[from] ExpressionError),

    /// A remote store call failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The entity does not define the named index.
    #[error("no index named `{0}` is defined for this entity")]
    UnknownIndex(String),

    /// The entity does not define the named range query.
    #[error("no range query named `{0}` is defined for this entity")]
    UnknownRangeQuery(String),

    /// The entity does not support the requested operation.
    #[error("entity does not define {0}")]
    UnsupportedOperation(&'static str),
}
