//! The store-boundary error type.
//!
//! Remote calls fail with a `StoreError`: a well-known code plus a
//! human-readable message and an optional source. The access layer never
//! retries these; they propagate to the caller as-is.

use std::fmt;

/// Well-known store error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum StoreErrorCode {
    /// The addressed table or index does not exist.
    ResourceNotFound,
    /// The request parameters were rejected by the store.
    #[default]
    Validation,
    /// A conditional write's condition evaluated to false.
    ConditionalCheckFailed,
    /// The store throttled the request.
    Throttled,
    /// A request or response body could not be (de)serialized.
    Serialization,
    /// The store reported an internal failure.
    InternalError,
    /// The transport failed before a store response was received.
    Transport,
}

impl StoreErrorCode {
    /// Returns the short error code string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResourceNotFound => "ResourceNotFound",
            Self::Validation => "Validation",
            Self::ConditionalCheckFailed => "ConditionalCheckFailed",
            Self::Throttled => "Throttled",
            Self::Serialization => "Serialization",
            Self::InternalError => "InternalError",
            Self::Transport => "Transport",
        }
    }
}

impl fmt::Display for StoreErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error returned by a store collaborator.
#[derive(Debug)]
pub struct StoreError {
    /// The error code.
    pub code: StoreErrorCode,
    /// A human-readable error message.
    pub message: String,
    /// The underlying source error, if any.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StoreError({}): {}", self.code, self.message)
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl StoreError {
    /// Create a new `StoreError` from an error code.
    #[must_use]
    pub fn new(code: StoreErrorCode) -> Self {
        Self {
            message: code.as_str().to_owned(),
            code,
            source: None,
        }
    }

    /// Create a new `StoreError` with a custom message.
    #[must_use]
    pub fn with_message(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code,
            source: None,
        }
    }

    /// Set the source error.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // -- Convenience constructors --

    /// Table or index not found.
    #[must_use]
    pub fn resource_not_found(message: impl Into<String>) -> Self {
        Self::with_message(StoreErrorCode::ResourceNotFound, message)
    }

    /// Request rejected by the store.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::with_message(StoreErrorCode::Validation, message)
    }

    /// Conditional write failed.
    #[must_use]
    pub fn conditional_check_failed(message: impl Into<String>) -> Self {
        Self::with_message(StoreErrorCode::ConditionalCheckFailed, message)
    }

    /// Store-side internal failure.
    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::with_message(StoreErrorCode::InternalError, message)
    }

    /// Transport-level failure.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::with_message(StoreErrorCode::Transport, message)
    }
}

/// Create a `StoreError` from an error code.
///
/// # Examples
///
/// ```
/// use tablekit_model::error::StoreErrorCode;
/// use tablekit_model::store_error;
///
/// let err = store_error!(Validation);
/// assert_eq!(err.code, StoreErrorCode::Validation);
///
/// let err = store_error!(ResourceNotFound, "no such table");
/// assert_eq!(err.message, "no such table");
/// ```
#[macro_export]
macro_rules! store_error {
    ($code:ident) => {
        $crate::error::StoreError::new($crate::error::StoreErrorCode::$code)
    };
    ($code:ident, $msg:expr) => {
        $crate::error::StoreError::with_message($crate::error::StoreErrorCode::$code, $msg)
    };
}
