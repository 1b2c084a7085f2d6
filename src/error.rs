//! Mimir error types

/// Mimir error types.
///
/// These cover failures of the caching machinery itself. Errors raised by a
/// cached operation never pass through this type: the interceptor hands them
/// back to the caller untouched.
#[derive(Debug, thiserror::Error)]
pub enum MimirError {
    // Configuration errors
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    // Key encoding and cached value errors
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A cached slot holds a value of another type than requested.
    #[error("cached value type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Storage errors
    /// A write targeted a namespace that was never created.
    ///
    /// Reads from unknown namespaces are plain misses, not errors.
    #[error("unknown cache namespace: {0}")]
    UnknownNamespace(String),
}

impl MimirError {
    /// Whether this error came from the configuration layer.
    pub fn is_configuration(&self) -> bool {
        matches!(self, MimirError::InvalidConfiguration(_))
    }
}

/// Result type alias for Mimir operations
pub type Result<T> = std::result::Result<T, MimirError>;
