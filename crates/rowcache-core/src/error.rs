//! Error types for the row cache.

/// Error raised by a [`RowSource`](crate::RowSource) or its cursor.
///
/// The cache never inspects it; it is handed back to the caller as-is.
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for source operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Row cache errors.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Row, column, window or size argument outside its valid range.
    #[error("index out of bounds: {message}")]
    OutOfBounds { message: String },

    /// The total row count is not (yet) final.
    #[error("row count unknown: the table has not been traversed completely")]
    RowCountUnknown,

    /// The execution monitor signaled cancellation while the cursor advanced.
    #[error("execution canceled")]
    Canceled,

    /// The requested row slid out of the window and the cursor cannot go back.
    #[error("row {row} was evicted from the cache (first cached row is {first_cached})")]
    RowEvicted { row: usize, first_cached: usize },

    /// A column filter named a column the table does not have.
    #[error("unknown column: {name}")]
    UnknownColumn { name: String },

    /// Invalid cache configuration.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Failure raised by the underlying source, passed through unchanged.
    #[error(transparent)]
    Source(SourceError),
}

impl CacheError {
    pub(crate) fn out_of_bounds(message: impl Into<String>) -> Self {
        Self::OutOfBounds {
            message: message.into(),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether the request is wrong, as opposed to the cache or source failing.
    pub fn is_bounds_error(&self) -> bool {
        matches!(self, Self::OutOfBounds { .. } | Self::RowEvicted { .. })
    }
}

impl From<SourceError> for CacheError {
    fn from(err: SourceError) -> Self {
        Self::Source(err)
    }
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[derive(Debug, thiserror::Error)]
    #[error("disk on fire")]
    struct DiskError;

    #[test]
    fn test_source_error_is_transparent() {
        let err = CacheError::from(Box::new(DiskError) as SourceError);
        assert_eq!(err.to_string(), "disk on fire");

        match err {
            CacheError::Source(inner) => assert!(inner.downcast_ref::<DiskError>().is_some()),
            other => panic!("expected source variant, got {other:?}"),
        }
    }

    #[test]
    fn test_evicted_is_bounds_error() {
        let err = CacheError::RowEvicted {
            row: 3,
            first_cached: 10,
        };
        assert!(err.is_bounds_error());
        assert!(err.source().is_none());
        assert!(err.to_string().contains("first cached row is 10"));
    }
}
