use thiserror::Error;

/// Errors from embedding providers.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding provider unreachable: {0}")]
    Connectivity(String),

    /// The provider does not accept the extra arguments it was called with.
    ///
    /// This is the only embedding failure the dimension adapter recovers from
    /// locally (by retrying with the bare text).
    #[error("unsupported embedding arguments: {0}")]
    UnsupportedArguments(String),

    #[error("embedding provider error: {0}")]
    Provider(String),

    #[error("embedding provider returned no vector")]
    EmptyResponse,
}

/// Errors from vector and graph store operations (used by trait definitions in twinmem-core).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unreachable: {0}")]
    Connectivity(String),

    #[error(
        "dimension mismatch for collection '{collection}': expected {expected}, got {actual}"
    )]
    DimensionMismatch {
        collection: String,
        expected: usize,
        actual: usize,
    },

    #[error("query error: {0}")]
    Query(String),
}

impl StoreError {
    /// Whether the error means the backing store could not be reached at all.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, StoreError::Connectivity(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_display() {
        let err = StoreError::DimensionMismatch {
            collection: "memories".to_string(),
            expected: 1536,
            actual: 2048,
        };
        let msg = err.to_string();
        assert!(msg.contains("memories"));
        assert!(msg.contains("1536"));
        assert!(msg.contains("2048"));
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_is_connectivity() {
        assert!(StoreError::Connectivity("refused".into()).is_connectivity());
        assert!(!StoreError::Query("syntax error".into()).is_connectivity());
        assert!(
            !StoreError::DimensionMismatch {
                collection: "memories".into(),
                expected: 1536,
                actual: 1024,
            }
            .is_connectivity()
        );
    }

    #[test]
    fn test_unsupported_arguments_display() {
        let err = EmbeddingError::UnsupportedArguments("memory_action".to_string());
        assert_eq!(err.to_string(), "unsupported embedding arguments: memory_action");
    }
}
