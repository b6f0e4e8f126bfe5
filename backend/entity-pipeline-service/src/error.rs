/// Error types for entity-pipeline-service
use thiserror::Error;

/// Storage-layer failures surfaced through the `EntityStore` seam.
///
/// Uniqueness conflicts never appear here: implementations recover them
/// internally by falling back to a lookup.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Pipeline failures reported to the invoking consumer.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Entity serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    /// Whether the invoking scheduler should redeliver the unit. Only
    /// storage unavailability warrants a retry of the whole pipeline.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PipelineError::Store(_))
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;
