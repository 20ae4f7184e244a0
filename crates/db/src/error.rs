//! Store-level error type.

use cadence_core::error::CoreError;

/// Failure reported by a store adapter.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The backing store refused the operation (used by [`MemoryStore`](crate::MemoryStore)
    /// fail points).
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Convenience alias for store results.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        CoreError::Internal(err.to_string())
    }
}
