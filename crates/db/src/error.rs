use gupta_core::error::CoreError;

/// Failure while persisting an event.
#[derive(Debug, thiserror::Error)]
pub enum EventStoreError {
    /// The event was rejected before touching storage (e.g. already saved).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The backend failed; the transaction has been rolled back.
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}
