//! Error taxonomy for the recall engine.
//!
//! Two failure classes cross the crate boundary: [`RecallError::InvalidScope`]
//! for malformed scope addresses (a programming error in the caller, never
//! retried) and [`StorageError`] for I/O failures. Partial data unavailability
//! is *not* an error — the orchestrator downgrades per-scope load failures to
//! empty contributions, and an unresolvable seed set is a defined empty result.

use thiserror::Error;

/// Persistence-layer failure. Propagated verbatim for direct mutations
/// (`update_disposition`); caught and downgraded per-scope during recall.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A blocking storage task panicked or was cancelled.
    #[error("storage task failed: {0}")]
    Task(String),
}

/// Top-level error for recall operations.
#[derive(Debug, Error)]
pub enum RecallError {
    /// The scope address is malformed for its declared type — e.g. an `area`
    /// scope with no `chapter_id`. Fails the calling request.
    #[error("invalid scope address: {0}")]
    InvalidScope(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
