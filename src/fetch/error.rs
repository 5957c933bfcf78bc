//! Error taxonomy for the fetch-and-reconcile core

use thiserror::Error;

use crate::models::CollectionKind;

/// Fetch core error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// A task was started twice. Indicates controller misuse.
    #[error("fetch task already started")]
    AlreadyStarted,

    #[error("fetch failed: {0}")]
    FetchFailed(String),

    /// A completion arrived for a kind that is no longer waiting for one
    #[error("duplicate delivery for {0}")]
    DuplicateDelivery(CollectionKind),

    #[error("corrupt snapshot entry for {kind}: {reason}")]
    SnapshotCorrupt { kind: CollectionKind, reason: String },
}

impl FetchError {
    /// Build a `FetchFailed` from a remote error, keeping the context chain
    pub fn failed(err: &anyhow::Error) -> Self {
        FetchError::FetchFailed(format!("{:#}", err))
    }
}
