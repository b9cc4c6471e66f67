// ABOUTME: Error types for snapshot composition

use rfpdesk_scoring::ScoringError;
use rfpdesk_storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;
