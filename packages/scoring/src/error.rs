// ABOUTME: Error types for scoring and supplier response operations

use rfpdesk_core::VersionedError;
use rfpdesk_storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("RFP {0} is archived and read-only")]
    ArchivedReadOnly(String),

    #[error("Scorecard {scorecard} is missing factor {factor}")]
    MissingFactor {
        scorecard: &'static str,
        factor: &'static str,
    },

    #[error(transparent)]
    Versioned(#[from] VersionedError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<serde_json::Error> for ScoringError {
    fn from(err: serde_json::Error) -> Self {
        Self::Storage(StorageError::Json(err))
    }
}

pub type ScoringResult<T> = Result<T, ScoringError>;
