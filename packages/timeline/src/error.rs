// ABOUTME: Error types for timeline ticks

use rfpdesk_storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TimelineError {
    #[error("RFP {0} is archived and read-only")]
    ArchivedReadOnly(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<sqlx::Error> for TimelineError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(StorageError::Sqlx(err))
    }
}

impl From<serde_json::Error> for TimelineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Storage(StorageError::Json(err))
    }
}

pub type TimelineResult<T> = Result<T, TimelineError>;
