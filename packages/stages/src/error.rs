// ABOUTME: Error types for stage operations

use rfpdesk_storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StageError {
    #[error("RFP {0} is archived and read-only")]
    ArchivedReadOnly(String),

    #[error("Invalid stage transition: {0}")]
    InvalidTransition(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type StageResult<T> = Result<T, StageError>;
