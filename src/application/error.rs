use std::path::PathBuf;

use thiserror::Error;

use crate::domain::{ImportValidationError, ValidationError};
use crate::io::{ParseError, SnapshotError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid transaction: {0}")]
    Validation(#[from] ValidationError),

    #[error("Import rejected: {0}")]
    ImportValidation(#[from] ImportValidationError),

    #[error("Could not read snapshot: {0}")]
    Parse(#[from] ParseError),

    #[error("Ledger file already exists: {}", .0.display())]
    LedgerExists(PathBuf),

    #[error("Ledger file not found: {} (run `outlay init` first)", .0.display())]
    LedgerNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<SnapshotError> for AppError {
    fn from(err: SnapshotError) -> Self {
        match err {
            SnapshotError::Parse(e) => AppError::Parse(e),
            SnapshotError::Invalid(e) => AppError::ImportValidation(e),
        }
    }
}
