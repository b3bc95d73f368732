use std::path::PathBuf;
use thiserror::Error;

use crate::persistence::PersistenceError;

#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Failed to load sheet from '{}'", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Sheet file '{}' does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("Row {0} out of range (sheet has {1} rows)")]
    RowOutOfRange(usize, usize),

    #[error("Column '{0}' not found in header")]
    ColumnNotFound(String),

    #[error("Session is closed")]
    SessionClosed,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to persist sheet")]
    Persistence(#[from] PersistenceError),
}

pub type Result<T> = std::result::Result<T, SheetError>;
