use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::PersistPhase;

/// Serializing the document into a staging file failed. Nothing destructive has happened yet.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Failed to create staging file in '{}'", .dir.display())]
    Create {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write document to staging file '{}'", .path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The previous target could not be preserved. The target is untouched.
#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Failed to inspect target '{}'", .target.display())]
    Inspect {
        target: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Target '{}' has no file name", .0.display())]
    InvalidTarget(PathBuf),

    #[error("Failed to reserve a backup file in '{}'", .dir.display())]
    Reserve {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to move '{}' to backup '{}'", .target.display(), .backup.display())]
    Relocate {
        target: PathBuf,
        backup: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Installing the staged file failed. The staged file is left on disk.
#[derive(Error, Debug)]
pub enum ReplaceError {
    #[error("Failed to install '{}' at '{}'", .staged.display(), .target.display())]
    Install {
        staged: PathBuf,
        target: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The stale target could not be deleted and the move failed afterwards.
    #[error(
        "Failed to remove stale '{}' ({}) and then to install '{}'",
        .target.display(),
        .delete_error,
        .staged.display()
    )]
    StaleTarget {
        staged: PathBuf,
        target: PathBuf,
        delete_error: io::Error,
        #[source]
        source: io::Error,
    },
}

impl ReplaceError {
    /// Location of the new content that could not be installed.
    pub fn staged(&self) -> &Path {
        match self {
            Self::Install { staged, .. } | Self::StaleTarget { staged, .. } => staged,
        }
    }
}

/// Terminal outcome of a failed save, carrying the underlying cause.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Failed to stage document; target left untouched")]
    Write(#[from] WriteError),

    #[error("Failed to back up target; target left untouched")]
    Backup(#[from] BackupError),

    #[error("Failed to replace target; {}", restore_note(.restored, .backup))]
    Replace {
        #[source]
        source: ReplaceError,
        backup: Option<PathBuf>,
        restored: bool,
    },
}

impl PersistenceError {
    /// The last phase entered before the run aborted, not the step that
    /// failed. `BackedUp` is only entered once the backup exists, so a
    /// backup failure reports `Staging`.
    pub fn phase(&self) -> PersistPhase {
        match self {
            Self::Write(_) => PersistPhase::Staging,
            Self::Backup(_) => PersistPhase::Staging,
            Self::Replace { .. } => PersistPhase::BackedUp,
        }
    }

    /// Backup left on disk by a failed replace, if one is still there.
    pub fn backup(&self) -> Option<&Path> {
        match self {
            Self::Replace {
                backup: Some(path),
                restored: false,
                ..
            } => Some(path),
            _ => None,
        }
    }
}

fn restore_note(restored: &bool, backup: &Option<PathBuf>) -> String {
    match (restored, backup) {
        (true, _) => "previous version restored".to_string(),
        (false, Some(path)) => format!("previous version kept at '{}'", path.display()),
        (false, None) => "no previous version existed".to_string(),
    }
}
