//! Crash-safe save protocol.
//!
//! A dirty document is written to a staging file, the current target is moved
//! to a backup, and the staging file is moved into place. The previous version
//! is never deleted before a copy of it exists elsewhere, and the backup is
//! kept after a successful save.

pub mod backup;
pub mod config;
pub mod dirty;
pub mod error;
pub mod fs_ops;
pub mod persister;
pub mod replace;
pub mod staging;

pub use backup::{BackupArtifact, BackupManager};
pub use config::PersistConfig;
pub use dirty::DirtyTracker;
pub use error::{BackupError, PersistenceError, ReplaceError, WriteError};
pub use fs_ops::{FsOps, OsFs};
pub use persister::{PersistPhase, PersistReport, Persister, persist};
pub use replace::{InstallOutcome, MoveMethod, ReplaceEngine, move_file};
pub use staging::{StagingArtifact, StagingWriter};
