use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::config::PersistConfig;
use super::error::BackupError;
use super::fs_ops::FsOps;
use super::replace::{MoveMethod, move_file};

/// The previous content of the target, moved aside before the overwrite.
///
/// Left on disk after a successful save as a recovery point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupArtifact {
    path: PathBuf,
    #[serde(flatten)]
    method: MoveMethod,
}

impl BackupArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// How the target got to the backup location.
    pub fn method(&self) -> MoveMethod {
        self.method
    }

    pub fn into_path(self) -> PathBuf {
        self.path
    }

    /// Move the backup back to `target`.
    pub fn restore<F: FsOps>(
        &self,
        ops: &F,
        target: &Path,
        chunk_size: usize,
        sync: bool,
    ) -> io::Result<MoveMethod> {
        move_file(ops, &self.path, target, chunk_size, sync)
    }
}

pub struct BackupManager<'a, F: FsOps> {
    ops: &'a F,
    config: &'a PersistConfig,
}

impl<'a, F: FsOps> BackupManager<'a, F> {
    pub fn new(ops: &'a F, config: &'a PersistConfig) -> Self {
        Self { ops, config }
    }

    /// Move the file at `target` to a fresh `<name>.XXXXXX.bkp`.
    ///
    /// Returns `None` when there is nothing at `target`. On error the target
    /// is where it was.
    pub fn backup(&self, target: &Path) -> Result<Option<BackupArtifact>, BackupError> {
        match fs::symlink_metadata(target) {
            Ok(_) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(BackupError::Inspect {
                    target: target.to_path_buf(),
                    source,
                });
            }
        }

        let name = target
            .file_name()
            .ok_or_else(|| BackupError::InvalidTarget(target.to_path_buf()))?;
        let mut prefix = name.to_os_string();
        prefix.push(".");

        let dir = self.config.resolve_backup_dir(target);
        let (handle, path) = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".bkp")
            .tempfile_in(&dir)
            .and_then(|file| file.keep().map_err(|err| err.error))
            .map_err(|source| BackupError::Reserve { dir, source })?;
        drop(handle);

        let method = match move_file(
            self.ops,
            target,
            &path,
            self.config.chunk_size,
            self.config.sync,
        ) {
            Ok(method) => method,
            Err(source) => {
                if let Err(err) = self.ops.remove_file(&path) {
                    debug!(path = %path.display(), error = %err, "Unable to remove unused backup file");
                }
                return Err(BackupError::Relocate {
                    target: target.to_path_buf(),
                    backup: path,
                    source,
                });
            }
        };

        if self.config.sync {
            sync_parent(&path);
        }

        info!(backup = %path.display(), target = %target.display(), "Created backup");
        Ok(Some(BackupArtifact { path, method }))
    }
}

/// Flush the directory entry of a freshly moved file. Not every platform
/// can open a directory, so failure is only noted.
fn sync_parent(path: &Path) {
    let Some(dir) = path.parent() else {
        return;
    };
    if let Err(err) = File::open(dir).and_then(|d| d.sync_all()) {
        debug!(dir = %dir.display(), error = %err, "Unable to sync directory");
    }
}
