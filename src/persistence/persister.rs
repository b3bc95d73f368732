use serde::Serialize;
use std::error::Error as _;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, info_span};

use super::backup::{BackupArtifact, BackupManager};
use super::config::PersistConfig;
use super::error::PersistenceError;
use super::fs_ops::{FsOps, OsFs};
use super::replace::{InstallOutcome, ReplaceEngine};
use super::staging::StagingWriter;
use crate::storage::Document;

/// Where a save run stands. Any failure moves it to `Aborted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistPhase {
    Clean,
    Staging,
    BackedUp,
    Replaced,
    Aborted,
}

/// What a successful save did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistReport {
    pub target: PathBuf,
    pub staged_bytes: u64,
    /// `None` if nothing existed at the target beforehand
    pub backup: Option<BackupArtifact>,
    pub install: InstallOutcome,
}

/// Runs the save protocol: stage, back up, replace.
#[derive(Debug, Clone)]
pub struct Persister<F: FsOps = OsFs> {
    config: PersistConfig,
    ops: F,
}

impl Persister<OsFs> {
    pub fn new(config: PersistConfig) -> Self {
        Self::with_ops(config, OsFs)
    }
}

impl Default for Persister<OsFs> {
    fn default() -> Self {
        Self::new(PersistConfig::default())
    }
}

impl<F: FsOps> Persister<F> {
    pub fn with_ops(config: PersistConfig, ops: F) -> Self {
        Self { config, ops }
    }

    /// Write `document` to `target` without ever leaving the previous version
    /// unrecoverable.
    ///
    /// Returns `Ok(None)` without touching the filesystem when `dirty` is false.
    pub fn persist<D: Document + ?Sized>(
        &self,
        document: &D,
        target: &Path,
        dirty: bool,
    ) -> Result<Option<PersistReport>, PersistenceError> {
        if !dirty {
            enter_phase(PersistPhase::Clean);
            debug!(target = %target.display(), "Document is clean, nothing to persist");
            return Ok(None);
        }

        let span = info_span!("persist", target = %target.display());
        let _enter = span.enter();

        match self.run(document, target) {
            Ok(report) => Ok(Some(report)),
            Err(err) => {
                report_failure(&err);
                Err(err)
            }
        }
    }

    fn run<D: Document + ?Sized>(
        &self,
        document: &D,
        target: &Path,
    ) -> Result<PersistReport, PersistenceError> {
        enter_phase(PersistPhase::Staging);
        let staging = StagingWriter::new(&self.config).stage(document, target)?;
        let staged_bytes = staging.len();

        // A backup failure drops `staging`, which deletes it
        let backup = BackupManager::new(&self.ops, &self.config).backup(target)?;
        enter_phase(PersistPhase::BackedUp);

        let engine = ReplaceEngine::new(&self.ops, self.config.chunk_size, self.config.sync);
        let install = match engine.install(staging, target) {
            Ok(install) => install,
            Err(source) => {
                let restored = self.restore(backup.as_ref(), target);
                return Err(PersistenceError::Replace {
                    source,
                    backup: backup.map(BackupArtifact::into_path),
                    restored,
                });
            }
        };
        enter_phase(PersistPhase::Replaced);

        Ok(PersistReport {
            target: target.to_path_buf(),
            staged_bytes,
            backup,
            install,
        })
    }

    fn restore(&self, backup: Option<&BackupArtifact>, target: &Path) -> bool {
        let Some(backup) = backup else {
            return false;
        };
        if !self.config.restore_on_failure {
            return false;
        }

        match backup.restore(&self.ops, target, self.config.chunk_size, self.config.sync) {
            Ok(_) => {
                info!(backup = %backup.path().display(), "Restored previous version");
                true
            }
            Err(err) => {
                error!(
                    backup = %backup.path().display(),
                    error = %err,
                    "Unable to restore previous version, recover it from the backup"
                );
                false
            }
        }
    }
}

/// Persist with default settings.
pub fn persist<D: Document + ?Sized>(
    document: &D,
    target: &Path,
    dirty: bool,
) -> Result<Option<PersistReport>, PersistenceError> {
    Persister::default().persist(document, target, dirty)
}

fn enter_phase(phase: PersistPhase) {
    debug!(?phase, "Persist phase");
}

fn report_failure(err: &PersistenceError) {
    enter_phase(PersistPhase::Aborted);

    let mut causes = Vec::new();
    let mut source = err.source();
    while let Some(cause) = source {
        causes.push(cause.to_string());
        source = cause.source();
    }

    error!(
        reached = ?err.phase(),
        error = %err,
        cause = %causes.join(": "),
        "Persist aborted"
    );
}
