use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::{debug, warn};

use super::config::PersistConfig;
use super::error::WriteError;
use crate::storage::Document;

/// A fully written temporary file holding the new document.
///
/// Dropping it unconsumed deletes the file.
#[derive(Debug)]
pub struct StagingArtifact {
    path: TempPath,
    len: u64,
}

impl StagingArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The file has been moved away; nothing is left to clean up.
    pub(crate) fn consume(self) {
        let _ = self.path.keep();
    }

    /// Keep the file on disk and hand back its location.
    pub(crate) fn retain(self) -> PathBuf {
        let path = self.path.to_path_buf();
        if let Err(err) = self.path.keep() {
            warn!(path = %path.display(), error = %err.error, "Unable to retain staged file");
        }
        path
    }
}

pub struct StagingWriter<'a> {
    config: &'a PersistConfig,
}

impl<'a> StagingWriter<'a> {
    pub fn new(config: &'a PersistConfig) -> Self {
        Self { config }
    }

    /// Serialize `document` into a fresh temp file next to where `target` will live.
    pub fn stage<D: Document + ?Sized>(
        &self,
        document: &D,
        target: &Path,
    ) -> Result<StagingArtifact, WriteError> {
        let dir = self.config.resolve_staging_dir(target);
        let mut file = tempfile::Builder::new()
            .prefix(&self.config.staging_prefix)
            .suffix(".tmp")
            .tempfile_in(&dir)
            .map_err(|source| WriteError::Create { dir, source })?;

        // On error `file` is dropped here, which removes the partial write
        let len = write_document(document, file.as_file_mut(), self.config.sync).map_err(
            |source| WriteError::Serialize {
                path: file.path().to_path_buf(),
                source,
            },
        )?;

        let path = file.into_temp_path();
        debug!(path = %path.display(), bytes = len, "Staged document");
        Ok(StagingArtifact { path, len })
    }
}

fn write_document<D: Document + ?Sized>(
    document: &D,
    file: &mut File,
    sync: bool,
) -> io::Result<u64> {
    {
        let mut writer = BufWriter::new(&mut *file);
        document.write_to(&mut writer)?;
        writer.flush()?;
    }
    if sync {
        file.sync_all()?;
    }
    Ok(file.metadata()?.len())
}
