use std::path::{Path, PathBuf};

pub const DEFAULT_STAGING_PREFIX: &str = "sheetdb";
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Settings for one run of the save protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistConfig {
    /// Where staging files are created. `None` means next to the target,
    /// which keeps the final rename on one volume.
    pub staging_dir: Option<PathBuf>,

    /// Where backups of the previous target are kept. `None` means next to the target.
    pub backup_dir: Option<PathBuf>,

    /// File name prefix for staging files
    pub staging_prefix: String,

    /// Buffer size for the copy fallback when rename is not possible
    pub chunk_size: usize,

    /// fsync staged, backed up and copied files before moving on
    pub sync: bool,

    /// Move the backup back onto the target if installing the new file fails
    pub restore_on_failure: bool,
}

impl PersistConfig {
    pub fn new() -> Self {
        Self {
            staging_dir: None,
            backup_dir: None,
            staging_prefix: DEFAULT_STAGING_PREFIX.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            sync: true,
            restore_on_failure: true,
        }
    }

    pub fn staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    pub fn backup_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.backup_dir = Some(dir.into());
        self
    }

    pub fn staging_prefix(mut self, prefix: &str) -> Self {
        self.staging_prefix = prefix.to_string();
        self
    }

    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    pub fn restore_on_failure(mut self, restore: bool) -> Self {
        self.restore_on_failure = restore;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be > 0".to_string());
        }

        if self.staging_prefix.contains(std::path::is_separator) {
            return Err("staging_prefix cannot contain a path separator".to_string());
        }

        Ok(())
    }

    pub(crate) fn resolve_staging_dir(&self, target: &Path) -> PathBuf {
        self.staging_dir
            .clone()
            .unwrap_or_else(|| parent_dir(target))
    }

    pub(crate) fn resolve_backup_dir(&self, target: &Path) -> PathBuf {
        self.backup_dir
            .clone()
            .unwrap_or_else(|| parent_dir(target))
    }
}

impl Default for PersistConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// `Path::parent` yields `""` for bare file names.
fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
