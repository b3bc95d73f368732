use std::collections::HashMap;
use std::path::PathBuf;

use crate::persistence::PersistConfig;

/// Session configuration
///
/// Settings can be given with the builder methods or read from a flat
/// key/value map (see [`SessionConfig::from_properties`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Start with an empty sheet when the file does not exist yet
    pub create_if_missing: bool,

    /// Settings for saving the sheet on close
    pub persist: PersistConfig,
}

impl SessionConfig {
    pub fn new() -> Self {
        Self {
            create_if_missing: true,
            persist: PersistConfig::default(),
        }
    }

    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    pub fn backup_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.persist = self.persist.backup_dir(dir);
        self
    }

    pub fn staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.persist = self.persist.staging_dir(dir);
        self
    }

    pub fn chunk_size(mut self, size: usize) -> Self {
        self.persist = self.persist.chunk_size(size);
        self
    }

    pub fn sync(mut self, sync: bool) -> Self {
        self.persist = self.persist.sync(sync);
        self
    }

    pub fn restore_on_failure(mut self, restore: bool) -> Self {
        self.persist = self.persist.restore_on_failure(restore);
        self
    }

    /// Read settings from string properties.
    ///
    /// Recognized keys: `create_if_missing`, `backup_dir`, `staging_dir`,
    /// `staging_prefix`, `chunk_size`, `sync`, `restore_on_failure`. Missing
    /// keys keep their defaults; unknown keys are ignored.
    pub fn from_properties(props: &HashMap<String, String>) -> Result<Self, String> {
        let defaults = Self::new();
        let mut persist = defaults.persist;

        if let Some(dir) = props.get("backup_dir") {
            persist = persist.backup_dir(dir);
        }
        if let Some(dir) = props.get("staging_dir") {
            persist = persist.staging_dir(dir);
        }
        if let Some(prefix) = props.get("staging_prefix") {
            persist = persist.staging_prefix(prefix);
        }
        let chunk_size = get_parsed(props, "chunk_size", persist.chunk_size)?;
        let sync = get_parsed(props, "sync", persist.sync)?;
        let restore = get_parsed(props, "restore_on_failure", persist.restore_on_failure)?;
        persist = persist
            .chunk_size(chunk_size)
            .sync(sync)
            .restore_on_failure(restore);

        let config = Self {
            create_if_missing: get_parsed(props, "create_if_missing", defaults.create_if_missing)?,
            persist,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        self.persist.validate()
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn get_parsed<T: std::str::FromStr>(
    props: &HashMap<String, String>,
    key: &str,
    default: T,
) -> Result<T, String> {
    match props.get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| format!("Invalid value '{}' for '{}'", raw, key)),
        None => Ok(default),
    }
}
