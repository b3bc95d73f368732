pub mod config;

use crate::core::{Result, Row, SheetError, Value};
use crate::persistence::{DirtyTracker, FsOps, OsFs, PersistReport, Persister};
use crate::storage::Sheet;
use config::SessionConfig;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// An open sheet bound to the file it was loaded from.
///
/// Mutations only touch memory and mark the session dirty. The sheet is
/// written back once, when the session is closed (or explicitly saved), and
/// only if something changed.
///
/// # Examples
///
/// ```no_run
/// use sheetdb::{Session, SessionConfig, Value};
///
/// # fn main() -> sheetdb::Result<()> {
/// let mut session = Session::open("people.csv", SessionConfig::default())?;
/// session.append_row(vec![Value::from("Alice"), Value::from(30i64)])?;
/// session.close()?;
/// # Ok(())
/// # }
/// ```
pub struct Session<F: FsOps = OsFs> {
    sheet: Sheet,
    /// `None` for sessions that are never written back
    target: Option<PathBuf>,
    dirty: DirtyTracker,
    persister: Persister<F>,
    state: SessionState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Open,
    Closed,
}

impl Session<OsFs> {
    /// Open `path`, loading the sheet if the file exists.
    pub fn open(path: impl AsRef<Path>, config: SessionConfig) -> Result<Self> {
        Self::open_with_ops(path, config, OsFs)
    }

    /// A session over an in-memory sheet with nowhere to save to.
    pub fn detached(sheet: Sheet) -> Self {
        Self {
            sheet,
            target: None,
            dirty: DirtyTracker::new(),
            persister: Persister::default(),
            state: SessionState::Open,
        }
    }
}

impl<F: FsOps> Session<F> {
    /// Like [`Session::open`], with custom rename/delete primitives.
    pub fn open_with_ops(path: impl AsRef<Path>, config: SessionConfig, ops: F) -> Result<Self> {
        config.validate().map_err(SheetError::InvalidConfig)?;

        let path = path.as_ref();
        let sheet = if path.exists() {
            Sheet::load(path)?
        } else if config.create_if_missing {
            debug!(path = %path.display(), "Sheet file missing, starting empty");
            Sheet::default()
        } else {
            return Err(SheetError::NotFound(path.to_path_buf()));
        };

        Ok(Self {
            sheet,
            target: Some(path.to_path_buf()),
            dirty: DirtyTracker::new(),
            persister: Persister::with_ops(config.persist, ops),
            state: SessionState::Open,
        })
    }

    pub fn sheet(&self) -> &Sheet {
        &self.sheet
    }

    pub fn target(&self) -> Option<&Path> {
        self.target.as_deref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.is_dirty()
    }

    /// For changes made outside the session's own mutators.
    pub fn mark_dirty(&mut self) {
        self.dirty.mark_dirty();
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    pub fn set_header(&mut self, header: Vec<String>) -> Result<()> {
        self.ensure_open()?;
        self.sheet.set_header(header);
        self.dirty.mark_dirty();
        Ok(())
    }

    /// Appends a row and returns its index.
    pub fn append_row(&mut self, row: Row) -> Result<usize> {
        self.ensure_open()?;
        let index = self.sheet.push_row(row);
        self.dirty.mark_dirty();
        Ok(index)
    }

    /// Sets one cell and returns its previous value.
    pub fn set_cell(&mut self, row: usize, column: usize, value: Value) -> Result<Value> {
        self.ensure_open()?;
        let previous = self.sheet.set_cell(row, column, value)?;
        self.dirty.mark_dirty();
        Ok(previous)
    }

    pub fn delete_row(&mut self, row: usize) -> Result<Row> {
        self.ensure_open()?;
        let removed = self.sheet.remove_row(row)?;
        self.dirty.mark_dirty();
        Ok(removed)
    }

    /// Write the sheet back now if it changed. The session stays open.
    pub fn save(&mut self) -> Result<Option<PersistReport>> {
        self.ensure_open()?;
        self.persist()
    }

    /// Save if dirty, then close.
    ///
    /// Closing twice is a no-op. If saving fails the session stays open and
    /// dirty, so the caller can fix the cause and close again.
    pub fn close(&mut self) -> Result<Option<PersistReport>> {
        if self.state == SessionState::Closed {
            return Ok(None);
        }

        let report = self.persist()?;
        self.state = SessionState::Closed;
        Ok(report)
    }

    fn persist(&mut self) -> Result<Option<PersistReport>> {
        let Some(target) = self.target.as_deref() else {
            return Ok(None);
        };

        let report = self
            .persister
            .persist(&self.sheet, target, self.dirty.is_dirty())?;
        self.dirty.clear();
        Ok(report)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state == SessionState::Closed {
            return Err(SheetError::SessionClosed);
        }
        Ok(())
    }
}

impl<F: FsOps> Drop for Session<F> {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            error!(error = %err, "Failed to save sheet while dropping session");
        }
    }
}
