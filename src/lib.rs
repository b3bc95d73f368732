// ============================================================================
// sheetdb Library
// ============================================================================

pub mod core;
pub mod persistence;
pub mod session;
pub mod storage;

// Re-export main types for convenience
pub use core::{Result, Row, SheetError, Value};
pub use persistence::{
    DirtyTracker, FsOps, MoveMethod, OsFs, PersistConfig, PersistReport, PersistenceError,
    Persister, persist,
};
pub use session::{Session, config::SessionConfig};
pub use storage::{Document, Sheet};
