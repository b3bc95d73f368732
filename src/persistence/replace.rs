//! Installing a staged file at its target path.
//!
//! [`move_file`] is the primitive shared with the backup step: an atomic rename
//! when the filesystem allows it, otherwise a counted copy followed by removal
//! of the source.

use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Read, Write};
use std::path::Path;
use tracing::warn;

use super::error::ReplaceError;
use super::fs_ops::FsOps;
use super::staging::StagingArtifact;

/// How a file got from one path to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum MoveMethod {
    Renamed,
    Copied { bytes: u64 },
}

/// Move `from` to `to`, falling back to a copy when rename fails.
///
/// The source is removed only after every byte has been copied. A failed
/// removal of the source after a complete copy is reported as an error; the
/// destination then already holds the full content.
pub fn move_file<F: FsOps>(
    ops: &F,
    from: &Path,
    to: &Path,
    chunk_size: usize,
    sync: bool,
) -> io::Result<MoveMethod> {
    let rename_err = match ops.rename(from, to) {
        Ok(()) => return Ok(MoveMethod::Renamed),
        Err(err) => err,
    };

    warn!(
        from = %from.display(),
        to = %to.display(),
        error = %rename_err,
        "Unable to rename file, performing full copy of data"
    );

    let bytes = copy_file(from, to, chunk_size, sync)?;
    ops.remove_file(from)?;
    Ok(MoveMethod::Copied { bytes })
}

/// Copy the whole of `from` into `to` (created or truncated) and return the byte count.
pub fn copy_file(from: &Path, to: &Path, chunk_size: usize, sync: bool) -> io::Result<u64> {
    let mut source = File::open(from)?;
    let total = source.metadata()?.len();
    write_copy(&mut source, total, to, chunk_size, sync)
}

/// Write exactly `total` bytes of `source` to `to`.
///
/// A partially written `to` is removed on failure, so it never holds a
/// truncated copy.
fn write_copy<R: Read + ?Sized>(
    source: &mut R,
    total: u64,
    to: &Path,
    chunk_size: usize,
    sync: bool,
) -> io::Result<u64> {
    let mut destination = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(to)?;

    let result = transfer(source, &mut destination, total, chunk_size).and_then(|copied| {
        if sync {
            destination.sync_all()?;
        }
        Ok(copied)
    });

    if result.is_err() {
        drop(destination);
        match fs::remove_file(to) {
            Ok(()) => warn!(path = %to.display(), "Removed partially copied file"),
            Err(err) => warn!(
                path = %to.display(),
                error = %err,
                "Unable to remove partially copied file"
            ),
        }
    }
    result
}

/// Pump exactly `total` bytes from `source` to `destination`.
///
/// A single read may return fewer bytes than asked for, so the count is
/// accumulated until it reaches `total`. A read of zero bytes before that
/// means the source shrank underneath us and is an error rather than a spin.
pub fn transfer<R, W>(
    source: &mut R,
    destination: &mut W,
    total: u64,
    chunk_size: usize,
) -> io::Result<u64>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut copied: u64 = 0;

    while copied < total {
        let want = (total - copied).min(buf.len() as u64) as usize;
        let n = match source.read(&mut buf[..want]) {
            Ok(0) => {
                return Err(io::Error::new(
                    ErrorKind::UnexpectedEof,
                    format!("source ended after {} of {} bytes", copied, total),
                ));
            }
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        destination.write_all(&buf[..n])?;
        copied += n as u64;
    }

    destination.flush()?;
    Ok(copied)
}

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallOutcome {
    #[serde(flatten)]
    pub method: MoveMethod,
    /// A stale file was still at the target and got deleted first
    pub removed_stale: bool,
}

pub struct ReplaceEngine<'a, F: FsOps> {
    ops: &'a F,
    chunk_size: usize,
    sync: bool,
}

impl<'a, F: FsOps> ReplaceEngine<'a, F> {
    pub fn new(ops: &'a F, chunk_size: usize, sync: bool) -> Self {
        Self {
            ops,
            chunk_size,
            sync,
        }
    }

    /// Put the staged file at `target`.
    ///
    /// A target that cannot be deleted is only a warning; the move may still
    /// overwrite it. If the move then fails too, both causes are reported as
    /// [`ReplaceError::StaleTarget`]. On any failure the staged file is kept.
    pub fn install(
        &self,
        staging: StagingArtifact,
        target: &Path,
    ) -> Result<InstallOutcome, ReplaceError> {
        let mut removed_stale = false;
        let mut delete_error = None;

        match self.ops.remove_file(target) {
            Ok(()) => removed_stale = true,
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => {
                warn!(
                    target = %target.display(),
                    error = %err,
                    "Unable to delete file, you may lose the results"
                );
                delete_error = Some(err);
            }
        }

        match move_file(self.ops, staging.path(), target, self.chunk_size, self.sync) {
            Ok(method) => {
                staging.consume();
                Ok(InstallOutcome {
                    method,
                    removed_stale,
                })
            }
            Err(source) => {
                let staged = staging.retain();
                let target = target.to_path_buf();
                Err(match delete_error {
                    Some(delete_error) => ReplaceError::StaleTarget {
                        staged,
                        target,
                        delete_error,
                        source,
                    },
                    None => ReplaceError::Install {
                        staged,
                        target,
                        source,
                    },
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::OsFs;
    use crate::persistence::staging::StagingWriter;
    use crate::persistence::PersistConfig;
    use std::fs;
    use tempfile::TempDir;
    use tracing_test::traced_test;

    /// Rename always fails, as it does across mount points.
    struct NoRename;

    impl FsOps for NoRename {
        fn rename(&self, _from: &Path, _to: &Path) -> io::Result<()> {
            Err(io::Error::other("Invalid cross-device link"))
        }

        fn remove_file(&self, path: &Path) -> io::Result<()> {
            fs::remove_file(path)
        }
    }

    /// Neither rename nor delete work.
    struct Stuck;

    impl FsOps for Stuck {
        fn rename(&self, _from: &Path, _to: &Path) -> io::Result<()> {
            Err(io::Error::other("rename refused"))
        }

        fn remove_file(&self, _path: &Path) -> io::Result<()> {
            Err(io::Error::new(ErrorKind::PermissionDenied, "delete refused"))
        }
    }

    /// Hands out at most `step` bytes per read.
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
        reads: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.reads += 1;
            let n = self.step.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    fn stage(dir: &Path, target: &Path, content: &str) -> StagingArtifact {
        let config = PersistConfig::new().staging_dir(dir);
        StagingWriter::new(&config).stage(content, target).unwrap()
    }

    #[test]
    fn test_transfer_accumulates_short_reads() {
        let data = b"A,B\n3,4\n";
        let mut source = Trickle {
            data,
            step: 3,
            reads: 0,
        };
        let mut out = Vec::new();

        let copied = transfer(&mut source, &mut out, data.len() as u64, 1024).unwrap();

        assert_eq!(copied, 8);
        assert_eq!(out, data);
        assert_eq!(source.reads, 3);
    }

    #[test]
    fn test_transfer_respects_chunk_size() {
        let data = vec![7u8; 1000];
        let mut out = Vec::new();
        let copied = transfer(&mut data.as_slice(), &mut out, 1000, 64).unwrap();
        assert_eq!(copied, 1000);
        assert_eq!(out, data);
    }

    #[test]
    fn test_transfer_fails_when_source_shrinks() {
        let data = b"short";
        let mut out = Vec::new();
        let err = transfer(&mut data.as_slice(), &mut out, 10, 4).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
        assert_eq!(out, data);
    }

    #[traced_test]
    #[test]
    fn test_short_copy_removes_destination() {
        let dir = TempDir::new().unwrap();
        let to = dir.path().join("book.csv");
        let data = vec![b'x'; 100];

        // Source claims more bytes than it delivers
        let err = write_copy(&mut data.as_slice(), 1000, &to, 16, false).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
        assert!(!to.exists());
        assert!(logs_contain("Removed partially copied file"));
    }

    #[test]
    fn test_short_copy_over_existing_file() {
        let dir = TempDir::new().unwrap();
        let to = dir.path().join("book.csv");
        fs::write(&to, "A,B\n1,2\n").unwrap();
        let mut source = Trickle {
            data: b"A,B\n3",
            step: 2,
            reads: 0,
        };

        assert!(write_copy(&mut source, 8, &to, 4, true).is_err());
        assert!(!to.exists());
        assert!(source.reads > 1);
    }

    #[test]
    fn test_move_file_renames() {
        let dir = TempDir::new().unwrap();
        let from = dir.path().join("a.csv");
        let to = dir.path().join("b.csv");
        fs::write(&from, "x").unwrap();

        let method = move_file(&OsFs, &from, &to, 16, false).unwrap();

        assert_eq!(method, MoveMethod::Renamed);
        assert!(!from.exists());
        assert_eq!(fs::read_to_string(&to).unwrap(), "x");
    }

    #[traced_test]
    #[test]
    fn test_move_file_copies_when_rename_fails() {
        let dir = TempDir::new().unwrap();
        let from = dir.path().join("a.csv");
        let to = dir.path().join("b.csv");
        let content = "row\n".repeat(100);
        fs::write(&from, &content).unwrap();
        fs::write(&to, "old content that is longer than nothing").unwrap();

        let method = move_file(&NoRename, &from, &to, 7, true).unwrap();

        assert_eq!(
            method,
            MoveMethod::Copied {
                bytes: content.len() as u64
            }
        );
        assert!(!from.exists());
        assert_eq!(fs::read_to_string(&to).unwrap(), content);
        assert!(logs_contain("Unable to rename file"));
    }

    #[test]
    fn test_move_file_keeps_source_when_copy_fails() {
        let dir = TempDir::new().unwrap();
        let from = dir.path().join("a.csv");
        fs::write(&from, "keep me").unwrap();
        let to = dir.path().join("missing-dir").join("b.csv");

        assert!(move_file(&NoRename, &from, &to, 16, false).is_err());
        assert_eq!(fs::read_to_string(&from).unwrap(), "keep me");
    }

    #[test]
    fn test_install_over_missing_target() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("book.csv");
        let staging = stage(dir.path(), &target, "A,B\n3,4\n");
        let staged_path = staging.path().to_path_buf();

        let outcome = ReplaceEngine::new(&OsFs, 16, false)
            .install(staging, &target)
            .unwrap();

        assert_eq!(outcome.method, MoveMethod::Renamed);
        assert!(!outcome.removed_stale);
        assert!(!staged_path.exists());
        assert_eq!(fs::read_to_string(&target).unwrap(), "A,B\n3,4\n");
    }

    #[test]
    fn test_install_removes_stale_target() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("book.csv");
        fs::write(&target, "stale").unwrap();
        let staging = stage(dir.path(), &target, "fresh");

        let outcome = ReplaceEngine::new(&NoRename, 2, false)
            .install(staging, &target)
            .unwrap();

        assert!(outcome.removed_stale);
        assert_eq!(outcome.method, MoveMethod::Copied { bytes: 5 });
        assert_eq!(fs::read_to_string(&target).unwrap(), "fresh");
    }

    #[traced_test]
    #[test]
    fn test_install_reports_failed_delete_and_move() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("book.csv");
        // A directory at the target makes the fallback copy fail
        fs::create_dir(&target).unwrap();
        let staging = stage(dir.path(), &target, "fresh");

        let err = ReplaceEngine::new(&Stuck, 16, false)
            .install(staging, &target)
            .unwrap_err();

        assert!(matches!(err, ReplaceError::StaleTarget { .. }));
        assert!(logs_contain("Unable to delete file"));
        // New content is not lost
        assert_eq!(fs::read_to_string(err.staged()).unwrap(), "fresh");
    }

    #[test]
    fn test_install_error_without_delete_failure() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("no-such-dir").join("book.csv");
        let staging = stage(dir.path(), &target, "fresh");

        let err = ReplaceEngine::new(&NoRename, 16, false)
            .install(staging, &target)
            .unwrap_err();

        assert!(matches!(err, ReplaceError::Install { .. }));
        assert!(err.staged().exists());
    }
}
