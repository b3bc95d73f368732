use std::fs;
use std::io;
use std::path::Path;

/// The filesystem calls whose failures change the course of the save protocol.
///
/// Everything else (creating temp files, reading, writing) goes straight to
/// `std::fs`; only rename and delete have fallbacks worth exercising.
pub trait FsOps {
    /// May fail across volumes; callers fall back to copying.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct OsFs;

impl FsOps for OsFs {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}

impl<T: FsOps + ?Sized> FsOps for &T {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        (**self).rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        (**self).remove_file(path)
    }
}
