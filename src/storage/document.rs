use std::io::{self, Write};

/// Anything the persistence protocol can write to disk.
///
/// The protocol never inspects the document; it only asks it to serialize
/// itself into the staging file.
pub trait Document {
    fn write_to(&self, out: &mut dyn Write) -> io::Result<()>;
}

impl<D: Document + ?Sized> Document for &D {
    fn write_to(&self, out: &mut dyn Write) -> io::Result<()> {
        (**self).write_to(out)
    }
}

/// Raw bytes, mostly useful for tooling and tests.
impl Document for [u8] {
    fn write_to(&self, out: &mut dyn Write) -> io::Result<()> {
        out.write_all(self)
    }
}

impl Document for Vec<u8> {
    fn write_to(&self, out: &mut dyn Write) -> io::Result<()> {
        out.write_all(self)
    }
}

impl Document for str {
    fn write_to(&self, out: &mut dyn Write) -> io::Result<()> {
        out.write_all(self.as_bytes())
    }
}
