//! File access used by the index: positional reads of immutable files
//! ([`ReadAt`]) and append-only writes that become durable on
//! [`seal`](SealingWrite::seal).

use std::{ops::Range, sync::Arc};

pub mod file;

pub use file::{FileReader, FileWriter};

/// Random-access view of an immutable file.
pub trait ReadAt: Send + Sync + 'static {
    fn size(&self) -> std::io::Result<u64>;

    /// Returns the bytes in `range`.
    ///
    /// The part of `range` past the end of the file is dropped, so the result is
    /// shorter than requested only at end-of-file.
    fn read_at(&self, range: Range<u64>) -> std::io::Result<Vec<u8>>;
}

/// Append-only writer that must be sealed to make its output durable.
///
/// Output of a writer dropped before `seal` is incomplete and should be deleted
/// by whoever created it.
pub trait SealingWrite: Send {
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()>;

    /// Flushes and syncs the output. No writes are accepted afterwards.
    fn seal(&mut self) -> std::io::Result<()>;
}

impl<T: ReadAt + ?Sized> ReadAt for Arc<T> {
    fn size(&self) -> std::io::Result<u64> {
        (**self).size()
    }

    fn read_at(&self, range: Range<u64>) -> std::io::Result<Vec<u8>> {
        (**self).read_at(range)
    }
}

impl<T: SealingWrite + ?Sized> SealingWrite for Box<T> {
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        (**self).write_all(buf)
    }

    fn seal(&mut self) -> std::io::Result<()> {
        (**self).seal()
    }
}
