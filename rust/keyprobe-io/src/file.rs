use std::{
    fs::File,
    io::{BufWriter, ErrorKind, Write},
    ops::Range,
    path::Path,
};

use crate::{ReadAt, SealingWrite};

const WRITE_BUFFER_SIZE: usize = 256 * 1024;

/// Positional reader over a file that is no longer written to.
///
/// The size is taken once, when the reader is created.
pub struct FileReader {
    file: File,
    size: u64,
}

impl FileReader {
    pub fn new(file: File) -> std::io::Result<FileReader> {
        let size = file.metadata()?.len();
        Ok(FileReader { file, size })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> std::io::Result<FileReader> {
        FileReader::new(File::open(path)?)
    }

    /// Reads the whole file into memory.
    pub fn read_all(&self) -> std::io::Result<Vec<u8>> {
        self.read_at(0..self.size)
    }
}

impl ReadAt for FileReader {
    fn size(&self) -> std::io::Result<u64> {
        Ok(self.size)
    }

    fn read_at(&self, range: Range<u64>) -> std::io::Result<Vec<u8>> {
        if range.end < range.start {
            return Err(std::io::Error::new(
                ErrorKind::InvalidInput,
                format!("invalid read range {range:?}"),
            ));
        }
        let end = range.end.min(self.size);
        if range.start >= end {
            return Ok(Vec::new());
        }
        let mut buf = vec![0u8; (end - range.start) as usize];
        read_exact_at(&self.file, range.start, &mut buf)?;
        Ok(buf)
    }
}

/// Buffered writer over a newly created file; `seal` flushes and syncs it.
pub struct FileWriter {
    file: Option<BufWriter<File>>,
}

impl FileWriter {
    pub fn new(file: File) -> FileWriter {
        FileWriter {
            file: Some(BufWriter::with_capacity(WRITE_BUFFER_SIZE, file)),
        }
    }

    /// Creates the file at `path`, failing if it already exists.
    pub fn create<P: AsRef<Path>>(path: P) -> std::io::Result<FileWriter> {
        Ok(FileWriter::new(File::create_new(path)?))
    }

    fn sealed() -> std::io::Error {
        std::io::Error::other("writer is sealed")
    }
}

impl SealingWrite for FileWriter {
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.write_all(buf),
            None => Err(Self::sealed()),
        }
    }

    fn seal(&mut self) -> std::io::Result<()> {
        let file = self.file.take().ok_or_else(Self::sealed)?;
        file.into_inner()
            .map_err(|e| e.into_error())?
            .sync_all()
    }
}

#[cfg(unix)]
fn read_exact_at(file: &File, pos: u64, buf: &mut [u8]) -> std::io::Result<()> {
    std::os::unix::fs::FileExt::read_exact_at(file, buf, pos)
}

#[cfg(windows)]
fn read_exact_at(file: &File, mut pos: u64, mut buf: &mut [u8]) -> std::io::Result<()> {
    use std::os::windows::fs::FileExt;

    while !buf.is_empty() {
        let n = file.seek_read(buf, pos)?;
        if n == 0 {
            return Err(ErrorKind::UnexpectedEof.into());
        }
        buf = &mut buf[n..];
        pos += n as u64;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_ranges() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("data.bin");
        let mut writer = FileWriter::create(&path).unwrap();
        for chunk in 0u8..16 {
            writer.write_all(&[chunk; 4]).unwrap();
        }
        writer.seal().unwrap();

        let reader = FileReader::open(&path).unwrap();
        assert_eq!(reader.size().unwrap(), 64);
        assert_eq!(reader.read_at(8..12).unwrap(), vec![2; 4]);
        assert_eq!(reader.read_at(62..100).unwrap(), vec![15; 2]);
        assert!(reader.read_at(64..70).unwrap().is_empty());
        assert!(reader.read_at(5..5).unwrap().is_empty());
        #[allow(clippy::reversed_empty_ranges)]
        let err = reader.read_at(9..3).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(reader.read_all().unwrap().len(), 64);
    }

    #[test]
    fn test_writer_is_exclusive_and_sealed_once() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("once.bin");
        let mut writer = FileWriter::create(&path).unwrap();
        writer.write_all(b"x").unwrap();
        writer.seal().unwrap();
        assert!(writer.write_all(b"y").is_err());
        assert!(writer.seal().is_err());
        assert!(FileWriter::create(&path).is_err());
        assert_eq!(std::fs::read(&path).unwrap(), b"x");
    }
}
