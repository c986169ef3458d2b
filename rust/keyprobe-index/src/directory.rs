//! Flat file-system directory holding the files of one index.

use std::{
    fs::File,
    path::{Path, PathBuf},
};

use keyprobe_common::{Result, error::Error};
use keyprobe_io::{FileReader, FileWriter};

/// Name of the lock file held by an open index writer.
pub const WRITE_LOCK_NAME: &str = "write.lock";

#[derive(Debug, Clone)]
pub struct FsDirectory {
    path: PathBuf,
}

impl FsDirectory {
    /// Opens the directory at `path`, creating it (and its parents) when missing.
    pub fn open(path: impl AsRef<Path>) -> Result<FsDirectory> {
        let path = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&path)
            .map_err(|e| Error::io(format!("create directory {}", path.display()), e))?;
        Ok(FsDirectory { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_path(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Lists the regular files in the directory, sorted by name.
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(&self.path)
            .map_err(|e| Error::io(format!("list {}", self.path.display()), e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(format!("list {}", self.path.display()), e))?;
            let file_type = entry
                .file_type()
                .map_err(|e| Error::io(format!("stat {}", entry.path().display()), e))?;
            if file_type.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.file_path(name).is_file()
    }

    /// Creates a new file for writing. Fails if the file already exists.
    pub fn create_output(&self, name: &str) -> Result<FileWriter> {
        let path = self.file_path(name);
        FileWriter::create(&path).map_err(|e| Error::io(format!("create {}", path.display()), e))
    }

    pub fn open_input(&self, name: &str) -> Result<FileReader> {
        let path = self.file_path(name);
        FileReader::open(&path).map_err(|e| Error::io(format!("open {}", path.display()), e))
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        let path = self.file_path(name);
        std::fs::remove_file(&path).map_err(|e| Error::io(format!("delete {}", path.display()), e))
    }

    /// Total size of the files in the directory.
    pub fn size_in_bytes(&self) -> Result<u64> {
        let mut total = 0;
        for name in self.list()? {
            let path = self.file_path(&name);
            let metadata = std::fs::metadata(&path)
                .map_err(|e| Error::io(format!("stat {}", path.display()), e))?;
            total += metadata.len();
        }
        Ok(total)
    }

    /// Acquires the exclusive write lock of this directory.
    pub fn obtain_write_lock(&self) -> Result<WriteLock> {
        let path = self.file_path(WRITE_LOCK_NAME);
        match File::create_new(&path) {
            Ok(_) => Ok(WriteLock { path }),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Err(
                Error::invalid_operation(format!("write lock already held: {}", path.display())),
            ),
            Err(e) => Err(Error::io(format!("create {}", path.display()), e)),
        }
    }
}

/// Exclusive writer lock over an index directory; released when dropped.
#[derive(Debug)]
pub struct WriteLock {
    path: PathBuf,
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            log::warn!("failed to release {}: {e}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyprobe_io::{ReadAt, SealingWrite};

    #[test]
    fn test_directory_files() {
        let tempdir = tempfile::tempdir().unwrap();
        let dir = FsDirectory::open(tempdir.path().join("nested").join("index")).unwrap();
        assert!(dir.list().unwrap().is_empty());

        let mut out = dir.create_output("a.bin").unwrap();
        out.write_all(b"0123456789").unwrap();
        out.seal().unwrap();
        assert!(dir.exists("a.bin"));
        assert!(dir.create_output("a.bin").is_err());
        assert_eq!(dir.size_in_bytes().unwrap(), 10);

        let input = dir.open_input("a.bin").unwrap();
        assert_eq!(input.read_at(2..5).unwrap().as_slice(), b"234");

        dir.delete("a.bin").unwrap();
        assert!(!dir.exists("a.bin"));
        assert!(dir.delete("a.bin").is_err());
    }

    #[test]
    fn test_write_lock_is_exclusive() {
        let tempdir = tempfile::tempdir().unwrap();
        let dir = FsDirectory::open(tempdir.path()).unwrap();
        let lock = dir.obtain_write_lock().unwrap();
        assert!(dir.exists(WRITE_LOCK_NAME));
        assert!(dir.obtain_write_lock().is_err());
        drop(lock);
        assert!(!dir.exists(WRITE_LOCK_NAME));
        let _lock = dir.obtain_write_lock().unwrap();
    }
}
