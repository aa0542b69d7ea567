//! File-backed byte store

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::{closed_error, ByteStore};

/// A `ByteStore` over a regular file
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    /// `None` once closed
    file: Option<File>,
}

impl FileStore {
    /// Open (or create) a file, keeping any existing content
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)?;

        Ok(Self {
            path,
            file: Some(file),
        })
    }

    /// Create a file, truncating any existing content
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(true)
            .open(&path)?;

        Ok(Self {
            path,
            file: Some(file),
        })
    }

    /// Path of the underlying file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file(&mut self) -> io::Result<&mut File> {
        self.file.as_mut().ok_or_else(closed_error)
    }
}

impl ByteStore for FileStore {
    fn seek(&mut self, offset: u64) -> io::Result<()> {
        self.file()?.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    fn position(&mut self) -> io::Result<u64> {
        self.file()?.stream_position()
    }

    fn len(&mut self) -> io::Result<u64> {
        Ok(self.file()?.metadata()?.len())
    }

    fn set_len(&mut self, len: u64) -> io::Result<()> {
        self.file()?.set_len(len)
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.file()?.read_exact(buf)
    }

    fn write_bytes(&mut self, buf: &[u8]) -> io::Result<()> {
        self.file()?.write_all(buf)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.file()?.sync_data()
    }

    fn close(&mut self) -> io::Result<()> {
        let file = self.file.take().ok_or_else(closed_error)?;
        file.sync_all()
    }
}
