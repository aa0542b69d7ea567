use std::io;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{closed_error, ByteStore};

/// An in-memory byte store.
///
/// Clones share the same buffer but keep their own position and closed flag,
/// so a test can hand one handle to an engine and keep another to inspect,
/// corrupt, or reopen the same bytes.
#[derive(Clone, Debug, Default)]
pub struct MemStore {
    data: Arc<Mutex<Vec<u8>>>,
    position: u64,
    closed: bool,
}

impl MemStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `data`
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self {
            data: Arc::new(Mutex::new(data)),
            position: 0,
            closed: false,
        }
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> Vec<u8> {
        self.data.lock().clone()
    }

    fn check_open(&self) -> io::Result<()> {
        if self.closed {
            return Err(closed_error());
        }
        Ok(())
    }
}

impl ByteStore for MemStore {
    fn seek(&mut self, offset: u64) -> io::Result<()> {
        self.check_open()?;
        self.position = offset;
        Ok(())
    }

    fn position(&mut self) -> io::Result<u64> {
        self.check_open()?;
        Ok(self.position)
    }

    fn len(&mut self) -> io::Result<u64> {
        self.check_open()?;
        Ok(self.data.lock().len() as u64)
    }

    fn set_len(&mut self, len: u64) -> io::Result<()> {
        self.check_open()?;
        let len = usize::try_from(len).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "length exceeds address space")
        })?;
        self.data.lock().resize(len, 0);
        Ok(())
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.check_open()?;
        let data = self.data.lock();
        let start = self.position as usize;
        let end = start.checked_add(buf.len()).filter(|&end| end <= data.len());

        match end {
            Some(end) => {
                buf.copy_from_slice(&data[start..end]);
                self.position = end as u64;
                Ok(())
            }
            None => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "read of {} bytes at {} runs past end ({})",
                    buf.len(),
                    start,
                    data.len()
                ),
            )),
        }
    }

    fn write_bytes(&mut self, buf: &[u8]) -> io::Result<()> {
        self.check_open()?;
        let mut data = self.data.lock();
        let start = self.position as usize;
        let end = start + buf.len();
        if end > data.len() {
            data.resize(end, 0);
        }
        data[start..end].copy_from_slice(buf);
        self.position = end as u64;
        Ok(())
    }

    fn sync(&mut self) -> io::Result<()> {
        self.check_open()
    }

    fn close(&mut self) -> io::Result<()> {
        self.check_open()?;
        self.closed = true;
        Ok(())
    }
}
