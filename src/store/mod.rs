//! Byte Store Module
//!
//! The random-access medium a block file lives in.
//!
//! ## Responsibilities
//! - Absolute and relative seeking, length control (grow/truncate)
//! - Raw byte transfer at the current position
//! - Big-endian fixed-width integers on top of raw transfer
//!
//! Every read and write advances the position by the amount transferred.
//! Reads are exact: a short read is an `UnexpectedEof` I/O error.

mod file;
mod mem;

use std::io;

use byteorder::{BigEndian, ByteOrder};

pub use file::FileStore;
pub use mem::MemStore;

/// A seekable, resizable byte medium
pub trait ByteStore: Send {
    /// Move to an absolute offset
    fn seek(&mut self, offset: u64) -> io::Result<()>;

    /// Current offset
    fn position(&mut self) -> io::Result<u64>;

    /// Total length in bytes
    fn len(&mut self) -> io::Result<u64>;

    /// Grow or truncate to exactly `len` bytes. Grown bytes have
    /// unspecified content.
    fn set_len(&mut self, len: u64) -> io::Result<()>;

    /// Fill `buf` completely from the current position
    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<()>;

    /// Write all of `buf` at the current position, extending the store
    /// if the write runs past the end
    fn write_bytes(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Push buffered writes down to the durable medium
    fn sync(&mut self) -> io::Result<()>;

    /// Release the medium. Every later call fails.
    fn close(&mut self) -> io::Result<()>;

    fn is_empty(&mut self) -> io::Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Move relative to the current position; fails if the target would
    /// be negative
    fn seek_by(&mut self, delta: i64) -> io::Result<()> {
        let current = self.position()?;
        let target = current.checked_add_signed(delta).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("seek by {} from {} leaves the store", delta, current),
            )
        })?;
        self.seek(target)
    }

    // =========================================================================
    // Fixed-width primitives (big-endian)
    // =========================================================================

    fn read_u16(&mut self) -> io::Result<u16> {
        let mut buf = [0u8; 2];
        self.read_bytes(&mut buf)?;
        Ok(BigEndian::read_u16(&buf))
    }

    fn read_u32(&mut self) -> io::Result<u32> {
        let mut buf = [0u8; 4];
        self.read_bytes(&mut buf)?;
        Ok(BigEndian::read_u32(&buf))
    }

    fn read_i32(&mut self) -> io::Result<i32> {
        let mut buf = [0u8; 4];
        self.read_bytes(&mut buf)?;
        Ok(BigEndian::read_i32(&buf))
    }

    fn read_u64(&mut self) -> io::Result<u64> {
        let mut buf = [0u8; 8];
        self.read_bytes(&mut buf)?;
        Ok(BigEndian::read_u64(&buf))
    }

    fn write_u16(&mut self, value: u16) -> io::Result<()> {
        let mut buf = [0u8; 2];
        BigEndian::write_u16(&mut buf, value);
        self.write_bytes(&buf)
    }

    fn write_u32(&mut self, value: u32) -> io::Result<()> {
        let mut buf = [0u8; 4];
        BigEndian::write_u32(&mut buf, value);
        self.write_bytes(&buf)
    }

    fn write_i32(&mut self, value: i32) -> io::Result<()> {
        let mut buf = [0u8; 4];
        BigEndian::write_i32(&mut buf, value);
        self.write_bytes(&buf)
    }

    fn write_u64(&mut self, value: u64) -> io::Result<()> {
        let mut buf = [0u8; 8];
        BigEndian::write_u64(&mut buf, value);
        self.write_bytes(&buf)
    }
}

/// Error returned by a backend after `close`
pub(crate) fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "byte store is closed")
}
