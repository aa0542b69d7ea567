//! TOC entry record and its 16-byte codec

use std::io::Read;

use byteorder::{BigEndian, ByteOrder, ReadBytesExt};

use crate::error::Result;

use super::{EMPTY_KEY, TOC_ENTRY_SIZE};

/// One slot of the table of contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TocEntry {
    /// Position in the slot array
    pub slot_index: u32,
    /// Caller key; negative means the slot is empty
    pub key: i32,
    /// Absolute byte offset of the block
    pub offset: u64,
    /// Block length in bytes
    pub size: u32,
}

impl TocEntry {
    /// An unused slot
    pub fn empty(slot_index: u32) -> Self {
        Self {
            slot_index,
            key: EMPTY_KEY,
            offset: 0,
            size: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.key < 0
    }

    /// One past the last byte of the block
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.size as u64)
    }

    /// Serialize to the on-disk form: [key: i32][offset: u64][size: u32]
    pub fn encode(&self) -> [u8; TOC_ENTRY_SIZE as usize] {
        let mut buf = [0u8; TOC_ENTRY_SIZE as usize];
        BigEndian::write_i32(&mut buf[0..4], self.key);
        BigEndian::write_u64(&mut buf[4..12], self.offset);
        BigEndian::write_u32(&mut buf[12..16], self.size);
        buf
    }

    /// Parse one entry from `reader`. Any negative key is normalized to an
    /// empty slot.
    pub fn decode<R: Read>(slot_index: u32, reader: &mut R) -> Result<Self> {
        let key = reader.read_i32::<BigEndian>()?;
        let offset = reader.read_u64::<BigEndian>()?;
        let size = reader.read_u32::<BigEndian>()?;

        if key < 0 {
            return Ok(Self::empty(slot_index));
        }

        Ok(Self {
            slot_index,
            key,
            offset,
            size,
        })
    }
}
