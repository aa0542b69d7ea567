//! Table of Contents Module
//!
//! The fixed-size slot array at the head of a block file, and the two
//! in-memory indexes mirrored from it.
//!
//! ## Slot Layout
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ TOC Entry (16 bytes, big-endian)         │
//! │ ┌──────────┬──────────────┬────────────┐ │
//! │ │ Key (i32)│ Offset (u64) │ Size (u32) │ │
//! │ └──────────┴──────────────┴────────────┘ │
//! │ Key = -1 marks an empty slot             │
//! └──────────────────────────────────────────┘
//! ```
//!
//! Slot `n` lives at byte `TOC_HEADER_SIZE + n * TOC_ENTRY_SIZE`.

mod entry;
mod index;

pub use entry::TocEntry;
pub use index::TocIndex;

// =============================================================================
// Shared Constants (used by entry codec, index, block file)
// =============================================================================

/// Header size: DataOffset (8) + EntriesUsed (4) = 12 bytes
pub const TOC_HEADER_SIZE: u64 = 12;

/// Entry size: Key (4) + Offset (8) + Size (4) = 16 bytes
pub const TOC_ENTRY_SIZE: u64 = 16;

/// Key stored in an unused slot
pub const EMPTY_KEY: i32 = -1;

/// Byte position of a slot within the store
pub fn slot_position(slot: u32) -> u64 {
    TOC_HEADER_SIZE + slot as u64 * TOC_ENTRY_SIZE
}

/// First data byte for a TOC with `capacity` slots
pub fn data_offset_for(capacity: u64) -> u64 {
    TOC_HEADER_SIZE + capacity * TOC_ENTRY_SIZE
}
