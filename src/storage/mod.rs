//! Storage Module
//!
//! Block placement over a single byte store.
//!
//! ## Responsibilities
//! - Write the empty layout, or load and validate an existing one
//! - Append-only block placement (gaps are left for `repack`)
//! - Grow the TOC by evacuating leading data blocks
//! - Repack: resize the TOC and slide every block down, contiguously
//!
//! ## File Format
//! ```text
//! ┌────────────────────────────────────────┐
//! │ Header (12 bytes, big-endian)          │
//! │ ┌──────────────────┬─────────────────┐ │
//! │ │ DataOffset (u64) │ EntriesUsed(u32)│ │
//! │ └──────────────────┴─────────────────┘ │
//! ├────────────────────────────────────────┤
//! │ TOC (capacity × 16 bytes)              │
//! │ ┌──────────┬──────────────┬─────────┐  │
//! │ │ Key (i32)│ Offset (u64) │Size(u32)│  │
//! │ └──────────┴──────────────┴─────────┘  │
//! │ ... until DataOffset                   │
//! ├────────────────────────────────────────┤
//! │ Block payloads                         │
//! │ (contiguous, or with gaps left by      │
//! │  deletes and overwrites)               │
//! └────────────────────────────────────────┘
//! ```

mod block_file;

pub use block_file::{BlockFile, StoreStats};
