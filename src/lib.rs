//! # TocStore
//!
//! A single-file block store:
//! - Small non-negative integer keys mapped to opaque byte blocks
//! - An on-disk table of contents (TOC) mirrored by in-memory indexes
//! - Append-only placement; wasted space is reclaimed by explicit `repack`
//! - One coarse lock per engine instance
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Engine                               │
//! │            (one Mutex, closed state, sync policy)            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       BlockFile                              │
//! │     (placement, TOC growth, repack, relocation/staging)      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  TocIndex   │          │  ByteStore  │
//!   │ (key map +  │          │ (File/Mem)  │
//!   │ offset set) │          └─────────────┘
//!   └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use tocstore::{Engine, MemStore};
//!
//! let engine = Engine::open(MemStore::new()).unwrap();
//! engine.write(7, b"hello").unwrap();
//! assert_eq!(engine.read(7).unwrap().as_deref(), Some(&b"hello"[..]));
//! engine.delete(7).unwrap();
//! engine.repack(4).unwrap();
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod store;
pub mod toc;
pub mod storage;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{StoreError, Result};
pub use config::{Config, SyncStrategy};
pub use engine::Engine;
pub use storage::StoreStats;
pub use store::{ByteStore, FileStore, MemStore};
pub use toc::TocEntry;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of TocStore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
