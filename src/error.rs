//! Error types for TocStore
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Unified error type for TocStore operations
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    /// Any failure reported by the underlying byte store (short read,
    /// seek failure, truncate failure). After an `Io` error from a mutating
    /// call the on-disk state may no longer match the in-memory index.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Caller Errors
    // -------------------------------------------------------------------------
    #[error("Invalid key {0}: keys must be non-negative")]
    InvalidKey(i32),

    #[error("Key not found: {0}")]
    KeyNotFound(i32),

    #[error("Block too large: {0} bytes (limit is u32::MAX)")]
    BlockTooLarge(usize),

    #[error("TOC capacity overflow: {used} used + {requested} requested slots")]
    CapacityOverflow { used: u32, requested: u32 },

    // -------------------------------------------------------------------------
    // Layout Errors
    // -------------------------------------------------------------------------
    /// Only ever raised while opening an existing store.
    #[error("Corrupt layout: {0}")]
    CorruptLayout(String),

    // -------------------------------------------------------------------------
    // Lifecycle Errors
    // -------------------------------------------------------------------------
    #[error("Engine is closed")]
    Closed,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
