//! Configuration for TocStore
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{Result, StoreError};

/// Main configuration for a TocStore engine
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Store file used by `Engine::open_path`
    pub path: PathBuf,

    /// Discard existing content and write an empty layout on open
    pub reset: bool,

    // -------------------------------------------------------------------------
    // TOC Configuration
    // -------------------------------------------------------------------------
    /// Slots added when a write finds the TOC full
    pub toc_growth_slots: u32,

    // -------------------------------------------------------------------------
    // I/O Configuration
    // -------------------------------------------------------------------------
    /// Chunk size used when copying a block to a new offset (in bytes)
    pub copy_buffer_size: usize,

    /// When to sync the byte store to its durable medium
    pub sync_strategy: SyncStrategy,
}

/// Store sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// Sync after every mutating call (safest, slowest)
    EveryWrite,

    /// Sync only when the engine is closed
    OnClose,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./tocstore.db"),
            reset: false,
            toc_growth_slots: 16,
            copy_buffer_size: 64 * 1024, // 64 KB
            sync_strategy: SyncStrategy::OnClose,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject values the engine cannot operate with
    pub fn validate(&self) -> Result<()> {
        if self.toc_growth_slots == 0 {
            return Err(StoreError::Config(
                "toc_growth_slots must be at least 1".to_string(),
            ));
        }
        if self.copy_buffer_size == 0 {
            return Err(StoreError::Config(
                "copy_buffer_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the store file path
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Discard existing content on open
    pub fn reset(mut self, reset: bool) -> Self {
        self.config.reset = reset;
        self
    }

    /// Set how many slots a TOC growth adds
    pub fn toc_growth_slots(mut self, slots: u32) -> Self {
        self.config.toc_growth_slots = slots;
        self
    }

    /// Set the relocation copy chunk size (in bytes)
    pub fn copy_buffer_size(mut self, size: usize) -> Self {
        self.config.copy_buffer_size = size;
        self
    }

    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
