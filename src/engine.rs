//! Engine Module
//!
//! The public, thread-safe face of a block file.
//!
//! ## Responsibilities
//! - Open a byte store (load, or initialize when empty / on reset)
//! - Serialize every operation behind one lock
//! - Apply the configured sync strategy after mutations
//! - Refuse all operations after `close`

use std::fs;

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::info;

use crate::config::{Config, SyncStrategy};
use crate::error::{Result, StoreError};
use crate::storage::{BlockFile, StoreStats};
use crate::store::{ByteStore, FileStore};
use crate::toc::TocEntry;

/// The block store engine
///
/// ## Concurrency Model: one coarse lock
///
/// - Every call (read, write, delete, repack, close and the queries) takes
///   the same mutex for its whole duration
/// - A reader never sees a half-finished write; no two calls issue store
///   I/O at the same time
/// - Reads need the lock too: a read moves the store's position
///
/// Sharing one byte store between two engines is not supported.
pub struct Engine<S: ByteStore = FileStore> {
    /// `None` once closed
    inner: Mutex<Option<BlockFile<S>>>,

    /// When to sync the store
    sync_strategy: SyncStrategy,
}

impl Engine<FileStore> {
    /// Open or create the store file named by `config.path`
    ///
    /// On startup:
    /// 1. Validate config
    /// 2. Create the parent directory if needed
    /// 3. Open the file (keeping content)
    /// 4. Load its layout, or initialize it when empty / `config.reset`
    pub fn open_path(config: Config) -> Result<Self> {
        config.validate()?;

        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let store = FileStore::open(&config.path)?;
        info!(path = %config.path.display(), "Opening block store file");
        Self::open_with(store, &config)
    }
}

impl<S: ByteStore> Engine<S> {
    /// Load the layout in `store`, or initialize it if the store is empty
    pub fn open(store: S) -> Result<Self> {
        Self::open_with(store, &Config::default())
    }

    /// Discard whatever `store` holds and start with an empty layout
    pub fn open_fresh(store: S) -> Result<Self> {
        let config = Config::builder().reset(true).build();
        Self::open_with(store, &config)
    }

    /// Open `store` with explicit tuning
    pub fn open_with(store: S, config: &Config) -> Result<Self> {
        config.validate()?;
        let file = BlockFile::open(store, config)?;

        Ok(Self {
            inner: Mutex::new(Some(file)),
            sync_strategy: config.sync_strategy,
        })
    }

    /// Get the block stored under `key`
    ///
    /// Returns:
    /// - `Ok(Some(bytes))`: key is mapped
    /// - `Ok(None)`: key is not mapped
    /// - `Err(InvalidKey)`: key is negative
    pub fn read(&self, key: i32) -> Result<Option<Bytes>> {
        self.with_file(|file| file.read(key))
    }

    /// Store `data` under `key`, replacing any existing block
    pub fn write(&self, key: i32, data: &[u8]) -> Result<()> {
        self.mutate(|file| file.write(key, data))
    }

    /// Remove `key`; fails with `KeyNotFound` if it is not mapped
    pub fn delete(&self, key: i32) -> Result<()> {
        self.mutate(|file| file.delete(key))
    }

    /// Defragment, leaving exactly `reserve_slots` free TOC slots
    pub fn repack(&self, reserve_slots: u32) -> Result<()> {
        self.mutate(|file| file.repack(reserve_slots))
    }

    /// Close the underlying store. Every later call fails with `Closed`.
    pub fn close(&self) -> Result<()> {
        let file = self.inner.lock().take().ok_or(StoreError::Closed)?;
        file.close()?;
        info!("Block store closed");
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().is_none()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn contains(&self, key: i32) -> Result<bool> {
        self.with_file(|file| Ok(file.contains(key)))
    }

    /// Size in bytes of the block under `key`
    pub fn block_size(&self, key: i32) -> Result<Option<u32>> {
        self.with_file(|file| Ok(file.block_size(key)))
    }

    /// Live keys in ascending order
    pub fn keys(&self) -> Result<Vec<i32>> {
        self.with_file(|file| Ok(file.keys()))
    }

    /// Occupied TOC entries in ascending offset order
    pub fn entries(&self) -> Result<Vec<TocEntry>> {
        self.with_file(|file| Ok(file.entries()))
    }

    /// Space accounting: TOC size, live bytes, and wasted bytes `repack`
    /// would reclaim
    pub fn stats(&self) -> Result<StoreStats> {
        self.with_file(|file| file.stats())
    }

    /// Number of live blocks
    pub fn len(&self) -> Result<usize> {
        self.with_file(|file| Ok(file.entries_used() as usize))
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Force a sync regardless of strategy
    pub fn sync(&self) -> Result<()> {
        self.with_file(|file| file.sync())
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Run `op` under the engine lock
    fn with_file<T>(&self, op: impl FnOnce(&mut BlockFile<S>) -> Result<T>) -> Result<T> {
        let mut guard = self.inner.lock();
        let file = guard.as_mut().ok_or(StoreError::Closed)?;
        op(file)
    }

    /// Run a mutating `op` under the engine lock, then sync if configured
    fn mutate<T>(&self, op: impl FnOnce(&mut BlockFile<S>) -> Result<T>) -> Result<T> {
        let sync_strategy = self.sync_strategy;
        self.with_file(|file| {
            let out = op(file)?;
            if sync_strategy == SyncStrategy::EveryWrite {
                file.sync()?;
            }
            Ok(out)
        })
    }
}
