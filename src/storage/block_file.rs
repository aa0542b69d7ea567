//! Block File
//!
//! The unlocked storage core: one byte store, one TOC, and the placement
//! and relocation rules that keep them consistent. Every mutating call
//! leaves the on-store TOC matching the in-memory index before it returns.

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::store::ByteStore;
use crate::toc::{
    data_offset_for, slot_position, TocEntry, TocIndex, TOC_ENTRY_SIZE, TOC_HEADER_SIZE,
};

/// Byte position of the `toc_entries_used` header field
const ENTRIES_USED_POSITION: u64 = 8;

/// Space accounting snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    /// First byte available for block data
    pub data_offset: u64,
    /// Slots allocated in the TOC, occupied and empty
    pub toc_capacity: u32,
    /// Occupied slots
    pub entries_used: u32,
    /// Sum of live block sizes
    pub live_bytes: u64,
    /// Current length of the byte store
    pub store_len: u64,
    /// Bytes past `data_offset` not covered by a live block
    pub wasted_bytes: u64,
}

/// Blocks keyed by non-negative integers inside one byte store
pub struct BlockFile<S: ByteStore> {
    store: S,

    /// In-memory mirror of the on-store TOC
    toc: TocIndex,

    /// TOC occupies `[0, data_offset)`
    data_offset: u64,

    /// Slots added when a write finds the TOC full
    growth_slots: u32,

    /// Chunk size for block copies
    copy_buffer_size: usize,
}

impl<S: ByteStore> BlockFile<S> {
    /// Open a store: initialize it when empty or when `config.reset` is set,
    /// otherwise load the existing layout
    pub fn open(mut store: S, config: &Config) -> Result<Self> {
        if config.reset || store.is_empty()? {
            Self::create(store, config)
        } else {
            Self::load(store, config)
        }
    }

    /// Discard any content and write the minimal empty layout: a header
    /// and a single empty slot
    pub fn create(store: S, config: &Config) -> Result<Self> {
        let mut file = Self {
            store,
            toc: TocIndex::with_capacity(1),
            data_offset: data_offset_for(1),
            growth_slots: config.toc_growth_slots,
            copy_buffer_size: config.copy_buffer_size,
        };

        file.persist_header()?;
        file.persist_slot(0)?;
        file.store.set_len(file.data_offset)?;

        info!(data_offset = file.data_offset, "Initialized empty block file");
        Ok(file)
    }

    /// Read the header and TOC of an existing store and rebuild the indexes
    pub fn load(mut store: S, config: &Config) -> Result<Self> {
        let store_len = store.len()?;
        if store_len < TOC_HEADER_SIZE {
            return Err(StoreError::CorruptLayout(format!(
                "store is {} bytes, shorter than the {} byte header",
                store_len, TOC_HEADER_SIZE
            )));
        }

        store.seek(0)?;
        let data_offset = store.read_u64()?;
        let entries_used = store.read_u32()?;

        if data_offset < TOC_HEADER_SIZE || data_offset > store_len {
            return Err(StoreError::CorruptLayout(format!(
                "data offset {} outside [{}, {}]",
                data_offset, TOC_HEADER_SIZE, store_len
            )));
        }

        let toc_bytes = data_offset - TOC_HEADER_SIZE;
        if toc_bytes % TOC_ENTRY_SIZE != 0 {
            return Err(StoreError::CorruptLayout(format!(
                "TOC region of {} bytes is not a whole number of {} byte entries",
                toc_bytes, TOC_ENTRY_SIZE
            )));
        }

        let capacity = u32::try_from(toc_bytes / TOC_ENTRY_SIZE).map_err(|_| {
            StoreError::CorruptLayout(format!("TOC region of {} bytes is too large", toc_bytes))
        })?;

        // One read for the whole TOC, then decode from memory
        let mut raw = vec![0u8; toc_bytes as usize];
        store.read_bytes(&mut raw)?;
        let mut reader = &raw[..];
        let slots = (0..capacity)
            .map(|slot| TocEntry::decode(slot, &mut reader))
            .collect::<Result<Vec<_>>>()?;

        let toc = TocIndex::from_slots(slots)?;

        if toc.used() != entries_used {
            return Err(StoreError::CorruptLayout(format!(
                "header claims {} used entries, TOC holds {}",
                entries_used,
                toc.used()
            )));
        }

        for entry in toc.iter_by_offset() {
            if entry.offset < data_offset
                || entry.offset > store_len
                || entry.size as u64 > store_len - entry.offset
            {
                return Err(StoreError::CorruptLayout(format!(
                    "block {} at [{}, {}) lies outside the data region [{}, {})",
                    entry.key,
                    entry.offset,
                    entry.offset.saturating_add(entry.size as u64),
                    data_offset,
                    store_len
                )));
            }
        }

        if let Some((a, b)) = toc.first_overlap() {
            return Err(StoreError::CorruptLayout(format!(
                "blocks {} and {} overlap at offset {}",
                a.key, b.key, b.offset
            )));
        }

        info!(
            data_offset,
            toc_capacity = capacity,
            entries_used,
            store_len,
            "Loaded block file"
        );

        Ok(Self {
            store,
            toc,
            data_offset,
            growth_slots: config.toc_growth_slots,
            copy_buffer_size: config.copy_buffer_size,
        })
    }

    // =========================================================================
    // Block Operations
    // =========================================================================

    /// Read the block stored under `key`
    pub fn read(&mut self, key: i32) -> Result<Option<Bytes>> {
        check_key(key)?;

        let entry = match self.toc.get(key) {
            Some(entry) => *entry,
            None => return Ok(None),
        };

        let mut buf = vec![0u8; entry.size as usize];
        self.store.seek(entry.offset)?;
        self.store.read_bytes(&mut buf)?;

        Ok(Some(Bytes::from(buf)))
    }

    /// Store `data` under `key`, replacing any existing block.
    ///
    /// The new block always goes right after the highest-offset live block.
    /// Gaps left by earlier deletes are not reused; only `repack` reclaims
    /// them.
    pub fn write(&mut self, key: i32, data: &[u8]) -> Result<()> {
        check_key(key)?;
        let size = u32::try_from(data.len()).map_err(|_| StoreError::BlockTooLarge(data.len()))?;

        if self.toc.contains(key) {
            self.delete(key)?;
        }

        let slot = match self.toc.first_free_slot() {
            Some(slot) => slot,
            None => {
                let growth = self.growth_slots.max(1);
                self.ensure_slots(growth)?;
                self.toc.first_free_slot().ok_or(StoreError::CapacityOverflow {
                    used: self.toc.used(),
                    requested: growth,
                })?
            }
        };

        let offset = self.append_offset();
        self.store.seek(offset)?;
        self.store.write_bytes(data)?;

        let entry = self.toc.insert(slot, key, offset, size);
        self.persist_entry(&entry)?;
        self.persist_entries_used()?;

        debug!(key, slot, offset, size, "Wrote block");
        Ok(())
    }

    /// Remove `key`. Its bytes stay in the store as wasted space.
    ///
    /// The highest occupied slot is swapped into the freed slot so occupied
    /// slots keep clustering at the front of the TOC.
    pub fn delete(&mut self, key: i32) -> Result<()> {
        check_key(key)?;

        let slot = match self.toc.get(key) {
            Some(entry) => entry.slot_index,
            None => return Err(StoreError::KeyNotFound(key)),
        };
        let last = self.toc.last_used_slot().unwrap_or(slot);

        self.toc.remove(key);
        self.toc.swap_slots(slot, last);

        self.persist_entries_used()?;
        self.persist_slot(slot)?;
        if last != slot {
            self.persist_slot(last)?;
        }

        debug!(key, slot, moved_from = last, "Deleted block");
        Ok(())
    }

    /// Guarantee at least `extra` free slots.
    ///
    /// Blocks that sit where the TOC needs to expand are moved, lowest
    /// first, to the end of the data region. The data offset then advances
    /// to the last entry boundary at or below the lowest remaining block,
    /// and every slot in between becomes a new empty slot.
    pub fn ensure_slots(&mut self, extra: u32) -> Result<()> {
        let free = self.toc.free();
        if free >= extra {
            return Ok(());
        }

        let needed = (extra - free) as u64;
        let required_end = self.data_offset + needed * TOC_ENTRY_SIZE;

        let mut evicted = 0usize;
        while let Some(lowest) = self.toc.lowest().copied() {
            if lowest.offset >= required_end {
                break;
            }
            let target = self
                .toc
                .end_of_data()
                .map_or(required_end, |end| end.max(required_end));
            self.move_block(lowest.slot_index, target)?;
            evicted += 1;
        }

        if evicted > 0 {
            warn!(
                evicted,
                required_end, "TOC growth relocated leading data blocks"
            );
        }

        let boundary = match self.toc.lowest() {
            Some(lowest) => align_to_entry(lowest.offset),
            None => required_end,
        };
        let capacity = u32::try_from((boundary - TOC_HEADER_SIZE) / TOC_ENTRY_SIZE)
            .map_err(|_| StoreError::CapacityOverflow {
                used: self.toc.used(),
                requested: extra,
            })?;

        let first_new = self.toc.grow_to(capacity);
        self.persist_empty_slots(first_new, capacity)?;

        self.data_offset = data_offset_for(capacity as u64);
        self.persist_data_offset()?;

        debug!(
            old_capacity = first_new,
            new_capacity = capacity,
            data_offset = self.data_offset,
            "Grew TOC"
        );
        Ok(())
    }

    /// Defragment: size the TOC to exactly `used + reserve_slots` slots and
    /// pack every block, in offset order, directly after it. The store is
    /// truncated to the end of the last block.
    pub fn repack(&mut self, reserve_slots: u32) -> Result<()> {
        let len_before = self.store.len()?;

        let capacity =
            self.toc
                .used()
                .checked_add(reserve_slots)
                .ok_or(StoreError::CapacityOverflow {
                    used: self.toc.used(),
                    requested: reserve_slots,
                })?;

        self.ensure_slots(reserve_slots)?;

        self.toc.compact(capacity);
        self.data_offset = data_offset_for(capacity as u64);
        self.persist_header()?;
        self.persist_all_slots()?;

        let mut cursor = self.data_offset;
        for slot in self.toc.slots_by_offset() {
            let entry = *self.toc.slot(slot);
            let size = entry.size as u64;

            if entry.offset != cursor {
                if ranges_overlap(entry.offset, cursor, size) {
                    let staging = self
                        .toc
                        .end_of_data()
                        .map_or(entry.end(), |end| end.max(entry.end()));
                    debug!(key = entry.key, staging, "Staging overlapping block");
                    self.move_block(slot, staging)?;
                }
                self.move_block(slot, cursor)?;
            }

            cursor += size;
        }

        self.store.set_len(cursor)?;

        info!(
            reserve_slots,
            entries = self.toc.used(),
            data_offset = self.data_offset,
            len_before,
            len_after = cursor,
            "Repacked block file"
        );
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn contains(&self, key: i32) -> bool {
        self.toc.contains(key)
    }

    /// Size of the block under `key`
    pub fn block_size(&self, key: i32) -> Option<u32> {
        self.toc.get(key).map(|entry| entry.size)
    }

    /// Live keys in ascending order
    pub fn keys(&self) -> Vec<i32> {
        self.toc.keys()
    }

    /// Occupied TOC entries in ascending offset order
    pub fn entries(&self) -> Vec<TocEntry> {
        self.toc.iter_by_offset().copied().collect()
    }

    pub fn stats(&mut self) -> Result<StoreStats> {
        let store_len = self.store.len()?;
        let live_bytes = self.toc.live_bytes();

        Ok(StoreStats {
            data_offset: self.data_offset,
            toc_capacity: self.toc.capacity(),
            entries_used: self.toc.used(),
            live_bytes,
            store_len,
            wasted_bytes: store_len.saturating_sub(self.data_offset + live_bytes),
        })
    }

    pub fn data_offset(&self) -> u64 {
        self.data_offset
    }

    pub fn toc_capacity(&self) -> u32 {
        self.toc.capacity()
    }

    pub fn entries_used(&self) -> u32 {
        self.toc.used()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Flush the byte store to its durable medium
    pub fn sync(&mut self) -> Result<()> {
        self.store.sync()?;
        Ok(())
    }

    /// Close the byte store
    pub fn close(mut self) -> Result<()> {
        self.store.close()?;
        Ok(())
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Where the next block goes: after the highest live block
    fn append_offset(&self) -> u64 {
        self.toc
            .end_of_data()
            .map_or(self.data_offset, |end| end.max(self.data_offset))
    }

    /// Copy a block to `target` and repoint its slot there
    fn move_block(&mut self, slot: u32, target: u64) -> Result<()> {
        let entry = *self.toc.slot(slot);
        if entry.offset == target {
            return Ok(());
        }

        self.copy_range(entry.offset, target, entry.size as u64)?;
        let moved = self.toc.relocate(slot, target);
        self.persist_entry(&moved)?;

        debug!(
            key = moved.key,
            from = entry.offset,
            to = target,
            size = moved.size,
            "Relocated block"
        );
        Ok(())
    }

    /// Chunked copy of `len` bytes. Source and destination must not overlap.
    fn copy_range(&mut self, src: u64, dst: u64, len: u64) -> Result<()> {
        debug_assert!(!ranges_overlap(src, dst, len));

        let chunk = (self.copy_buffer_size as u64).min(len) as usize;
        let mut buf = vec![0u8; chunk];
        let mut done = 0u64;

        while done < len {
            let n = (len - done).min(chunk as u64) as usize;
            self.store.seek(src + done)?;
            self.store.read_bytes(&mut buf[..n])?;
            self.store.seek(dst + done)?;
            self.store.write_bytes(&buf[..n])?;
            done += n as u64;
        }

        Ok(())
    }

    fn persist_header(&mut self) -> Result<()> {
        self.store.seek(0)?;
        self.store.write_u64(self.data_offset)?;
        self.store.write_u32(self.toc.used())?;
        Ok(())
    }

    fn persist_data_offset(&mut self) -> Result<()> {
        self.store.seek(0)?;
        self.store.write_u64(self.data_offset)?;
        Ok(())
    }

    fn persist_entries_used(&mut self) -> Result<()> {
        self.store.seek(ENTRIES_USED_POSITION)?;
        self.store.write_u32(self.toc.used())?;
        Ok(())
    }

    fn persist_slot(&mut self, slot: u32) -> Result<()> {
        let entry = *self.toc.slot(slot);
        self.persist_entry(&entry)
    }

    fn persist_entry(&mut self, entry: &TocEntry) -> Result<()> {
        self.store.seek(slot_position(entry.slot_index))?;
        self.store.write_bytes(&entry.encode())?;
        Ok(())
    }

    /// Write slots `first..end` as empty entries, in buffer-sized batches
    fn persist_empty_slots(&mut self, first: u32, end: u32) -> Result<()> {
        let per_batch = (self.copy_buffer_size as u64 / TOC_ENTRY_SIZE).max(1) as u32;
        let mut slot = first;

        while slot < end {
            let batch_end = end.min(slot.saturating_add(per_batch));
            let mut buf = Vec::with_capacity(((batch_end - slot) as u64 * TOC_ENTRY_SIZE) as usize);
            for s in slot..batch_end {
                buf.extend_from_slice(&TocEntry::empty(s).encode());
            }
            self.store.seek(slot_position(slot))?;
            self.store.write_bytes(&buf)?;
            slot = batch_end;
        }

        Ok(())
    }

    fn persist_all_slots(&mut self) -> Result<()> {
        let mut buf = Vec::with_capacity((self.toc.capacity() as u64 * TOC_ENTRY_SIZE) as usize);
        for entry in self.toc.iter_slots() {
            buf.extend_from_slice(&entry.encode());
        }
        self.store.seek(slot_position(0))?;
        self.store.write_bytes(&buf)?;
        Ok(())
    }
}

fn check_key(key: i32) -> Result<()> {
    if key < 0 {
        return Err(StoreError::InvalidKey(key));
    }
    Ok(())
}

/// Largest entry boundary (header + whole entries) not above `offset`
fn align_to_entry(offset: u64) -> u64 {
    TOC_HEADER_SIZE + (offset - TOC_HEADER_SIZE) / TOC_ENTRY_SIZE * TOC_ENTRY_SIZE
}

/// Whether `[a, a + len)` and `[b, b + len)` share a byte
fn ranges_overlap(a: u64, b: u64, len: u64) -> bool {
    len > 0 && a < b + len && b < a + len
}
