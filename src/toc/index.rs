//! In-memory TOC index
//!
//! Entries live once, in a slot-indexed arena. The key map, the offset and
//! end orders, and the free/used slot sets all store slot numbers, never
//! entry copies. Every lookup the block file makes per write or delete is a
//! map or ordered-set access, never a scan of the arena.

use std::collections::{BTreeSet, HashMap};

use crate::error::{Result, StoreError};

use super::TocEntry;

/// Slot arena plus key and offset indexes over its occupied entries
#[derive(Debug, Default, Clone)]
pub struct TocIndex {
    /// Slot-indexed entries, occupied and empty
    slots: Vec<TocEntry>,

    /// key -> slot, occupied entries only
    by_key: HashMap<i32, u32>,

    /// (offset, size, slot), occupied entries only. Size breaks offset ties
    /// so zero-length blocks sort before the block that starts where they sit.
    by_offset: BTreeSet<(u64, u32, u32)>,

    /// (end, slot), occupied entries only. A zero-length block may sit inside
    /// a longer one, so the highest offset does not always carry the highest end.
    by_end: BTreeSet<(u64, u32)>,

    /// Empty slot numbers
    free_slots: BTreeSet<u32>,

    /// Occupied slot numbers
    used_slots: BTreeSet<u32>,
}

impl TocIndex {
    /// An index with `capacity` empty slots
    pub fn with_capacity(capacity: u32) -> Self {
        Self {
            slots: (0..capacity).map(TocEntry::empty).collect(),
            free_slots: (0..capacity).collect(),
            ..Self::default()
        }
    }

    /// Build from slots read off disk. Fails on a duplicate key.
    pub fn from_slots(slots: Vec<TocEntry>) -> Result<Self> {
        let mut index = Self {
            slots,
            ..Self::default()
        };

        for slot in 0..index.capacity() {
            let entry = index.slots[slot as usize];
            if !entry.is_empty() {
                if let Some(&other) = index.by_key.get(&entry.key) {
                    return Err(StoreError::CorruptLayout(format!(
                        "key {} appears in slots {} and {}",
                        entry.key, other, slot
                    )));
                }
            }
            index.link(slot);
        }

        Ok(index)
    }

    // =========================================================================
    // Counters
    // =========================================================================

    /// Total slots, occupied and empty
    pub fn capacity(&self) -> u32 {
        self.slots.len() as u32
    }

    /// Occupied slots
    pub fn used(&self) -> u32 {
        self.by_key.len() as u32
    }

    pub fn free(&self) -> u32 {
        self.capacity() - self.used()
    }

    /// Sum of all live block sizes
    pub fn live_bytes(&self) -> u64 {
        self.by_offset.iter().map(|&(_, size, _)| size as u64).sum()
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub fn get(&self, key: i32) -> Option<&TocEntry> {
        self.by_key.get(&key).map(|&slot| &self.slots[slot as usize])
    }

    pub fn contains(&self, key: i32) -> bool {
        self.by_key.contains_key(&key)
    }

    /// Entry at `slot`
    pub fn slot(&self, slot: u32) -> &TocEntry {
        &self.slots[slot as usize]
    }

    /// Lowest-offset occupied entry
    pub fn lowest(&self) -> Option<&TocEntry> {
        self.by_offset
            .iter()
            .next()
            .map(|&(_, _, slot)| &self.slots[slot as usize])
    }

    /// Highest-offset occupied entry
    pub fn highest(&self) -> Option<&TocEntry> {
        self.by_offset
            .iter()
            .next_back()
            .map(|&(_, _, slot)| &self.slots[slot as usize])
    }

    /// Largest block end over all occupied entries
    pub fn end_of_data(&self) -> Option<u64> {
        self.by_end.iter().next_back().map(|&(end, _)| end)
    }

    /// Lowest-numbered empty slot
    pub fn first_free_slot(&self) -> Option<u32> {
        self.free_slots.iter().next().copied()
    }

    /// Highest-numbered occupied slot
    pub fn last_used_slot(&self) -> Option<u32> {
        self.used_slots.iter().next_back().copied()
    }

    /// Occupied entries in ascending offset order
    pub fn iter_by_offset(&self) -> impl Iterator<Item = &TocEntry> + '_ {
        self.by_offset
            .iter()
            .map(move |&(_, _, slot)| &self.slots[slot as usize])
    }

    /// Slots of occupied entries in ascending offset order
    pub fn slots_by_offset(&self) -> Vec<u32> {
        self.by_offset.iter().map(|&(_, _, slot)| slot).collect()
    }

    /// All slots, occupied and empty, in slot order
    pub fn iter_slots(&self) -> impl Iterator<Item = &TocEntry> + '_ {
        self.slots.iter()
    }

    /// Live keys in ascending order
    pub fn keys(&self) -> Vec<i32> {
        let mut keys: Vec<i32> = self.by_key.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    /// First pair of occupied entries whose byte ranges intersect
    pub fn first_overlap(&self) -> Option<(TocEntry, TocEntry)> {
        let mut prev: Option<&TocEntry> = None;
        for entry in self.iter_by_offset() {
            if let Some(p) = prev {
                if entry.size > 0 && p.end() > entry.offset {
                    return Some((*p, *entry));
                }
            }
            if prev.map_or(true, |p| entry.end() >= p.end()) {
                prev = Some(entry);
            }
        }
        None
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Occupy an empty slot
    pub fn insert(&mut self, slot: u32, key: i32, offset: u64, size: u32) -> TocEntry {
        debug_assert!(self.slots[slot as usize].is_empty());
        debug_assert!(!self.by_key.contains_key(&key));

        let entry = TocEntry {
            slot_index: slot,
            key,
            offset,
            size,
        };
        self.unlink(slot);
        self.slots[slot as usize] = entry;
        self.link(slot);
        entry
    }

    /// Drop `key` from the indexes and void its slot. Returns the entry as
    /// it was before removal.
    pub fn remove(&mut self, key: i32) -> Option<TocEntry> {
        let slot = *self.by_key.get(&key)?;
        let entry = self.slots[slot as usize];
        self.unlink(slot);
        self.slots[slot as usize] = TocEntry::empty(slot);
        self.link(slot);
        Some(entry)
    }

    /// Point an occupied slot at a new offset
    pub fn relocate(&mut self, slot: u32, offset: u64) -> TocEntry {
        debug_assert!(!self.slots[slot as usize].is_empty());

        self.unlink(slot);
        self.slots[slot as usize].offset = offset;
        self.link(slot);
        self.slots[slot as usize]
    }

    /// Exchange the contents of two slots, keeping every index pointed at
    /// the right slot numbers
    pub fn swap_slots(&mut self, a: u32, b: u32) {
        if a == b {
            return;
        }

        self.unlink(a);
        self.unlink(b);

        self.slots.swap(a as usize, b as usize);
        self.slots[a as usize].slot_index = a;
        self.slots[b as usize].slot_index = b;

        self.link(a);
        self.link(b);
    }

    /// Append empty slots until there are `capacity` in total. Returns the
    /// first new slot number.
    pub fn grow_to(&mut self, capacity: u32) -> u32 {
        let first_new = self.capacity();
        self.slots
            .extend((first_new..capacity).map(TocEntry::empty));
        self.free_slots.extend(first_new..capacity);
        first_new
    }

    /// Move occupied entries into slots `0..used` (keeping their relative
    /// slot order) and cut the arena to `capacity` slots.
    pub fn compact(&mut self, capacity: u32) {
        debug_assert!(capacity >= self.used());

        let occupied: Vec<TocEntry> = self
            .used_slots
            .iter()
            .map(|&slot| self.slots[slot as usize])
            .collect();

        *self = Self::with_capacity(capacity);
        for (slot, entry) in occupied.into_iter().enumerate() {
            self.insert(slot as u32, entry.key, entry.offset, entry.size);
        }
    }

    /// Add the entry at `slot` to the indexes matching its state
    fn link(&mut self, slot: u32) {
        let entry = self.slots[slot as usize];
        if entry.is_empty() {
            self.free_slots.insert(slot);
        } else {
            self.used_slots.insert(slot);
            self.by_key.insert(entry.key, slot);
            self.by_offset.insert((entry.offset, entry.size, slot));
            self.by_end.insert((entry.end(), slot));
        }
    }

    /// Take the entry at `slot` out of every index
    fn unlink(&mut self, slot: u32) {
        let entry = self.slots[slot as usize];
        if entry.is_empty() {
            self.free_slots.remove(&slot);
        } else {
            self.used_slots.remove(&slot);
            self.by_key.remove(&entry.key);
            self.by_offset.remove(&(entry.offset, entry.size, slot));
            self.by_end.remove(&(entry.end(), slot));
        }
    }
}
