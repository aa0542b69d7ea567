//! Tests for TocIndex
//!
//! These tests verify:
//! - Key and offset indexes stay in step with the slot arena
//! - Lowest/highest/end-of-data lookups, including zero-length blocks
//! - Slot swapping and compaction renumber both indexes
//! - Duplicate-key and overlap detection for loaded slots

use tocstore::toc::{data_offset_for, slot_position, TocEntry, TocIndex, EMPTY_KEY};
use tocstore::StoreError;

// =============================================================================
// Helper Functions
// =============================================================================

fn entry(slot_index: u32, key: i32, offset: u64, size: u32) -> TocEntry {
    TocEntry {
        slot_index,
        key,
        offset,
        size,
    }
}

// =============================================================================
// Constant / Position Tests
// =============================================================================

#[test]
fn test_slot_positions() {
    assert_eq!(slot_position(0), 12);
    assert_eq!(slot_position(1), 28);
    assert_eq!(data_offset_for(0), 12);
    assert_eq!(data_offset_for(1), 28);
    assert_eq!(data_offset_for(10), 172);
    assert_eq!(TocEntry::empty(4).key, EMPTY_KEY);
}

// =============================================================================
// Insert / Lookup Tests
// =============================================================================

#[test]
fn test_new_index_is_all_free() {
    let index = TocIndex::with_capacity(3);

    assert_eq!(index.capacity(), 3);
    assert_eq!(index.used(), 0);
    assert_eq!(index.free(), 3);
    assert_eq!(index.first_free_slot(), Some(0));
    assert_eq!(index.last_used_slot(), None);
    assert!(index.lowest().is_none());
    assert_eq!(index.end_of_data(), None);
}

#[test]
fn test_insert_and_lookup() {
    let mut index = TocIndex::with_capacity(4);

    index.insert(0, 7, 200, 10);
    index.insert(1, 3, 100, 50);
    index.insert(2, 9, 300, 5);

    assert_eq!(index.get(7), Some(&entry(0, 7, 200, 10)));
    assert!(index.contains(3));
    assert!(!index.contains(4));
    assert_eq!(index.lowest().unwrap().key, 3);
    assert_eq!(index.highest().unwrap().key, 9);
    assert_eq!(index.end_of_data(), Some(305));
    assert_eq!(index.first_free_slot(), Some(3));
    assert_eq!(index.last_used_slot(), Some(2));
    assert_eq!(index.live_bytes(), 65);
    assert_eq!(index.keys(), vec![3, 7, 9]);

    let by_offset: Vec<i32> = index.iter_by_offset().map(|e| e.key).collect();
    assert_eq!(by_offset, vec![3, 7, 9]);
    assert_eq!(index.slots_by_offset(), vec![1, 0, 2]);
}

#[test]
fn test_zero_length_block_sharing_an_offset() {
    let mut index = TocIndex::with_capacity(4);

    // Zero-length block in a higher slot at the same offset as a real block
    index.insert(0, 1, 100, 20);
    index.insert(1, 2, 100, 0);

    assert_eq!(index.end_of_data(), Some(120));
    assert_eq!(index.lowest().unwrap().key, 2);
    assert!(index.first_overlap().is_none());
}

#[test]
fn test_end_of_data_is_largest_end_not_highest_offset() {
    let mut index = TocIndex::with_capacity(3);

    // Zero-length block strictly inside a longer one
    index.insert(0, 1, 60, 10);
    index.insert(1, 2, 65, 0);

    assert_eq!(index.highest().unwrap().key, 2);
    assert_eq!(index.end_of_data(), Some(70));

    index.relocate(0, 200);
    assert_eq!(index.end_of_data(), Some(210));

    index.remove(1);
    assert_eq!(index.end_of_data(), Some(65));
}

#[test]
fn test_free_and_used_slots_track_sparse_layouts() {
    let mut index = TocIndex::from_slots(vec![
        TocEntry::empty(0),
        entry(1, 7, 60, 4),
        TocEntry::empty(2),
        entry(3, 8, 64, 4),
    ])
    .unwrap();

    assert_eq!(index.first_free_slot(), Some(0));
    assert_eq!(index.last_used_slot(), Some(3));

    index.insert(0, 9, 68, 1);
    assert_eq!(index.first_free_slot(), Some(2));

    index.swap_slots(2, 3);
    assert_eq!(index.last_used_slot(), Some(2));
    assert_eq!(index.first_free_slot(), Some(3));

    index.grow_to(6);
    index.remove(7);
    assert_eq!(index.first_free_slot(), Some(1));
    assert_eq!(index.last_used_slot(), Some(2));
    assert_eq!(index.free(), 4);
}

#[test]
fn test_remove_voids_slot() {
    let mut index = TocIndex::with_capacity(2);
    index.insert(0, 5, 50, 5);
    index.insert(1, 6, 55, 5);

    let removed = index.remove(5).unwrap();

    assert_eq!(removed, entry(0, 5, 50, 5));
    assert_eq!(*index.slot(0), TocEntry::empty(0));
    assert_eq!(index.used(), 1);
    assert_eq!(index.lowest().unwrap().key, 6);
    assert!(index.remove(5).is_none());
}

#[test]
fn test_relocate_updates_offset_order() {
    let mut index = TocIndex::with_capacity(2);
    index.insert(0, 1, 10, 4);
    index.insert(1, 2, 14, 4);

    let moved = index.relocate(0, 100);

    assert_eq!(moved.offset, 100);
    assert_eq!(index.get(1).unwrap().offset, 100);
    assert_eq!(index.lowest().unwrap().key, 2);
    assert_eq!(index.end_of_data(), Some(104));
}

// =============================================================================
// Swap / Grow / Compact Tests
// =============================================================================

#[test]
fn test_swap_occupied_and_empty_slots() {
    let mut index = TocIndex::with_capacity(3);
    index.insert(2, 8, 40, 2);

    index.swap_slots(0, 2);

    assert_eq!(index.get(8).unwrap().slot_index, 0);
    assert_eq!(*index.slot(2), TocEntry::empty(2));
    assert_eq!(index.slots_by_offset(), vec![0]);
    assert_eq!(index.last_used_slot(), Some(0));
}

#[test]
fn test_swap_two_occupied_slots() {
    let mut index = TocIndex::with_capacity(2);
    index.insert(0, 1, 10, 1);
    index.insert(1, 2, 20, 1);

    index.swap_slots(0, 1);

    assert_eq!(index.get(1).unwrap().slot_index, 1);
    assert_eq!(index.get(2).unwrap().slot_index, 0);
    assert_eq!(index.slots_by_offset(), vec![1, 0]);
}

#[test]
fn test_grow_to_appends_empty_slots() {
    let mut index = TocIndex::with_capacity(1);
    index.insert(0, 1, 28, 3);

    let first_new = index.grow_to(5);

    assert_eq!(first_new, 1);
    assert_eq!(index.capacity(), 5);
    assert_eq!(index.free(), 4);
    assert_eq!(*index.slot(4), TocEntry::empty(4));
}

#[test]
fn test_compact_renumbers_and_shrinks() {
    let mut index = TocIndex::with_capacity(6);
    index.insert(1, 10, 300, 1);
    index.insert(3, 20, 100, 1);
    index.insert(5, 30, 200, 1);

    index.compact(4);

    assert_eq!(index.capacity(), 4);
    assert_eq!(index.get(10).unwrap().slot_index, 0);
    assert_eq!(index.get(20).unwrap().slot_index, 1);
    assert_eq!(index.get(30).unwrap().slot_index, 2);
    assert_eq!(index.first_free_slot(), Some(3));
    assert_eq!(index.slots_by_offset(), vec![1, 2, 0]);
}

// =============================================================================
// Loaded Slot Tests
// =============================================================================

#[test]
fn test_from_slots_builds_indexes() {
    let slots = vec![
        entry(0, 4, 60, 2),
        TocEntry::empty(1),
        entry(2, 1, 44, 16),
    ];

    let index = TocIndex::from_slots(slots).unwrap();

    assert_eq!(index.used(), 2);
    assert_eq!(index.lowest().unwrap().key, 1);
    assert_eq!(index.first_free_slot(), Some(1));
}

#[test]
fn test_from_slots_rejects_duplicate_keys() {
    let slots = vec![entry(0, 4, 60, 2), entry(1, 4, 62, 2)];

    let result = TocIndex::from_slots(slots);
    assert!(matches!(result, Err(StoreError::CorruptLayout(_))));
}

#[test]
fn test_first_overlap() {
    let clean = TocIndex::from_slots(vec![entry(0, 1, 10, 5), entry(1, 2, 15, 5)]).unwrap();
    assert!(clean.first_overlap().is_none());

    let overlapping =
        TocIndex::from_slots(vec![entry(0, 1, 10, 6), entry(1, 2, 15, 5)]).unwrap();
    let (a, b) = overlapping.first_overlap().unwrap();
    assert_eq!((a.key, b.key), (1, 2));

    // A long block swallowing a later one is caught past a zero-length entry
    let nested = TocIndex::from_slots(vec![
        entry(0, 1, 10, 100),
        entry(1, 2, 20, 0),
        entry(2, 3, 50, 1),
    ])
    .unwrap();
    let (a, b) = nested.first_overlap().unwrap();
    assert_eq!((a.key, b.key), (1, 3));
}
