//! Duplicate key tracking for properties-style key/value stores
//!
//! [`DuplicateKeyTracker`] wraps a last-write-wins string store and records
//! every key that is assigned more than once. Duplicates are reported in the
//! order in which each key *became* duplicated (its second assignment), so
//! two runs over the same input always produce the same report.

use ahash::AHashMap;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

/// A key that was assigned more than once, with its extra assignment count
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateEntry {
    /// The duplicated key
    pub key: String,
    /// Number of assignments beyond the first (always >= 1)
    pub count: usize,
}

impl DuplicateEntry {
    /// Total number of times the key was assigned
    pub fn occurrences(&self) -> usize {
        self.count + 1
    }
}

/// Statistics for a tracker
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackerStats {
    /// Total number of `assign` calls
    pub assignments: usize,
    /// Number of distinct keys in the store
    pub distinct_keys: usize,
    /// Number of keys assigned at least twice
    pub duplicated_keys: usize,
    /// Sum of all duplicate counts
    pub extra_assignments: usize,
}

impl TrackerStats {
    /// Get the share of assignments that hit an existing key, as a percentage
    pub fn duplication_rate(&self) -> f64 {
        if self.assignments == 0 {
            0.0
        } else {
            (self.extra_assignments as f64 / self.assignments as f64) * 100.0
        }
    }
}

/// Insertion-ordered key -> count map.
///
/// Entries live in a `Vec` in the order keys were first inserted; the hash
/// index only maps a key to its slot and is never iterated.
#[derive(Debug, Clone, Default)]
struct DuplicateCounts {
    entries: Vec<DuplicateEntry>,
    index: AHashMap<String, usize>,
}

impl DuplicateCounts {
    /// Bump the count for `key`, appending it with count 1 if unseen
    fn increment(&mut self, key: &str) -> usize {
        match self.index.get(key) {
            Some(&slot) => {
                let entry = &mut self.entries[slot];
                entry.count += 1;
                entry.count
            }
            None => {
                self.index.insert(key.to_owned(), self.entries.len());
                self.entries.push(DuplicateEntry {
                    key: key.to_owned(),
                    count: 1,
                });
                1
            }
        }
    }

    fn get(&self, key: &str) -> Option<usize> {
        self.index.get(key).map(|&slot| self.entries[slot].count)
    }

    fn total(&self) -> usize {
        self.entries.iter().map(|e| e.count).sum()
    }
}

#[derive(Debug, Default)]
struct TrackerState {
    store: AHashMap<String, String>,
    duplicates: DuplicateCounts,
    assignments: usize,
}

/// Key/value store that remembers which keys were assigned more than once.
///
/// All methods take `&self`; the store and the duplicate counts sit behind a
/// single mutex, so a tracker can be shared between threads (e.g. in an
/// `Arc`) without losing increments.
#[derive(Debug, Default)]
pub struct DuplicateKeyTracker {
    state: Mutex<TrackerState>,
}

impl DuplicateKeyTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty tracker with room for `capacity` distinct keys
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(TrackerState {
                store: AHashMap::with_capacity(capacity),
                ..Default::default()
            }),
        }
    }

    /// Assign `value` to `key`, returning the previous value if there was one.
    ///
    /// Assigning a key that is already present counts as a duplicate.
    pub fn assign<K, V>(&self, key: K, value: V) -> Option<String>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let key = key.into();
        let value = value.into();

        let mut guard = self.state.lock();
        let TrackerState {
            store,
            duplicates,
            assignments,
        } = &mut *guard;
        *assignments += 1;

        match store.get_mut(&key) {
            Some(slot) => {
                let previous = std::mem::replace(slot, value);
                let count = duplicates.increment(&key);
                debug!("Duplicate assignment of key '{}' (count {})", key, count);
                Some(previous)
            }
            None => {
                store.insert(key, value);
                None
            }
        }
    }

    /// Take a point-in-time copy of all duplicated keys, in duplication order
    pub fn duplicates(&self) -> DuplicateSnapshot {
        let state = self.state.lock();
        DuplicateSnapshot {
            entries: state.duplicates.entries.clone(),
        }
    }

    /// Get the current value for `key`
    pub fn get(&self, key: &str) -> Option<String> {
        self.state.lock().store.get(key).cloned()
    }

    /// Get the duplicate count for `key`, if it was assigned more than once
    pub fn duplicate_count(&self, key: &str) -> Option<usize> {
        self.state.lock().duplicates.get(key)
    }

    /// Number of distinct keys stored
    pub fn len(&self) -> usize {
        self.state.lock().store.len()
    }

    /// Whether nothing has been assigned yet
    pub fn is_empty(&self) -> bool {
        self.state.lock().store.is_empty()
    }

    /// Get current statistics
    pub fn stats(&self) -> TrackerStats {
        let state = self.state.lock();
        TrackerStats {
            assignments: state.assignments,
            distinct_keys: state.store.len(),
            duplicated_keys: state.duplicates.entries.len(),
            extra_assignments: state.duplicates.total(),
        }
    }
}

/// Owned, ordered copy of a tracker's duplicated keys
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DuplicateSnapshot {
    entries: Vec<DuplicateEntry>,
}

impl DuplicateSnapshot {
    /// Iterate entries in duplication order
    pub fn iter(&self) -> std::slice::Iter<'_, DuplicateEntry> {
        self.entries.iter()
    }

    /// Iterate duplicated keys in duplication order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    /// The key that became duplicated first
    pub fn first(&self) -> Option<&DuplicateEntry> {
        self.entries.first()
    }

    /// Look up the duplicate count for `key`
    pub fn get(&self, key: &str) -> Option<usize> {
        self.entries.iter().find(|e| e.key == key).map(|e| e.count)
    }

    /// Number of duplicated keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no key was duplicated
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mutable access to the copied entries; never reaches the tracker
    pub fn entries_mut(&mut self) -> &mut Vec<DuplicateEntry> {
        &mut self.entries
    }
}

impl IntoIterator for DuplicateSnapshot {
    type Item = DuplicateEntry;
    type IntoIter = std::vec::IntoIter<DuplicateEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a DuplicateSnapshot {
    type Item = &'a DuplicateEntry;
    type IntoIter = std::slice::Iter<'a, DuplicateEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
