//! Bounded least-recently-used cache
//!
//! A fixed-capacity map that evicts the least recently touched entry when
//! full. Entries live in a slab (`Vec`) and are threaded onto a doubly
//! linked recency list by index, with a `HashMap` from key to slot. Both
//! `get` and `put` are O(1) amortized.
//!
//! The cache is meant to have a single owner. Wrap it in a lock if it has
//! to be shared.

use std::collections::HashMap;
use std::hash::Hash;

/// Slab slot holding one entry and its recency links
#[derive(Debug)]
struct CacheEntry<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Fixed-capacity least-recently-used cache
#[derive(Debug)]
pub struct BoundedRecencyCache<K, V> {
    capacity: usize,
    index: HashMap<K, usize>,
    entries: Vec<CacheEntry<K, V>>,
    /// Most recently used slot
    head: Option<usize>,
    /// Least recently used slot
    tail: Option<usize>,
}

impl<K: Hash + Eq + Clone, V> BoundedRecencyCache<K, V> {
    /// Create a cache holding at most `capacity` entries (at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            index: HashMap::with_capacity(capacity),
            entries: Vec::with_capacity(capacity),
            head: None,
            tail: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Return the value for `key` and mark it most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let slot = *self.index.get(key)?;
        self.promote(slot);
        Some(&self.entries[slot].value)
    }

    /// Return the value for `key` without touching its recency.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.index.get(key).map(|&slot| &self.entries[slot].value)
    }

    /// Insert or update `key` and mark it most recently used.
    ///
    /// Returns the evicted `(key, value)` if the insert overflowed capacity.
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&slot) = self.index.get(&key) {
            self.entries[slot].value = value;
            self.promote(slot);
            return None;
        }

        if self.index.len() < self.capacity {
            let slot = self.entries.len();
            self.entries.push(CacheEntry {
                key: key.clone(),
                value,
                prev: None,
                next: None,
            });
            self.index.insert(key, slot);
            self.push_front(slot);
            return None;
        }

        // Full: reuse the least recently used slot in place.
        let slot = self.tail?;
        self.unlink(slot);
        let old_key = std::mem::replace(&mut self.entries[slot].key, key.clone());
        let old_value = std::mem::replace(&mut self.entries[slot].value, value);
        self.index.remove(&old_key);
        self.index.insert(key, slot);
        self.push_front(slot);
        Some((old_key, old_value))
    }

    /// Remove `key`, returning its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let slot = self.index.remove(key)?;
        self.unlink(slot);

        // Keep the slab dense: move the last slot into the hole.
        let last = self.entries.len() - 1;
        if slot != last {
            self.relocate(last, slot);
        }
        let removed = self.entries.swap_remove(slot);
        Some(removed.value)
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.entries.clear();
        self.head = None;
        self.tail = None;
    }

    /// Keys from most to least recently used.
    pub fn keys_by_recency(&self) -> Vec<&K> {
        let mut keys = Vec::with_capacity(self.len());
        let mut cursor = self.head;
        while let Some(slot) = cursor {
            keys.push(&self.entries[slot].key);
            cursor = self.entries[slot].next;
        }
        keys
    }

    fn promote(&mut self, slot: usize) {
        if self.head == Some(slot) {
            return;
        }
        self.unlink(slot);
        self.push_front(slot);
    }

    fn push_front(&mut self, slot: usize) {
        self.entries[slot].prev = None;
        self.entries[slot].next = self.head;
        if let Some(old_head) = self.head {
            self.entries[old_head].prev = Some(slot);
        }
        self.head = Some(slot);
        if self.tail.is_none() {
            self.tail = Some(slot);
        }
    }

    fn unlink(&mut self, slot: usize) {
        let (prev, next) = (self.entries[slot].prev, self.entries[slot].next);
        match prev {
            Some(p) => self.entries[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.entries[n].prev = prev,
            None => self.tail = prev,
        }
        self.entries[slot].prev = None;
        self.entries[slot].next = None;
    }

    /// Repoint links and index from slot `from` to slot `to` ahead of a swap_remove.
    fn relocate(&mut self, from: usize, to: usize) {
        let (prev, next) = (self.entries[from].prev, self.entries[from].next);
        match prev {
            Some(p) => self.entries[p].next = Some(to),
            None => self.head = Some(to),
        }
        match next {
            Some(n) => self.entries[n].prev = Some(to),
            None => self.tail = Some(to),
        }
        if let Some(slot) = self.index.get_mut(&self.entries[from].key) {
            *slot = to;
        }
    }
}
