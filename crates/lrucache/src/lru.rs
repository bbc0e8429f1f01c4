//! LRU (Least Recently Used) cache implementation
//!
//! Entries live in an arena and are linked into a doubly-linked recency list
//! by slot index. Slots 0 and 1 are permanent `head` / `tail` sentinels, so
//! linking and unlinking never branch on the ends of the list.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::iter::FusedIterator;

use ahash::RandomState;
use tracing::trace;

use crate::error::{Error, Result};

const HEAD: usize = 0;
const TAIL: usize = 1;

/// Upper bound on slots reserved up front; larger caches grow on demand.
const PREALLOC_LIMIT: usize = 4096;

#[derive(Clone)]
struct Entry<K, V> {
    key: K,
    value: V,
}

/// Node in the LRU doubly-linked list
#[derive(Clone)]
struct Node<K, V> {
    /// `None` only for the two sentinels
    entry: Option<Entry<K, V>>,
    prev: usize,
    next: usize,
}

impl<K, V> Node<K, V> {
    fn sentinel() -> Self {
        Self {
            entry: None,
            prev: HEAD,
            next: TAIL,
        }
    }
}

/// LRU cache with fixed capacity
///
/// `get` and `set` run in O(1). The entry right after `head` is the most
/// recently used one; the entry right before `tail` is evicted next.
#[derive(Clone)]
pub struct LruCache<K, V> {
    map: HashMap<K, usize, RandomState>,
    nodes: Vec<Node<K, V>>,
    capacity: usize,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a new LRU cache with the given capacity
    ///
    /// # Errors
    /// Returns [`Error::InvalidCapacity`] when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity(capacity));
        }

        let reserve = capacity.min(PREALLOC_LIMIT);
        let mut nodes = Vec::with_capacity(reserve + 2);
        nodes.push(Node::sentinel());
        nodes.push(Node::sentinel());

        Ok(Self {
            map: HashMap::with_capacity_and_hasher(reserve, RandomState::new()),
            nodes,
            capacity,
        })
    }

    /// Get a value from the cache, marking it most recently used
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.map.get(key)?;
        self.move_to_front(idx);
        self.nodes[idx].entry.as_ref().map(|entry| &entry.value)
    }

    /// Mutable variant of [`get`](Self::get); also promotes the entry
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.map.get(key)?;
        self.move_to_front(idx);
        self.nodes[idx].entry.as_mut().map(|entry| &mut entry.value)
    }

    /// Insert or overwrite a key-value pair
    pub fn set(&mut self, key: K, value: V) {
        self.push(key, value);
    }

    /// Insert or overwrite a key-value pair, returning the evicted entry
    ///
    /// Overwriting an existing key never evicts. Inserting a new key into a
    /// full cache evicts exactly the least recently used entry.
    pub fn push(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&idx) = self.map.get(&key) {
            if let Some(entry) = self.nodes[idx].entry.as_mut() {
                entry.value = value;
            }
            self.move_to_front(idx);
            return None;
        }

        let (idx, evicted) = if self.map.len() >= self.capacity {
            let (idx, evicted) = self.evict();
            (idx, Some(evicted))
        } else {
            self.nodes.push(Node::sentinel());
            (self.nodes.len() - 1, None)
        };

        self.nodes[idx].entry = Some(Entry {
            key: key.clone(),
            value,
        });
        self.link_front(idx);
        self.map.insert(key, idx);

        trace!(slot = idx, len = self.map.len(), "inserted entry");
        evicted
    }

    /// Get a value without changing its recency
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.map.get(key)?;
        self.nodes[idx].entry.as_ref().map(|entry| &entry.value)
    }

    /// Check for a key without changing its recency
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(key)
    }
}

impl<K, V> LruCache<K, V> {
    /// The entry that would be evicted next
    pub fn peek_lru(&self) -> Option<(&K, &V)> {
        self.entry_at(self.nodes[TAIL].prev)
    }

    /// The most recently used entry
    pub fn peek_mru(&self) -> Option<(&K, &V)> {
        self.entry_at(self.nodes[HEAD].next)
    }

    /// Get the current size of the cache
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate entries from most to least recently used
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            nodes: &self.nodes,
            front: self.nodes[HEAD].next,
            back: self.nodes[TAIL].prev,
            remaining: self.map.len(),
        }
    }

    /// Iterate keys from most to least recently used
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator + '_ {
        self.iter().map(|(key, _)| key)
    }

    fn entry_at(&self, idx: usize) -> Option<(&K, &V)> {
        self.nodes[idx]
            .entry
            .as_ref()
            .map(|entry| (&entry.key, &entry.value))
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.nodes[HEAD].next == idx {
            return;
        }
        self.unlink(idx);
        self.link_front(idx);
    }

    fn link_front(&mut self, idx: usize) {
        let first = self.nodes[HEAD].next;
        self.nodes[idx].prev = HEAD;
        self.nodes[idx].next = first;
        self.nodes[first].prev = idx;
        self.nodes[HEAD].next = idx;
    }

    fn unlink(&mut self, idx: usize) {
        let Node { prev, next, .. } = self.nodes[idx];
        self.nodes[prev].next = next;
        self.nodes[next].prev = prev;
    }
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq,
{
    /// Drop the entry before `tail` and hand back its slot for reuse.
    ///
    /// Only called when the cache is full, so the slot is never a sentinel.
    fn evict(&mut self) -> (usize, (K, V)) {
        let idx = self.nodes[TAIL].prev;
        debug_assert_ne!(idx, HEAD, "evict called on an empty cache");

        self.unlink(idx);
        let Entry { key, value } = self.nodes[idx]
            .entry
            .take()
            .unwrap_or_else(|| unreachable!("live list node {} has no entry", idx));
        self.map.remove(&key);

        trace!(slot = idx, capacity = self.capacity, "evicted least recently used entry");
        (idx, (key, value))
    }

    /// Walk the list and check it against the index.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        assert!(self.map.len() <= self.capacity, "over capacity");
        assert!(self.nodes[HEAD].entry.is_none(), "head sentinel holds an entry");
        assert!(self.nodes[TAIL].entry.is_none(), "tail sentinel holds an entry");
        assert!(self.nodes.len() <= self.capacity + 2, "arena grew past capacity");

        let mut seen = 0;
        let mut prev = HEAD;
        let mut cur = self.nodes[HEAD].next;
        while cur != TAIL {
            assert!(seen < self.map.len(), "list is longer than the index");
            let node = &self.nodes[cur];
            assert_eq!(node.prev, prev, "broken back link at slot {}", cur);
            let entry = node.entry.as_ref().expect("live node without an entry");
            assert_eq!(self.map.get(&entry.key), Some(&cur), "index points elsewhere");
            seen += 1;
            prev = cur;
            cur = node.next;
        }
        assert_eq!(self.nodes[TAIL].prev, prev, "tail back link is stale");
        assert_eq!(seen, self.map.len(), "index has keys missing from the list");
    }
}

impl<K, V> Extend<(K, V)> for LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.set(key, value);
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V> IntoIterator for &'a LruCache<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over cache entries in recency order, most recent first
pub struct Iter<'a, K, V> {
    nodes: &'a [Node<K, V>],
    front: usize,
    back: usize,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = &self.nodes[self.front];
        self.front = node.next;
        self.remaining -= 1;
        node.entry.as_ref().map(|entry| (&entry.key, &entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = &self.nodes[self.back];
        self.back = node.prev;
        self.remaining -= 1;
        node.entry.as_ref().map(|entry| (&entry.key, &entry.value))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}
