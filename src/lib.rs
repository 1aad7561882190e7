//! # fsmap
//!
//! A fixed-capacity map from string keys to values, backed by an AVL tree
//! threaded through one pre-allocated slot array.
//!
//! All storage is allocated by [`FixedSizeMap::new`]. Association, lookup and
//! removal are O(log n) and never touch the heap afterwards.
//!
//! Keys are not stored. Each key is reduced to a 32-bit digest
//! ([`key_digest`]) and the tree is ordered by digest, so two distinct keys
//! whose digests collide are treated as the same key.
//!
//! ## Example
//!
//! ```rust
//! use fsmap::FixedSizeMap;
//!
//! let mut map: FixedSizeMap<&str> = FixedSizeMap::new(5).unwrap();
//! assert!(map.associate("a", "apple"));
//! assert!(map.associate("b", "banana"));
//! assert!(!map.associate("a", "avocado"));
//!
//! assert_eq!(map.lookup("a"), Some(&"apple"));
//! assert_eq!(map.remove("b"), Some("banana"));
//! assert_eq!(map.load_factor(), 0.2);
//! ```

#![deny(unsafe_code)]

mod digest;
mod error;
mod slots;
mod tracing_helpers;
mod tree;

pub use digest::key_digest;
pub use error::MapError;
pub use tree::Dump;

use slots::{SlotArena, SlotIdx, MAX_SLOTS};
use tracing_helpers::{debug_log, warn_log};

/// Fixed-capacity map with string keys.
///
/// Capacity is chosen at construction and never changes. Only one caller
/// may mutate at a time; wrap it in a lock to share across threads.
pub struct FixedSizeMap<V> {
    arena: SlotArena<V>,
    root: SlotIdx,
    items: usize,
}

impl<V> FixedSizeMap<V> {
    /// Largest supported capacity.
    pub const MAX_CAPACITY: usize = MAX_SLOTS;

    /// Create an empty map with room for exactly `capacity` entries.
    ///
    /// Fails with [`MapError::InvalidArgument`] if `capacity` is zero or
    /// exceeds [`Self::MAX_CAPACITY`].
    pub fn new(capacity: usize) -> Result<Self, MapError> {
        if capacity == 0 || capacity > Self::MAX_CAPACITY {
            warn_log!(capacity, "rejected capacity");
            return Err(MapError::InvalidArgument);
        }
        Ok(Self {
            arena: SlotArena::new(capacity),
            root: SlotIdx::NONE,
            items: 0,
        })
    }

    /// Like [`new`](Self::new), but accepts a signed size as read from user
    /// input. Zero and negative sizes are rejected.
    pub fn try_from_signed(capacity: i64) -> Result<Self, MapError> {
        let capacity = usize::try_from(capacity).map_err(|_| MapError::InvalidArgument)?;
        Self::new(capacity)
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Number of entries currently stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.items
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.items == self.capacity()
    }

    /// Ratio of stored entries to capacity, in `[0, 1]`.
    pub fn load_factor(&self) -> f64 {
        self.items as f64 / self.capacity() as f64
    }

    /// Associate `value` with `key`, reporting why on failure.
    ///
    /// An existing association is never overwritten. On any error the map is
    /// left exactly as it was and `value` is dropped.
    pub fn try_associate(&mut self, key: &str, value: V) -> Result<(), MapError> {
        if self.is_full() {
            debug_log!(capacity = self.capacity(), "associate rejected: map full");
            return Err(MapError::CapacityExhausted);
        }
        let digest = key_digest(key);
        let idx = self.arena.allocate(digest, value)?;
        match self.arena.insert(idx, self.root) {
            Ok(root) => {
                self.root = root;
                self.items += 1;
                Ok(())
            }
            Err(err) => {
                debug_log!(key, digest, "associate rejected: key already used");
                self.arena.release(idx);
                Err(err)
            }
        }
    }

    /// Associate `value` with `key`. Returns `false` if the map is full or
    /// the key (or a colliding key) is already present.
    pub fn associate(&mut self, key: &str, value: V) -> bool {
        self.try_associate(key, value).is_ok()
    }

    pub fn lookup(&self, key: &str) -> Option<&V> {
        let idx = self.find(key)?;
        self.arena[idx].value.as_ref()
    }

    pub fn lookup_mut(&mut self, key: &str) -> Option<&mut V> {
        let idx = self.find(key)?;
        self.arena[idx].value.as_mut()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    /// Remove `key` and return the value it was associated with.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        if self.is_empty() {
            return None;
        }
        let (root, vacated) = self.arena.remove(key_digest(key), self.root);
        let vacated = vacated?;
        self.root = root;
        self.items -= 1;
        self.arena.release(vacated)
    }

    /// Drop every entry. Capacity is kept.
    pub fn clear(&mut self) {
        let released = self.arena.release_subtree(self.root);
        debug_assert_eq!(released, self.items);
        debug_log!(released, "cleared");
        self.root = SlotIdx::NONE;
        self.items = 0;
        debug_assert_eq!(self.arena.free.count_occupied(), 0);
    }

    /// Pre-order listing of the tree with each node's slot, digest, value
    /// and height. For diagnostics only; the format is not stable.
    pub fn dump(&self) -> Dump<'_, V> {
        Dump {
            arena: &self.arena,
            root: self.root,
        }
    }

    fn find(&self, key: &str) -> Option<SlotIdx> {
        if self.is_empty() {
            return None;
        }
        let idx = self.arena.find(key_digest(key), self.root);
        idx.is_some().then_some(idx)
    }
}

impl<V: std::fmt::Debug> std::fmt::Debug for FixedSizeMap<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        self.arena.visit_preorder(self.root, 0, &mut |_, slot, _| {
            if let Some(v) = &slot.value {
                map.entry(&slot.key, v);
            }
        });
        map.finish()
    }
}


#[cfg(test)]
mod proptests;
