//! Fixed slot storage and the bitmap allocator that hands slots out.
//!
//! The arena is a single boxed slice sized at construction and never
//! reallocated. Slots refer to each other by [`SlotIdx`], never by pointer.

use std::ops::{Index, IndexMut};

use crate::error::MapError;

// =============================================================================
// Slot handle
// =============================================================================

/// Index of a slot in the arena. `NONE` marks an absent child or empty tree.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct SlotIdx(u32);

impl SlotIdx {
    pub(crate) const NONE: SlotIdx = SlotIdx(u32::MAX);

    #[inline]
    pub(crate) fn new(i: usize) -> Self {
        debug_assert!(i < u32::MAX as usize);
        Self(i as u32)
    }

    #[inline]
    pub(crate) fn is_none(self) -> bool {
        self.0 == Self::NONE.0
    }

    #[inline]
    pub(crate) fn is_some(self) -> bool {
        !self.is_none()
    }

    #[inline]
    pub(crate) fn get(self) -> usize {
        debug_assert!(self.is_some());
        self.0 as usize
    }
}

/// Largest capacity a handle can address (`u32::MAX` is reserved for `NONE`).
pub(crate) const MAX_SLOTS: usize = u32::MAX as usize;

// =============================================================================
// Slot
// =============================================================================

/// One arena cell. Fields other than `value` are meaningless while free.
pub(crate) struct Slot<V> {
    pub(crate) key: i32,
    pub(crate) value: Option<V>,
    /// Height of the subtree rooted here; a leaf is 0.
    pub(crate) height: i32,
    pub(crate) left: SlotIdx,
    pub(crate) right: SlotIdx,
}

impl<V> Slot<V> {
    fn empty() -> Self {
        Self {
            key: 0,
            value: None,
            height: 0,
            left: SlotIdx::NONE,
            right: SlotIdx::NONE,
        }
    }

    /// Reset to the empty sentinel, handing back whatever value was held.
    fn clean(&mut self) -> Option<V> {
        self.key = 0;
        self.height = 0;
        self.left = SlotIdx::NONE;
        self.right = SlotIdx::NONE;
        self.value.take()
    }
}

// =============================================================================
// Free-slot bitmap
// =============================================================================

/// One bit per slot, set while occupied.
///
/// Bits past `capacity` in the last word are permanently set so the scan
/// never hands them out. Every word below `first_free_word` is full, which
/// makes "lowest free index" a forward scan that usually stops immediately.
pub(crate) struct SlotBitmap {
    words: Box<[u64]>,
    first_free_word: usize,
    padding: u32,
}

impl SlotBitmap {
    fn new(capacity: usize) -> Self {
        let n = capacity.div_ceil(64);
        let mut words = vec![0u64; n].into_boxed_slice();
        let tail = capacity % 64;
        let padding = if tail == 0 {
            0
        } else {
            words[n - 1] = !0u64 << tail;
            (64 - tail) as u32
        };
        Self {
            words,
            first_free_word: 0,
            padding,
        }
    }

    /// Claim the lowest free index.
    pub(crate) fn allocate(&mut self) -> Result<SlotIdx, MapError> {
        let mut w = self.first_free_word;
        while w < self.words.len() {
            let word = self.words[w];
            if word != u64::MAX {
                let bit = (!word).trailing_zeros() as usize;
                self.words[w] = word | (1u64 << bit);
                self.first_free_word = w;
                return Ok(SlotIdx::new(w * 64 + bit));
            }
            w += 1;
        }
        self.first_free_word = w;
        Err(MapError::CapacityExhausted)
    }

    /// Clear the bit for `idx`. The caller guarantees `idx` is occupied.
    pub(crate) fn release(&mut self, idx: SlotIdx) {
        debug_assert!(self.is_occupied(idx), "releasing a free slot");
        let i = idx.get();
        let (w, bit) = (i / 64, i % 64);
        self.words[w] &= !(1u64 << bit);
        self.first_free_word = self.first_free_word.min(w);
    }

    #[inline]
    pub(crate) fn is_occupied(&self, idx: SlotIdx) -> bool {
        let i = idx.get();
        self.words[i / 64] & (1u64 << (i % 64)) != 0
    }

    pub(crate) fn count_occupied(&self) -> usize {
        let ones: usize = self.words.iter().map(|w| w.count_ones() as usize).sum();
        ones - self.padding as usize
    }
}

// =============================================================================
// Arena
// =============================================================================

/// The slot array plus its allocator. Tree operations live in `tree.rs`.
pub(crate) struct SlotArena<V> {
    slots: Box<[Slot<V>]>,
    pub(crate) free: SlotBitmap,
}

impl<V> SlotArena<V> {
    pub(crate) fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0 && capacity <= MAX_SLOTS);
        Self {
            slots: (0..capacity).map(|_| Slot::empty()).collect(),
            free: SlotBitmap::new(capacity),
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Claim a slot and fill it as a detached leaf.
    pub(crate) fn allocate(&mut self, key: i32, value: V) -> Result<SlotIdx, MapError> {
        let idx = self.free.allocate()?;
        let slot = &mut self[idx];
        debug_assert!(slot.value.is_none(), "free slot still holds a value");
        slot.key = key;
        slot.value = Some(value);
        slot.height = 0;
        slot.left = SlotIdx::NONE;
        slot.right = SlotIdx::NONE;
        Ok(idx)
    }

    /// Return a slot to the allocator, cleaning it and yielding its value.
    pub(crate) fn release(&mut self, idx: SlotIdx) -> Option<V> {
        self.free.release(idx);
        self[idx].clean()
    }
}

impl<V> Index<SlotIdx> for SlotArena<V> {
    type Output = Slot<V>;

    #[inline]
    fn index(&self, idx: SlotIdx) -> &Slot<V> {
        &self.slots[idx.get()]
    }
}

impl<V> IndexMut<SlotIdx> for SlotArena<V> {
    #[inline]
    fn index_mut(&mut self, idx: SlotIdx) -> &mut Slot<V> {
        &mut self.slots[idx.get()]
    }
}
