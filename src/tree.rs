//! AVL tree threaded through the slot arena.
//!
//! Every operation takes the root of the subtree it works on and returns the
//! (possibly new) root of that subtree. The caller owns the only copy of the
//! top-level root. Heights are stored per slot; `height(NONE) == -1`.

use std::cmp::Ordering;
use std::fmt;

use crate::error::MapError;
use crate::slots::{Slot, SlotArena, SlotIdx};
use crate::tracing_helpers::trace_log;

impl<V> SlotArena<V> {
    // =========================================================================
    // Height bookkeeping
    // =========================================================================

    #[inline]
    pub(crate) fn height(&self, i: SlotIdx) -> i32 {
        if i.is_none() {
            -1
        } else {
            self[i].height
        }
    }

    #[inline]
    fn update_height(&mut self, i: SlotIdx) {
        let h = 1 + self.height(self[i].left).max(self.height(self[i].right));
        self[i].height = h;
    }

    #[inline]
    pub(crate) fn balance_factor(&self, i: SlotIdx) -> i32 {
        self.height(self[i].left) - self.height(self[i].right)
    }

    // =========================================================================
    // Search
    // =========================================================================

    pub(crate) fn find(&self, key: i32, root: SlotIdx) -> SlotIdx {
        let mut cur = root;
        while cur.is_some() {
            cur = match key.cmp(&self[cur].key) {
                Ordering::Less => self[cur].left,
                Ordering::Greater => self[cur].right,
                Ordering::Equal => return cur,
            };
        }
        SlotIdx::NONE
    }

    fn min(&self, root: SlotIdx) -> SlotIdx {
        let mut cur = root;
        while self[cur].left.is_some() {
            cur = self[cur].left;
        }
        cur
    }

    // =========================================================================
    // Insert
    // =========================================================================

    /// Link the detached leaf `new` into the subtree at `root`.
    ///
    /// On `DuplicateKey` nothing in the tree has been touched; `new` is still
    /// detached and the caller must release it.
    pub(crate) fn insert(&mut self, new: SlotIdx, root: SlotIdx) -> Result<SlotIdx, MapError> {
        if root.is_none() {
            return Ok(new);
        }
        match self[new].key.cmp(&self[root].key) {
            Ordering::Less => {
                let left = self.insert(new, self[root].left)?;
                self[root].left = left;
            }
            Ordering::Greater => {
                let right = self.insert(new, self[root].right)?;
                self[root].right = right;
            }
            Ordering::Equal => return Err(MapError::DuplicateKey),
        }
        Ok(self.rebalance(root))
    }

    // =========================================================================
    // Remove
    // =========================================================================

    /// Unlink the node holding `key` from the subtree at `root`.
    ///
    /// Returns the new subtree root and the slot that was vacated. The vacated
    /// slot always carries the removed value: when the target has two
    /// children its payload is swapped with its in-order successor, and the
    /// successor's old slot is the one unlinked. `None` means `key` was absent
    /// and the subtree is untouched.
    pub(crate) fn remove(&mut self, key: i32, root: SlotIdx) -> (SlotIdx, Option<SlotIdx>) {
        if root.is_none() {
            return (root, None);
        }
        let vacated = match key.cmp(&self[root].key) {
            Ordering::Less => {
                let (left, vacated) = self.remove(key, self[root].left);
                self[root].left = left;
                vacated
            }
            Ordering::Greater => {
                let (right, vacated) = self.remove(key, self[root].right);
                self[root].right = right;
                vacated
            }
            Ordering::Equal => {
                let (left, right) = (self[root].left, self[root].right);
                if left.is_none() || right.is_none() {
                    let child = if left.is_none() { right } else { left };
                    return (child, Some(root));
                }
                let succ = self.min(right);
                self.swap_payload(root, succ);
                // `key` now sits at the leftmost position of the right subtree.
                let (right, vacated) = self.remove(key, right);
                self[root].right = right;
                vacated
            }
        };
        match vacated {
            Some(_) => (self.rebalance(root), vacated),
            None => (root, None),
        }
    }

    fn swap_payload(&mut self, a: SlotIdx, b: SlotIdx) {
        let (key_b, value_b) = (self[b].key, self[b].value.take());
        self[b].key = self[a].key;
        self[b].value = self[a].value.take();
        self[a].key = key_b;
        self[a].value = value_b;
    }

    // =========================================================================
    // Rebalancing
    // =========================================================================

    /// Restore the AVL invariant at `i`, assuming both subtrees already hold it.
    pub(crate) fn rebalance(&mut self, i: SlotIdx) -> SlotIdx {
        let bf = self.balance_factor(i);
        if bf > 1 {
            let l = self[i].left;
            if self.height(self[l].left) >= self.height(self[l].right) {
                self.rotate_ll(i)
            } else {
                self.rotate_lr(i)
            }
        } else if bf < -1 {
            let r = self[i].right;
            if self.height(self[r].right) >= self.height(self[r].left) {
                self.rotate_rr(i)
            } else {
                self.rotate_rl(i)
            }
        } else {
            self.update_height(i);
            i
        }
    }

    /// Single right rotation: the left child becomes the subtree root.
    fn rotate_ll(&mut self, i: SlotIdx) -> SlotIdx {
        trace_log!(node = i.get(), "rotate LL");
        let pivot = self[i].left;
        self[i].left = self[pivot].right;
        self[pivot].right = i;
        self.update_height(i);
        self.update_height(pivot);
        pivot
    }

    /// Single left rotation: the right child becomes the subtree root.
    fn rotate_rr(&mut self, i: SlotIdx) -> SlotIdx {
        trace_log!(node = i.get(), "rotate RR");
        let pivot = self[i].right;
        self[i].right = self[pivot].left;
        self[pivot].left = i;
        self.update_height(i);
        self.update_height(pivot);
        pivot
    }

    fn rotate_lr(&mut self, i: SlotIdx) -> SlotIdx {
        trace_log!(node = i.get(), "rotate LR");
        let left = self.rotate_rr(self[i].left);
        self[i].left = left;
        self.rotate_ll(i)
    }

    fn rotate_rl(&mut self, i: SlotIdx) -> SlotIdx {
        trace_log!(node = i.get(), "rotate RL");
        let right = self.rotate_ll(self[i].right);
        self[i].right = right;
        self.rotate_rr(i)
    }

    // =========================================================================
    // Whole-tree walks
    // =========================================================================

    /// Release every slot under `root` children-first. Returns how many.
    pub(crate) fn release_subtree(&mut self, root: SlotIdx) -> usize {
        if root.is_none() {
            return 0;
        }
        let (left, right) = (self[root].left, self[root].right);
        let n = self.release_subtree(left) + self.release_subtree(right);
        self.release(root);
        n + 1
    }

    /// Pre-order walk handing each node its slot index and depth.
    pub(crate) fn visit_preorder<F>(&self, root: SlotIdx, depth: usize, f: &mut F)
    where
        F: FnMut(SlotIdx, &Slot<V>, usize),
    {
        if root.is_none() {
            return;
        }
        f(root, &self[root], depth);
        self.visit_preorder(self[root].left, depth + 1, f);
        self.visit_preorder(self[root].right, depth + 1, f);
    }
}

/// Human-readable pre-order listing returned by
/// [`FixedSizeMap::dump`](crate::FixedSizeMap::dump).
pub struct Dump<'a, V> {
    pub(crate) arena: &'a SlotArena<V>,
    pub(crate) root: SlotIdx,
}

impl<V: fmt::Display> fmt::Display for Dump<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.root.is_none() {
            return writeln!(f, "(empty)");
        }
        let mut res = Ok(());
        self.arena.visit_preorder(self.root, 0, &mut |idx, slot, depth| {
            if res.is_ok() {
                res = match &slot.value {
                    Some(v) => writeln!(
                        f,
                        "{:indent$}[{}] key={} value={} height={}",
                        "",
                        idx.get(),
                        slot.key,
                        v,
                        slot.height,
                        indent = depth * 2
                    ),
                    None => writeln!(f, "{:indent$}[{}] <free>", "", idx.get(), indent = depth * 2),
                };
            }
        });
        res
    }
}
