use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::HashMap;

use crate::slots::SlotArena;

/// Walk the subtree at `i`, checking ordering, balance and stored heights.
/// Returns the subtree height.
fn validate_subtree<V>(
    a: &SlotArena<V>,
    i: SlotIdx,
    lo: Option<i32>,
    hi: Option<i32>,
    reachable: &mut usize,
) -> i32 {
    if i.is_none() {
        return -1;
    }
    *reachable += 1;

    let slot = &a[i];
    assert!(a.free.is_occupied(i), "reachable slot must be marked occupied");
    assert!(slot.value.is_some(), "reachable slot must hold a value");
    if let Some(lo) = lo {
        assert!(slot.key > lo, "BST order violated: {} <= {lo}", slot.key);
    }
    if let Some(hi) = hi {
        assert!(slot.key < hi, "BST order violated: {} >= {hi}", slot.key);
    }

    let hl = validate_subtree(a, slot.left, lo, Some(slot.key), reachable);
    let hr = validate_subtree(a, slot.right, Some(slot.key), hi, reachable);
    assert!((hl - hr).abs() <= 1, "unbalanced at slot {}: {hl} vs {hr}", i.get());
    assert_eq!(slot.height, 1 + hl.max(hr), "stored height must match children");
    slot.height
}

fn validate_map<V>(m: &FixedSizeMap<V>) {
    assert_eq!(m.root.is_none(), m.items == 0, "root is none iff map is empty");

    let mut reachable = 0usize;
    validate_subtree(&m.arena, m.root, None, None, &mut reachable);
    assert_eq!(reachable, m.items, "reachable count must match len");
    assert_eq!(
        m.arena.free.count_occupied(),
        m.items,
        "occupied bits must match len"
    );

    for i in 0..m.capacity() {
        let idx = SlotIdx::new(i);
        assert_eq!(
            m.arena.free.is_occupied(idx),
            m.arena[idx].value.is_some(),
            "occupied bit and value presence disagree at slot {i}"
        );
    }
}

fn key_strategy() -> impl Strategy<Value = String> {
    // Small alphabet so duplicates are frequent; "Aa"/"BB" force a collision.
    prop_oneof![
        20 => "[a-f]{0,3}",
        1 => Just("Aa".to_string()),
        1 => Just("BB".to_string()),
    ]
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 50)]
    Associate(#[proptest(strategy = "key_strategy()")] String, u32),
    #[proptest(weight = 25)]
    Remove(#[proptest(strategy = "key_strategy()")] String),
    #[proptest(weight = 24)]
    Lookup(#[proptest(strategy = "key_strategy()")] String),
    #[proptest(weight = 1)]
    Clear,
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(capacity in 1usize..=64, ops in prop::collection::vec(any::<Op>(), 0..=1000)) {
        let mut m: FixedSizeMap<u32> = FixedSizeMap::new(capacity).unwrap();
        let mut model: HashMap<i32, u32> = HashMap::new();

        for op in ops {
            match op {
                Op::Associate(key, value) => {
                    let digest = key_digest(&key);
                    let expected = if model.len() == capacity {
                        Err(MapError::CapacityExhausted)
                    } else if model.contains_key(&digest) {
                        Err(MapError::DuplicateKey)
                    } else {
                        model.insert(digest, value);
                        Ok(())
                    };
                    prop_assert_eq!(m.try_associate(&key, value), expected);
                }
                Op::Remove(key) => {
                    prop_assert_eq!(m.remove(&key), model.remove(&key_digest(&key)));
                }
                Op::Lookup(key) => {
                    prop_assert_eq!(m.lookup(&key), model.get(&key_digest(&key)));
                }
                Op::Clear => {
                    m.clear();
                    model.clear();
                }
            }

            prop_assert_eq!(m.len(), model.len());
            prop_assert_eq!(m.load_factor(), m.len() as f64 / m.capacity() as f64);
            prop_assert!((0.0..=1.0).contains(&m.load_factor()));
            validate_map(&m);
        }
    }

    #[test]
    fn prop_remove_returns_associated(keys in prop::collection::hash_set("[a-z]{1,8}", 1..200)) {
        let keys: Vec<String> = keys.into_iter().collect();
        let mut m: FixedSizeMap<String> = FixedSizeMap::new(keys.len()).unwrap();
        let mut stored = Vec::new();
        for k in &keys {
            if m.associate(k, k.to_uppercase()) {
                stored.push(k);
            }
        }
        validate_map(&m);

        for k in stored {
            let before = m.len();
            prop_assert_eq!(m.remove(k), Some(k.to_uppercase()));
            prop_assert_eq!(m.len(), before - 1);
            prop_assert_eq!(m.remove(k), None);
            validate_map(&m);
        }
        prop_assert!(m.is_empty());
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

const SMALL_SET: [&str; 7] = ["a", "b", "c", "d", "e", "f", "g"];

#[test]
fn exhaustive_associate_order_small_set() {
    for_each_permutation(&SMALL_SET, |perm| {
        let mut m: FixedSizeMap<usize> = FixedSizeMap::new(SMALL_SET.len()).unwrap();
        for (i, k) in perm.iter().enumerate() {
            assert!(m.associate(k, i));
            validate_map(&m);
        }
        assert!(m.is_full());
        assert!(!m.associate("h", 0));
        for (i, k) in perm.iter().enumerate() {
            assert_eq!(m.lookup(k), Some(&i));
        }
    });
}

#[test]
fn exhaustive_remove_order_small_set() {
    // Associate in a fixed order, then remove in all permutations.
    for_each_permutation(&SMALL_SET, |perm| {
        let mut m: FixedSizeMap<&str> = FixedSizeMap::new(SMALL_SET.len()).unwrap();
        for k in SMALL_SET {
            assert!(m.associate(k, k));
        }

        for k in perm {
            assert_eq!(m.remove(k), Some(k));
            assert_eq!(m.lookup(k), None);
            validate_map(&m);
        }
        assert_eq!(m.len(), 0);
        assert!(m.root.is_none());
    });
}
