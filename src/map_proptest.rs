#![cfg(test)]

// Property tests for HashTrieMap kept inside the crate so they can drive
// random trie configurations alongside random operation sequences.

use crate::config::TrieConfig;
use crate::map::{HashTrieMap, InsertError};
use proptest::prelude::*;
use std::collections::hash_map::RandomState;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations to improve shrinking: indices shrink to earlier
// keys, pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Set(usize, i32),
    Remove(usize),
    Get(usize),
    Contains(String),
    Mutate(usize, i32),
    Iterate,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_config() -> impl Strategy<Value = TrieConfig> {
    (1u32..=8, 1usize..=6).prop_flat_map(|(resolution, expansion)| {
        (0..expansion).prop_map(move |collapse| {
            TrieConfig::new(resolution, expansion, collapse).unwrap()
        })
    })
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Set(i, v)),
            idx.clone().prop_map(OpI::Remove),
            idx.clone().prop_map(OpI::Get),
            prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn run_scenario<S>(
    config: TrieConfig,
    hasher: S,
    pool: Vec<String>,
    ops: Vec<OpI>,
) -> Result<(), TestCaseError>
where
    S: BuildHasher,
{
    let mut sut: HashTrieMap<Key, i32, S> = HashTrieMap::with_config_and_hasher(config, hasher);
    let mut model: HashMap<Key, i32> = HashMap::new();

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(&pool, i);
                let already = model.contains_key(&k);
                match sut.insert(k.clone(), v) {
                    Ok(()) => {
                        prop_assert!(!already, "insert must fail on duplicate");
                        model.insert(k, v);
                    }
                    Err(InsertError::DuplicateKey) => {
                        prop_assert!(already, "duplicate error only when key exists");
                        // Value must be untouched by the rejected insert.
                        prop_assert_eq!(sut.get(k.0.as_str()), model.get(&k));
                    }
                }
            }
            OpI::Set(i, v) => {
                let k = key_from(&pool, i);
                let prev = sut.set(k.clone(), v);
                prop_assert_eq!(prev, model.insert(k, v));
            }
            OpI::Remove(i) => {
                let k = key_from(&pool, i);
                let removed = sut.remove(k.0.as_str());
                prop_assert_eq!(removed, model.remove(&k));
            }
            OpI::Get(i) => {
                let k = key_from(&pool, i);
                prop_assert_eq!(sut.get(k.0.as_str()), model.get(&k));
                prop_assert_eq!(sut.contains_key(k.0.as_str()), model.contains_key(&k));
            }
            OpI::Contains(s) => {
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(sut.contains_key(s.as_str()), has_model);
            }
            OpI::Mutate(i, d) => {
                let k = key_from(&pool, i);
                match sut.get_mut(k.0.as_str()) {
                    Some(v) => {
                        *v = v.saturating_add(d);
                        let mv = model.get_mut(&k);
                        prop_assert!(mv.is_some(), "present in sut but not model");
                        if let Some(mv) = mv {
                            *mv = mv.saturating_add(d);
                        }
                    }
                    None => prop_assert!(!model.contains_key(&k)),
                }
            }
            OpI::Iterate => {
                let s_pairs: BTreeSet<(Key, i32)> =
                    sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                let m_pairs: BTreeSet<(Key, i32)> =
                    model.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(s_pairs, m_pairs);
            }
        }

        // Post-conditions after each op: count invariant in both forms.
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert_eq!(sut.iter().count(), model.len());
    }

    // Draining the map must restore the empty shape regardless of which
    // extend/collapse transitions fired along the way.
    let keys: Vec<Key> = model.keys().cloned().collect();
    for k in keys {
        prop_assert!(sut.remove(k.0.as_str()).is_some());
    }
    prop_assert!(sut.is_empty());
    prop_assert_eq!(sut.node_count(), 1);
    prop_assert!(sut.root_is_leaf());
    Ok(())
}

// Property: state-machine equivalence against std::collections::HashMap
// across random trie configurations. Invariants exercised:
// - Duplicate keys rejected without altering the existing value.
// - `set` returns the previous value; count unchanged on overwrite.
// - `get`/`contains_key`/`remove` parity with the model after every op.
// - Iteration yields exactly the model's pair set.
// - `len` equals the iterated entry count after every op.
// - Removing every key restores the single-node empty shape.
proptest! {
    #![proptest_config(ProptestConfig { cases: 96, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(config in arb_config(), (pool, ops) in arb_scenario()) {
        run_scenario(config, RandomState::new(), pool, ops)?;
    }
}

// Collision variant using a constant hasher: every key shares one trie
// path, so inserts repeatedly push the same forced-leaf chain and removals
// cascade collapses through it.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 48, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions(config in arb_config(), (pool, ops) in arb_scenario()) {
        run_scenario(config, ConstBuildHasher, pool, ops)?;
    }
}
