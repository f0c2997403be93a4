// HashTrieMap integration suite.
//
// Each test documents what behavior is being verified and which invariants
// are assumed or asserted. The core invariants exercised:
// - Round trip: every inserted key stays retrievable with its value until
//   removed, across all threshold/resolution configurations.
// - Count: len() equals successful inserts minus successful removes and
//   equals the number of iterated entries.
// - Shape: leaves extend exactly when they would reach the expansion
//   threshold; sparse subtrees collapse back; draining restores the
//   single-bucket empty shape.
// - Collisions: identical hashes terminate in a forced leaf and resolve
//   by key equality.
use hashtrie::{HashTrieMap, InsertError, TrieConfig};
use std::hash::{BuildHasher, Hasher};

// Routes u32 keys by their own bits, so tests can steer entries into
// chosen hash segments.
#[derive(Clone, Default)]
struct IdentityBuildHasher;
struct IdentityHasher(u64);
impl BuildHasher for IdentityBuildHasher {
    type Hasher = IdentityHasher;
    fn build_hasher(&self) -> Self::Hasher {
        IdentityHasher(0)
    }
}
impl Hasher for IdentityHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = (self.0 << 8) | u64::from(b);
        }
    }
    fn write_u32(&mut self, n: u32) {
        self.0 = u64::from(n);
    }
    fn finish(&self) -> u64 {
        self.0
    }
}

fn steered(config: TrieConfig) -> HashTrieMap<u32, i32, IdentityBuildHasher> {
    HashTrieMap::with_config_and_hasher(config, IdentityBuildHasher)
}

// Test: the threshold boundary scenario.
// Assumes: expansion 2, collapse 0, resolution 4; keys 0x1 and 0x2 differ
// in their first 4-bit segment.
// Verifies: the second insert flips the root from leaf to internal; the
// removal collapses it back.
#[test]
fn threshold_boundary_root_transitions() {
    let mut m = steered(TrieConfig::new(4, 2, 0).unwrap());
    assert!(m.root_is_leaf());

    m.insert(0x1, 10).unwrap();
    assert!(m.root_is_leaf());
    assert_eq!(m.node_count(), 1);

    m.insert(0x2, 20).unwrap();
    assert!(!m.root_is_leaf());
    assert!(m.node_count() > 1);
    assert_eq!(m.get(&0x1), Some(&10));
    assert_eq!(m.get(&0x2), Some(&20));

    assert_eq!(m.remove(&0x2), Some(20));
    assert!(m.root_is_leaf());
    assert_eq!(m.node_count(), 1);
    assert_eq!(m.get(&0x1), Some(&10));
}

// Test: keys sharing leading segments subdivide deeper before separating.
// Assumes: 0x01 and 0x11 share the first 4-bit segment and differ in the
// second.
// Verifies: both stay retrievable; the trie allocates a second level.
#[test]
fn shared_prefix_splits_one_level_down() {
    let mut m = steered(TrieConfig::new(4, 2, 0).unwrap());
    m.insert(0x01, 1).unwrap();
    m.insert(0x11, 2).unwrap();
    // root -> child for segment 1 -> two grandchildren
    assert_eq!(m.node_count(), 4);
    assert_eq!(m.get(&0x01), Some(&1));
    assert_eq!(m.get(&0x11), Some(&2));
}

// Test: round trip across resolutions with aggressive thresholds.
// Verifies: all keys found with their values; draining in insertion order
// restores the empty single-bucket shape.
#[test]
fn round_trip_across_resolutions() {
    // Resolution 32 is a valid configuration but extends into a 2^32-slot
    // child array; keep the sweep to practical widths.
    for resolution in [1u32, 2, 4, 8, 16] {
        let mut m = steered(TrieConfig::new(resolution, 2, 0).unwrap());
        for i in 0..300u32 {
            // Bit-spread keys so segments vary at every level.
            m.insert(i.wrapping_mul(0x9E37_79B9), i as i32).unwrap();
        }
        assert_eq!(m.len(), 300, "resolution {resolution}");
        for i in 0..300u32 {
            assert_eq!(
                m.get(&i.wrapping_mul(0x9E37_79B9)),
                Some(&(i as i32)),
                "resolution {resolution}, key {i}"
            );
        }
        assert_eq!(m.iter().count(), 300);

        for i in 0..300u32 {
            assert_eq!(m.remove(&i.wrapping_mul(0x9E37_79B9)), Some(i as i32));
        }
        assert!(m.is_empty());
        assert_eq!(m.node_count(), 1, "resolution {resolution}");
        assert!(m.root_is_leaf());
    }
}

// Test: expansion threshold 1 tolerates no non-forced leaves.
// Verifies: a single entry already subdivides down to the forced depth,
// and lookups still work.
#[test]
fn expansion_threshold_one() {
    let mut m = steered(TrieConfig::new(8, 1, 0).unwrap());
    m.insert(0xAB, 1).unwrap();
    assert!(!m.root_is_leaf());
    assert_eq!(m.node_count(), 1 + 32 / 8);
    assert_eq!(m.get(&0xAB), Some(&1));
    assert_eq!(m.len(), 1);

    assert_eq!(m.remove(&0xAB), Some(1));
    assert!(m.root_is_leaf());
    assert_eq!(m.node_count(), 1);
}

// Test: fully colliding hashes (constant hasher) cannot subdivide forever.
// Verifies: the chain stops at the forced depth (32 / resolution levels),
// every key resolves by equality, and draining collapses the chain.
#[test]
fn constant_hashes_terminate_and_resolve() {
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

    let config = TrieConfig::new(4, 2, 0).unwrap();
    let mut m: HashTrieMap<String, i32, ConstBuildHasher> =
        HashTrieMap::with_config_and_hasher(config, ConstBuildHasher);
    for i in 0..5 {
        m.insert(format!("k{i}"), i).unwrap();
    }
    // One chain from the root to the forced leaf at depth 8.
    assert_eq!(m.node_count(), 9);
    for i in 0..5 {
        assert_eq!(m.get(format!("k{i}").as_str()), Some(&i));
    }

    for i in 0..5 {
        assert_eq!(m.remove(format!("k{i}").as_str()), Some(i));
    }
    assert!(m.is_empty());
    assert_eq!(m.node_count(), 1);
}

// Test: len()/is_empty() reflect live entries, unaffected by rejected
// duplicate inserts, updated by removals (mirrors the count invariant).
#[test]
fn len_and_is_empty_behaviors() {
    let mut m: HashTrieMap<String, i32> = HashTrieMap::new();
    assert_eq!(m.len(), 0);
    assert!(m.is_empty());

    m.insert("a".to_string(), 1).unwrap();
    assert_eq!(m.len(), 1);

    match m.insert("a".to_string(), 2) {
        Err(InsertError::DuplicateKey) => {}
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(m.len(), 1);
    assert_eq!(m.get("a"), Some(&1));

    m.insert("b".to_string(), 2).unwrap();
    assert_eq!(m.len(), 2);

    assert_eq!(m.remove("a"), Some(1));
    assert_eq!(m.len(), 1);
    assert_eq!(m.remove("b"), Some(2));
    assert!(m.is_empty());
    assert_eq!(m.remove("b"), None);
}

// Test: overwrite scenario. set twice, get returns the second value and
// count is unchanged between the assignments.
#[test]
fn overwrite_keeps_count_stable() {
    let mut m: HashTrieMap<String, i32> = HashTrieMap::new();
    assert_eq!(m.set("key".to_string(), 1), None);
    let len_after_first = m.len();
    let nodes_after_first = m.node_count();

    assert_eq!(m.set("key".to_string(), 2), Some(1));
    assert_eq!(m.len(), len_after_first);
    assert_eq!(m.node_count(), nodes_after_first);
    assert_eq!(m.get("key"), Some(&2));
}

#[test]
fn remove_entry_and_get_key_value() {
    let mut m: HashTrieMap<String, i32> = HashTrieMap::new();
    m.insert("k".to_string(), 9).unwrap();

    let (k, v) = m.get_key_value("k").unwrap();
    assert_eq!((k.as_str(), *v), ("k", 9));

    let (k, v) = m.remove_entry("k").unwrap();
    assert_eq!((k.as_str(), v), ("k", 9));
    assert!(m.remove_entry("k").is_none());
}

// Test: clear drops everything at once and the map stays usable.
#[test]
fn clear_then_reuse() {
    let mut m = steered(TrieConfig::new(2, 2, 0).unwrap());
    for i in 0..100u32 {
        m.insert(i, i as i32).unwrap();
    }
    assert!(!m.root_is_leaf());

    m.clear();
    assert!(m.is_empty());
    assert_eq!(m.node_count(), 1);
    assert_eq!(m.get(&1), None);

    m.insert(1, 1).unwrap();
    assert_eq!(m.len(), 1);
    assert_eq!(m.get(&1), Some(&1));
}

// Test: removals in an order unrelated to insertion order still drain to
// the empty shape (extend/collapse ordering must not matter).
#[test]
fn drain_in_scrambled_order() {
    let mut m = steered(TrieConfig::new(4, 3, 1).unwrap());
    let keys: Vec<u32> = (0..128u32).map(|i| i.rotate_left(11) ^ 0x5A5A).collect();
    for (i, &k) in keys.iter().enumerate() {
        m.insert(k, i as i32).unwrap();
    }

    // Stride through the key list with a step coprime to its length.
    let mut idx = 0usize;
    for _ in 0..keys.len() {
        idx = (idx + 61) % keys.len();
        assert!(m.remove(&keys[idx]).is_some());
    }
    assert!(m.is_empty());
    assert_eq!(m.iter().count(), 0);
    assert_eq!(m.node_count(), 1);
    assert!(m.root_is_leaf());
}

#[test]
fn get_mut_and_iter_mut() {
    let mut m: HashTrieMap<String, i32> = HashTrieMap::new();
    for i in 0..10 {
        m.insert(format!("k{i}"), i).unwrap();
    }

    *m.get_mut("k3").unwrap() += 100;
    assert_eq!(m.get("k3"), Some(&103));
    assert!(m.get_mut("missing").is_none());

    for (_k, v) in m.iter_mut() {
        *v += 1;
    }
    assert_eq!(m.get("k3"), Some(&104));
    assert_eq!(m.get("k0"), Some(&1));
}
