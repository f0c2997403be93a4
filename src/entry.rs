//! Stored entries and hash-segment arithmetic.

/// Number of hash bits the trie can consume before a leaf becomes forced.
pub const HASH_BITS: u32 = 32;

/// A stored key/value pair together with the 32-bit hash it was filed
/// under. The hash is computed once, at the facade, and never recomputed:
/// all routing and equality checks below the facade use the stored value,
/// so `K: Hash` is never invoked after insertion.
#[derive(Debug, Clone)]
pub struct Entry<K, V> {
    /// Precomputed hash of `key`.
    pub hash: u32,
    /// The key.
    pub key: K,
    /// The value.
    pub value: V,
}

impl<K, V> Entry<K, V> {
    pub fn new(hash: u32, key: K, value: V) -> Self {
        Self { hash, key, value }
    }
}

/// Extracts the child index for `depth`: a disjoint `resolution`-bit slice
/// of the hash, bits `[depth * resolution, (depth + 1) * resolution)`.
/// Disjoint slices are what make sibling subtrees partition the hash space
/// without overlap.
///
/// Callers guarantee `depth * resolution < 32` (deeper nodes are forced
/// leaves and never index children).
#[inline]
pub fn hash_segment(hash: u32, depth: u32, resolution: u32) -> usize {
    let mask = u32::MAX >> (HASH_BITS - resolution);
    ((hash >> (depth * resolution)) & mask) as usize
}

/// True when `depth` has consumed every hash bit: the node can no longer
/// subdivide and must store entries directly regardless of thresholds.
#[inline]
pub fn is_forced_leaf(depth: u32, resolution: u32) -> bool {
    depth * resolution >= HASH_BITS
}
