//! HashTrieMap: the public dictionary facade over [`BucketTree`].
//!
//! This layer owns the hashing policy: each key is hashed exactly once, at
//! the boundary, into the 32 bits the trie routes on; everything below
//! works from the stored hash and `K: Eq`. `K: Hash` is never invoked
//! after insertion.

use crate::bucket::{self, BucketTree};
use crate::config::TrieConfig;
use crate::entry::Entry;
use crate::leaf::{LeafStore, VecLeaf};
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use core::ops::Index;
use std::collections::hash_map::RandomState;

/// Failure to add a key that is already present.
#[derive(Debug)]
pub enum InsertError {
    DuplicateKey,
}

/// An adaptive hash-trie map.
///
/// Keys are partitioned by successive `resolution`-bit segments of their
/// hash; densely populated regions subdivide into subtries and sparse
/// regions collapse back into flat leaves, per the thresholds in
/// [`TrieConfig`]. Not internally synchronized: exclusive access is
/// enforced the ordinary way, through `&mut self` on every mutating
/// operation, and iterators borrow the map so the structure cannot change
/// mid-enumeration.
pub struct HashTrieMap<K, V, S = RandomState, L = VecLeaf<K, V>> {
    tree: BucketTree<K, V, L>,
    hasher: S,
}

impl<K, V> HashTrieMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_config(TrieConfig::default())
    }

    pub fn with_config(config: TrieConfig) -> Self {
        Self::with_config_and_hasher(config, RandomState::new())
    }
}

impl<K, V> Default for HashTrieMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S, L> HashTrieMap<K, V, S, L>
where
    K: Eq + Hash,
    S: BuildHasher,
    L: LeafStore<K, V>,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_config_and_hasher(TrieConfig::default(), hasher)
    }

    pub fn with_config_and_hasher(config: TrieConfig, hasher: S) -> Self {
        Self {
            tree: BucketTree::new(config),
            hasher,
        }
    }

    fn make_hash<Q>(&self, q: &Q) -> u32
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q) as u32
    }

    pub fn config(&self) -> &TrieConfig {
        self.tree.config()
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Adds a new key, failing on a duplicate without altering the
    /// existing entry or the trie shape.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), InsertError> {
        let hash = self.make_hash(&key);
        if self.tree.insert(Entry::new(hash, key, value), true) {
            Ok(())
        } else {
            Err(InsertError::DuplicateKey)
        }
    }

    /// Overwriting assignment: replaces the value in place when the key is
    /// present (count and shape unchanged) and returns the previous value.
    pub fn set(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.make_hash(&key);
        self.tree.upsert(Entry::new(hash, key, value))
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.tree.get(self.make_hash(q), q).map(|e| &e.value)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.tree.get(self.make_hash(q), q).map(|e| (&e.key, &e.value))
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        self.tree.get_mut(hash, q).map(|e| &mut e.value)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.tree.get(self.make_hash(q), q).is_some()
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).map(|(_k, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        self.tree.remove(hash, q).map(|e| (e.key, e.value))
    }

    /// Key-and-value presence check, matching only when both agree.
    pub fn contains_pair<Q>(&self, q: &Q, value: &V) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: PartialEq,
    {
        self.tree
            .get(self.make_hash(q), q)
            .map(|e| e.value == *value)
            .unwrap_or(false)
    }

    /// Removes the entry only when both key and value match.
    pub fn remove_pair<Q>(&mut self, q: &Q, value: &V) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: PartialEq,
    {
        let hash = self.make_hash(q);
        match self.tree.get(hash, q) {
            Some(e) if e.value == *value => {}
            _ => return false,
        }
        self.tree.remove(hash, q).is_some()
    }

    /// Drops every entry, leaving a single empty root bucket.
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Iterates over all entries in some unspecified order (pre-order over
    /// the trie's leaves).
    pub fn iter(&self) -> Iter<'_, K, V, L> {
        Iter {
            inner: self.tree.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V, L> {
        IterMut {
            inner: self.tree.iter_mut(),
        }
    }

    /// Live trie nodes, root included. Diagnostic only.
    pub fn node_count(&self) -> usize {
        self.tree.node_count()
    }

    /// Whether the root bucket stores entries directly. Diagnostic only.
    pub fn root_is_leaf(&self) -> bool {
        self.tree.root_is_leaf()
    }
}

impl<K, V, Q, S, L> Index<&Q> for HashTrieMap<K, V, S, L>
where
    K: Eq + Hash + Borrow<Q>,
    Q: ?Sized + Hash + Eq,
    S: BuildHasher,
    L: LeafStore<K, V>,
{
    type Output = V;

    /// Panics when the key is absent, like `std::collections::HashMap`.
    fn index(&self, q: &Q) -> &V {
        self.get(q).expect("no entry found for key")
    }
}

/// Iterator over `(&K, &V)` pairs of a [`HashTrieMap`].
pub struct Iter<'a, K, V, L>
where
    K: Eq + 'a,
    V: 'a,
    L: LeafStore<K, V>,
{
    inner: bucket::Iter<'a, K, V, L>,
}

impl<'a, K, V, L> Iterator for Iter<'a, K, V, L>
where
    K: Eq + 'a,
    V: 'a,
    L: LeafStore<K, V>,
{
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|e| (&e.key, &e.value))
    }
}

/// Iterator over `(&K, &mut V)` pairs of a [`HashTrieMap`].
pub struct IterMut<'a, K, V, L>
where
    K: Eq + 'a,
    V: 'a,
    L: LeafStore<K, V>,
{
    inner: bucket::IterMut<'a, K, V, L>,
}

impl<'a, K, V, L> Iterator for IterMut<'a, K, V, L>
where
    K: Eq + 'a,
    V: 'a,
    L: LeafStore<K, V>,
{
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|e| (&e.key, &mut e.value))
    }
}
