//! Pluggable per-leaf entry storage.
//!
//! A trie leaf delegates all entry storage to a [`LeafStore`]. The bucket
//! layer only uses the operations below, so alternative stores can be
//! substituted without touching any trie logic. Two stores are provided:
//!
//! - [`VecLeaf`]: linear scan over a `Vec`, the default. Leaves stay below
//!   the expansion threshold by construction, so scans are short.
//! - [`HashLeaf`]: a `hashbrown::HashTable` keyed by the stored hash, for
//!   configurations with large expansion thresholds where leaves hold many
//!   distinct hashes.
//!
//! Neither store helps a *forced* leaf filled by fully colliding hashes:
//! every entry there shares all 32 hash bits, so lookups degrade to key
//! equality scans. That degenerate case comes from the caller's hash
//! function, not from the store.

use crate::entry::Entry;
use core::borrow::Borrow;
use hashbrown::hash_table::{self, HashTable};

/// Storage contract for one trie leaf.
///
/// Key identity is `(hash, key)`: two entries match when their stored
/// hashes are equal and their keys compare equal. Implementations never
/// invoke `K: Hash`.
pub trait LeafStore<K: Eq, V>: Default {
    type Iter<'a>: Iterator<Item = &'a Entry<K, V>>
    where
        Self: 'a,
        K: 'a,
        V: 'a;
    type IterMut<'a>: Iterator<Item = &'a mut Entry<K, V>>
    where
        Self: 'a,
        K: 'a,
        V: 'a;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stores `entry`. With `check_collisions`, refuses (returns false,
    /// store unchanged) when a matching key is already present. Without it,
    /// appends unconditionally: the caller guarantees uniqueness, as the
    /// bucket layer does when re-homing entries during extend/collapse.
    fn insert(&mut self, entry: Entry<K, V>, check_collisions: bool) -> bool;

    /// Removes and returns the first entry matching `(hash, key)`.
    fn remove<Q>(&mut self, hash: u32, key: &Q) -> Option<Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized;

    fn get<Q>(&self, hash: u32, key: &Q) -> Option<&Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized;

    fn get_mut<Q>(&mut self, hash: u32, key: &Q) -> Option<&mut Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized;

    /// Moves every entry into `out`, leaving the store empty. Used by the
    /// extend and collapse transitions.
    fn drain_into(&mut self, out: &mut Vec<Entry<K, V>>);

    fn iter(&self) -> Self::Iter<'_>;

    fn iter_mut(&mut self) -> Self::IterMut<'_>;
}

/// Default leaf store: unordered `Vec` with linear scans.
#[derive(Debug)]
pub struct VecLeaf<K, V>(Vec<Entry<K, V>>);

impl<K, V> Default for VecLeaf<K, V> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<K: Eq, V> LeafStore<K, V> for VecLeaf<K, V> {
    type Iter<'a>
        = core::slice::Iter<'a, Entry<K, V>>
    where
        Self: 'a,
        K: 'a,
        V: 'a;
    type IterMut<'a>
        = core::slice::IterMut<'a, Entry<K, V>>
    where
        Self: 'a,
        K: 'a,
        V: 'a;

    fn len(&self) -> usize {
        self.0.len()
    }

    fn insert(&mut self, entry: Entry<K, V>, check_collisions: bool) -> bool {
        if check_collisions && self.get(entry.hash, &entry.key).is_some() {
            return false;
        }
        self.0.push(entry);
        true
    }

    fn remove<Q>(&mut self, hash: u32, key: &Q) -> Option<Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let pos = self
            .0
            .iter()
            .position(|e| e.hash == hash && e.key.borrow() == key)?;
        // No ordering guarantee, so the cheap removal is fine.
        Some(self.0.swap_remove(pos))
    }

    fn get<Q>(&self, hash: u32, key: &Q) -> Option<&Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        self.0
            .iter()
            .find(|e| e.hash == hash && e.key.borrow() == key)
    }

    fn get_mut<Q>(&mut self, hash: u32, key: &Q) -> Option<&mut Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        self.0
            .iter_mut()
            .find(|e| e.hash == hash && e.key.borrow() == key)
    }

    fn drain_into(&mut self, out: &mut Vec<Entry<K, V>>) {
        out.append(&mut self.0);
    }

    fn iter(&self) -> Self::Iter<'_> {
        self.0.iter()
    }

    fn iter_mut(&mut self) -> Self::IterMut<'_> {
        self.0.iter_mut()
    }
}

/// Hash-indexed leaf store over `hashbrown::HashTable`, probing on the
/// stored hash so lookups stay O(1) even in large leaves.
#[derive(Debug)]
pub struct HashLeaf<K, V>(HashTable<Entry<K, V>>);

impl<K, V> Default for HashLeaf<K, V> {
    fn default() -> Self {
        Self(HashTable::new())
    }
}

impl<K: Eq, V> LeafStore<K, V> for HashLeaf<K, V> {
    type Iter<'a>
        = hash_table::Iter<'a, Entry<K, V>>
    where
        Self: 'a,
        K: 'a,
        V: 'a;
    type IterMut<'a>
        = hash_table::IterMut<'a, Entry<K, V>>
    where
        Self: 'a,
        K: 'a,
        V: 'a;

    fn len(&self) -> usize {
        self.0.len()
    }

    fn insert(&mut self, entry: Entry<K, V>, check_collisions: bool) -> bool {
        if check_collisions && self.get(entry.hash, &entry.key).is_some() {
            return false;
        }
        // Table growth rehashes on the stored hash only; K: Hash is never
        // invoked.
        self.0
            .insert_unique(u64::from(entry.hash), entry, |e| u64::from(e.hash));
        true
    }

    fn remove<Q>(&mut self, hash: u32, key: &Q) -> Option<Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        match self.0.find_entry(u64::from(hash), |e| {
            e.hash == hash && e.key.borrow() == key
        }) {
            Ok(occupied) => Some(occupied.remove().0),
            Err(_) => None,
        }
    }

    fn get<Q>(&self, hash: u32, key: &Q) -> Option<&Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        self.0
            .find(u64::from(hash), |e| e.hash == hash && e.key.borrow() == key)
    }

    fn get_mut<Q>(&mut self, hash: u32, key: &Q) -> Option<&mut Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        self.0.find_mut(u64::from(hash), |e| {
            e.hash == hash && e.key.borrow() == key
        })
    }

    fn drain_into(&mut self, out: &mut Vec<Entry<K, V>>) {
        out.extend(self.0.drain());
    }

    fn iter(&self) -> Self::Iter<'_> {
        self.0.iter()
    }

    fn iter_mut(&mut self) -> Self::IterMut<'_> {
        self.0.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(hash: u32, key: &str, value: i32) -> Entry<String, i32> {
        Entry::new(hash, key.to_string(), value)
    }

    fn exercise_store<L: LeafStore<String, i32>>() {
        let mut s = L::default();
        assert!(s.is_empty());

        assert!(s.insert(entry(1, "a", 10), true));
        assert!(s.insert(entry(2, "b", 20), true));
        assert_eq!(s.len(), 2);

        // Duplicate (hash, key) rejected without mutation.
        assert!(!s.insert(entry(1, "a", 99), true));
        assert_eq!(s.len(), 2);
        assert_eq!(s.get(1, "a").map(|e| e.value), Some(10));

        // Same key under a different hash is a distinct identity.
        assert!(s.insert(entry(7, "a", 70), true));
        assert_eq!(s.len(), 3);
        assert_eq!(s.get(7, "a").map(|e| e.value), Some(70));

        // Borrowed lookup and in-place mutation.
        s.get_mut(2, "b").unwrap().value = 22;
        assert_eq!(s.get(2, "b").map(|e| e.value), Some(22));
        assert!(s.get(2, "missing").is_none());
        assert!(s.get(9, "b").is_none());

        // Removal returns the owned entry.
        let removed = s.remove(1, "a").unwrap();
        assert_eq!((removed.hash, removed.value), (1, 10));
        assert!(s.remove(1, "a").is_none());
        assert_eq!(s.len(), 2);

        // Iteration covers every live entry exactly once.
        let mut values: Vec<i32> = s.iter().map(|e| e.value).collect();
        values.sort_unstable();
        assert_eq!(values, vec![22, 70]);
        for e in s.iter_mut() {
            e.value += 1;
        }
        assert_eq!(s.get(2, "b").map(|e| e.value), Some(23));

        // Drain empties the store and hands over every entry.
        let mut out = Vec::new();
        s.drain_into(&mut out);
        assert!(s.is_empty());
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn vec_leaf_contract() {
        exercise_store::<VecLeaf<String, i32>>();
    }

    #[test]
    fn hash_leaf_contract() {
        exercise_store::<HashLeaf<String, i32>>();
    }

    /// Unchecked insert appends even when a matching key exists; the bucket
    /// layer relies on this during structural rebuilds where it has already
    /// established uniqueness.
    #[test]
    fn unchecked_insert_appends() {
        let mut s: VecLeaf<String, i32> = VecLeaf::default();
        assert!(s.insert(entry(1, "a", 1), false));
        assert!(s.insert(entry(1, "a", 2), false));
        assert_eq!(s.len(), 2);
        // remove takes entries one at a time, first match wins
        assert!(s.remove(1, "a").is_some());
        assert!(s.remove(1, "a").is_some());
        assert!(s.remove(1, "a").is_none());
    }

    /// Fully colliding hashes stay retrievable by key in both stores.
    #[test]
    fn identical_hashes_resolved_by_key() {
        let mut s: HashLeaf<String, i32> = HashLeaf::default();
        assert!(s.insert(entry(0, "x", 1), true));
        assert!(s.insert(entry(0, "y", 2), true));
        assert!(!s.insert(entry(0, "x", 3), true));
        assert_eq!(s.get(0, "x").map(|e| e.value), Some(1));
        assert_eq!(s.get(0, "y").map(|e| e.value), Some(2));
    }
}
