//! BucketTree: the structural trie layer.
//!
//! Nodes live in a `SlotMap` arena rather than as boxed recursive
//! structures: the trie is a strict ownership tree, so generational arena
//! keys give the same exclusive-ownership model with better locality, and
//! the arena's free list recycles the slots of collapsed subtrees. No node
//! holds a reference to its parent.
//!
//! This layer is hash-agnostic: callers hand it [`Entry`] values carrying a
//! precomputed 32-bit hash and query with `(hash, borrowed key)` pairs. The
//! facade in [`crate::map`] is the only place hashes are computed.
//!
//! Shape rules (fixed per tree by [`TrieConfig`]):
//! - A leaf that would reach `expansion_threshold` entries extends into an
//!   internal node first, re-homing its entries one level down.
//! - An internal node whose count falls to `collapse_threshold` or below
//!   (or to a single entry, which no longer justifies a subtree) collapses
//!   back into a leaf, re-absorbing its whole subtree.
//! - A node at `depth * resolution >= 32` is a forced leaf: the hash is
//!   exhausted, so it stores entries directly no matter how many collide.

use crate::config::TrieConfig;
use crate::entry::{hash_segment, is_forced_leaf, Entry};
use crate::leaf::{LeafStore, VecLeaf};
use core::borrow::Borrow;
use core::marker::PhantomData;
use core::mem;
use slotmap::{DefaultKey, SlotMap};

struct Node<L> {
    depth: u32,
    /// Entries reachable under this node, descendants included.
    count: usize,
    kind: NodeKind<L>,
}

enum NodeKind<L> {
    /// Fresh slot: storage shape is decided on first insert.
    Empty,
    Leaf(L),
    /// Child slots indexed by the depth's hash segment, allocated lazily.
    Internal(Box<[Option<DefaultKey>]>),
}

fn empty_children(resolution: u32) -> Box<[Option<DefaultKey>]> {
    vec![None; 1usize << resolution].into_boxed_slice()
}

/// The adaptive trie over arena-allocated buckets.
pub struct BucketTree<K, V, L = VecLeaf<K, V>> {
    nodes: SlotMap<DefaultKey, Node<L>>,
    root: DefaultKey,
    config: TrieConfig,
    _marker: PhantomData<(K, V)>,
}

enum Step {
    BecomeLeaf,
    BecomeInternal,
    Store,
    Extend,
    Descend(DefaultKey),
    Create(usize),
}

impl<K, V, L> BucketTree<K, V, L>
where
    K: Eq,
    L: LeafStore<K, V>,
{
    pub fn new(config: TrieConfig) -> Self {
        let mut nodes = SlotMap::new();
        let root = nodes.insert(Node {
            depth: 0,
            count: 0,
            kind: NodeKind::Empty,
        });
        Self {
            nodes,
            root,
            config,
            _marker: PhantomData,
        }
    }

    pub fn config(&self) -> &TrieConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.nodes[self.root].count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live arena nodes, the root included. `1` means the trie is a bare
    /// root leaf. Diagnostic only.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the root currently stores entries directly. Diagnostic only.
    pub fn root_is_leaf(&self) -> bool {
        !matches!(self.nodes[self.root].kind, NodeKind::Internal(_))
    }

    /// Inserts `entry`, returning whether a new entry was added. With
    /// `check_collisions`, an entry whose `(hash, key)` is already present
    /// makes this a no-op returning false; the trie shape is never changed
    /// by a rejected insert.
    pub fn insert(&mut self, entry: Entry<K, V>, check_collisions: bool) -> bool {
        let root = self.root;
        self.insert_at(root, entry, check_collisions)
    }

    /// Replaces the value of a present key in place (no structural change,
    /// count unchanged) and returns the previous value, or inserts.
    pub fn upsert(&mut self, entry: Entry<K, V>) -> Option<V> {
        if let Some(slot) = self.get_mut(entry.hash, &entry.key) {
            return Some(mem::replace(&mut slot.value, entry.value));
        }
        self.insert(entry, false);
        None
    }

    /// Removes the first entry matching `(hash, key)`.
    pub fn remove<Q>(&mut self, hash: u32, key: &Q) -> Option<Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let root = self.root;
        self.remove_at(root, hash, key, false).1
    }

    /// Removes every entry matching `(hash, key)`, returning how many were
    /// removed. Matching duplicates only exist when a caller inserted with
    /// collision checks disabled.
    pub fn remove_all<Q>(&mut self, hash: u32, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let root = self.root;
        self.remove_at(root, hash, key, true).0
    }

    pub fn get<Q>(&self, hash: u32, key: &Q) -> Option<&Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let resolution = self.config.resolution();
        let mut cur = self.root;
        loop {
            let node = &self.nodes[cur];
            match &node.kind {
                NodeKind::Empty => return None,
                NodeKind::Leaf(store) => return store.get(hash, key),
                NodeKind::Internal(children) => {
                    match children[hash_segment(hash, node.depth, resolution)] {
                        Some(child) => cur = child,
                        None => return None,
                    }
                }
            }
        }
    }

    pub fn get_mut<Q>(&mut self, hash: u32, key: &Q) -> Option<&mut Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let leaf = self.locate_leaf(hash)?;
        match &mut self.nodes[leaf].kind {
            NodeKind::Leaf(store) => store.get_mut(hash, key),
            _ => None,
        }
    }

    /// Drops every entry and resets to a single empty root.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = self.nodes.insert(Node {
            depth: 0,
            count: 0,
            kind: NodeKind::Empty,
        });
    }

    /// Pre-order traversal over all live entries, leaf by leaf. Driven by
    /// an explicit stack so pathological hash distributions cannot deepen
    /// the call stack.
    pub fn iter(&self) -> Iter<'_, K, V, L> {
        Iter {
            nodes: &self.nodes,
            stack: vec![self.root],
            leaf: None,
        }
    }

    /// Mutable traversal in arena order. Iteration order is unspecified
    /// either way.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V, L> {
        IterMut {
            nodes: self.nodes.iter_mut(),
            leaf: None,
        }
    }

    /// Walks internal nodes down to the leaf on `hash`'s path, if any.
    fn locate_leaf(&self, hash: u32) -> Option<DefaultKey> {
        let resolution = self.config.resolution();
        let mut cur = self.root;
        loop {
            let node = &self.nodes[cur];
            match &node.kind {
                NodeKind::Empty => return None,
                NodeKind::Leaf(_) => return Some(cur),
                NodeKind::Internal(children) => {
                    match children[hash_segment(hash, node.depth, resolution)] {
                        Some(child) => cur = child,
                        None => return None,
                    }
                }
            }
        }
    }

    fn insert_at(&mut self, key: DefaultKey, entry: Entry<K, V>, check_collisions: bool) -> bool {
        let resolution = self.config.resolution();
        let expansion = self.config.expansion_threshold();

        let step = {
            let Node { depth, kind, .. } = &self.nodes[key];
            let forced = is_forced_leaf(*depth, resolution);
            match kind {
                // A fresh node picks its shape on first insert. An
                // expansion threshold of 1 tolerates no non-forced leaves,
                // so such nodes subdivide immediately.
                NodeKind::Empty => {
                    if forced || expansion > 1 {
                        Step::BecomeLeaf
                    } else {
                        Step::BecomeInternal
                    }
                }
                NodeKind::Leaf(store) => {
                    if check_collisions && store.get(entry.hash, &entry.key).is_some() {
                        return false;
                    }
                    if !forced && store.len() + 1 >= expansion {
                        Step::Extend
                    } else {
                        Step::Store
                    }
                }
                NodeKind::Internal(children) => {
                    let idx = hash_segment(entry.hash, *depth, resolution);
                    match children[idx] {
                        Some(child) => Step::Descend(child),
                        None => Step::Create(idx),
                    }
                }
            }
        };

        match step {
            Step::BecomeLeaf => {
                self.nodes[key].kind = NodeKind::Leaf(L::default());
                self.insert_at(key, entry, check_collisions)
            }
            Step::BecomeInternal => {
                self.nodes[key].kind = NodeKind::Internal(empty_children(resolution));
                self.insert_at(key, entry, check_collisions)
            }
            Step::Store => {
                let node = &mut self.nodes[key];
                if let NodeKind::Leaf(store) = &mut node.kind {
                    store.insert(entry, false);
                    node.count += 1;
                }
                true
            }
            Step::Extend => {
                self.extend(key);
                // Uniqueness against this subtree was just established.
                self.insert_at(key, entry, false)
            }
            Step::Descend(child) => {
                let added = self.insert_at(child, entry, check_collisions);
                if added {
                    self.nodes[key].count += 1;
                }
                added
            }
            Step::Create(idx) => {
                let depth = self.nodes[key].depth;
                let child = self.nodes.insert(Node {
                    depth: depth + 1,
                    count: 0,
                    kind: NodeKind::Empty,
                });
                if let NodeKind::Internal(children) = &mut self.nodes[key].kind {
                    children[idx] = Some(child);
                }
                let added = self.insert_at(child, entry, check_collisions);
                if added {
                    self.nodes[key].count += 1;
                }
                added
            }
        }
    }

    fn remove_at<Q>(
        &mut self,
        key: DefaultKey,
        hash: u32,
        q: &Q,
        remove_all: bool,
    ) -> (usize, Option<Entry<K, V>>)
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let resolution = self.config.resolution();
        let child = {
            let Node { depth, count, kind } = &mut self.nodes[key];
            match kind {
                NodeKind::Empty => return (0, None),
                NodeKind::Leaf(store) => {
                    let mut removed = 0;
                    let mut first = None;
                    while let Some(e) = store.remove(hash, q) {
                        removed += 1;
                        if first.is_none() {
                            first = Some(e);
                        }
                        if !remove_all {
                            break;
                        }
                    }
                    *count -= removed;
                    return (removed, first);
                }
                NodeKind::Internal(children) => {
                    match children[hash_segment(hash, *depth, resolution)] {
                        Some(child) => child,
                        None => return (0, None),
                    }
                }
            }
        };

        let (removed, first) = self.remove_at(child, hash, q, remove_all);
        if removed > 0 {
            let node = &mut self.nodes[key];
            node.count -= removed;
            // Collapse this node, not its parent. A lone remaining entry
            // collapses regardless of the configured threshold: a subtree
            // holding one entry is pure overhead.
            if node.count <= self.config.collapse_threshold().max(1) {
                self.collapse(key);
            }
        }
        (removed, first)
    }

    /// Leaf-to-internal transition: re-homes every stored entry one level
    /// down through the freshly allocated child slots. O(leaf size).
    fn extend(&mut self, key: DefaultKey) {
        let resolution = self.config.resolution();
        let node = &mut self.nodes[key];
        let kind = mem::replace(&mut node.kind, NodeKind::Internal(empty_children(resolution)));
        let mut store = match kind {
            NodeKind::Leaf(store) => store,
            other => {
                node.kind = other;
                return;
            }
        };
        // Re-inserts restore the count entry by entry.
        node.count = 0;
        let mut entries = Vec::with_capacity(store.len());
        store.drain_into(&mut entries);
        for e in entries {
            self.insert_at(key, e, false);
        }
    }

    /// Internal-to-leaf transition: gathers the whole subtree's entries
    /// into a fresh leaf store and returns the subtree's nodes to the
    /// arena free list. O(subtree size); the node's count is unchanged.
    fn collapse(&mut self, key: DefaultKey) {
        let node = &mut self.nodes[key];
        let children = match mem::replace(&mut node.kind, NodeKind::Empty) {
            NodeKind::Internal(children) => children,
            other => {
                node.kind = other;
                return;
            }
        };
        let mut store = L::default();
        let mut scratch = Vec::new();
        let mut stack: Vec<DefaultKey> = children.iter().filter_map(|c| *c).collect();
        while let Some(k) = stack.pop() {
            if let Some(child) = self.nodes.remove(k) {
                match child.kind {
                    NodeKind::Empty => {}
                    NodeKind::Leaf(mut s) => {
                        s.drain_into(&mut scratch);
                        for e in scratch.drain(..) {
                            // Descendants were unique already.
                            store.insert(e, false);
                        }
                    }
                    NodeKind::Internal(grandchildren) => {
                        stack.extend(grandchildren.iter().filter_map(|c| *c));
                    }
                }
            }
        }
        self.nodes[key].kind = NodeKind::Leaf(store);
    }
}

/// Pre-order iterator over every live entry in a [`BucketTree`].
pub struct Iter<'a, K, V, L>
where
    K: Eq + 'a,
    V: 'a,
    L: LeafStore<K, V>,
{
    nodes: &'a SlotMap<DefaultKey, Node<L>>,
    stack: Vec<DefaultKey>,
    leaf: Option<L::Iter<'a>>,
}

impl<'a, K, V, L> Iterator for Iter<'a, K, V, L>
where
    K: Eq + 'a,
    V: 'a,
    L: LeafStore<K, V>,
{
    type Item = &'a Entry<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(it) = &mut self.leaf {
                if let Some(e) = it.next() {
                    return Some(e);
                }
                self.leaf = None;
            }
            let key = self.stack.pop()?;
            match &self.nodes[key].kind {
                NodeKind::Empty => {}
                NodeKind::Leaf(store) => self.leaf = Some(store.iter()),
                NodeKind::Internal(children) => {
                    for child in children.iter().rev() {
                        if let Some(child) = child {
                            self.stack.push(*child);
                        }
                    }
                }
            }
        }
    }
}

/// Mutable iterator over every live entry, walking leaves in arena order.
pub struct IterMut<'a, K, V, L>
where
    K: Eq + 'a,
    V: 'a,
    L: LeafStore<K, V>,
{
    nodes: slotmap::basic::IterMut<'a, DefaultKey, Node<L>>,
    leaf: Option<L::IterMut<'a>>,
}

impl<'a, K, V, L> Iterator for IterMut<'a, K, V, L>
where
    K: Eq + 'a,
    V: 'a,
    L: LeafStore<K, V>,
{
    type Item = &'a mut Entry<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(it) = &mut self.leaf {
                if let Some(e) = it.next() {
                    return Some(e);
                }
                self.leaf = None;
            }
            let (_key, node) = self.nodes.next()?;
            if let NodeKind::Leaf(store) = &mut node.kind {
                self.leaf = Some(store.iter_mut());
            }
        }
    }
}
