//! hashtrie: an adaptive hash-trie map that expands densely populated
//! regions into sub-tries and collapses sparse regions back into flat
//! buckets.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: build an associative container whose shape tracks its load,
//!   in safe, verifiable layers so each piece can be reasoned about
//!   independently.
//! - Layers:
//!   - LeafStore<K, V>: pluggable per-leaf entry storage. `VecLeaf` is the
//!     linear-scan default; `HashLeaf` (hashbrown) serves configurations
//!     with large expansion thresholds. Swapping stores never touches
//!     trie logic.
//!   - BucketTree<K, V, L>: structural trie over a `SlotMap` node arena.
//!     Routes on precomputed 32-bit hashes, maintains per-node counts,
//!     and performs the extend/collapse transitions.
//!   - HashTrieMap<K, V, S, L>: public dictionary API; owns the hasher
//!     and translates keyed operations into entry-level tree operations.
//!
//! Constraints
//! - Single-writer: no internal synchronization; mutation goes through
//!   `&mut self`, and iterators borrow the map, so the borrow checker
//!   rules out mutation during enumeration.
//! - Each entry stores its hash once, at insertion; `K: Hash` is never
//!   invoked afterwards. Routing, lookups, and leaf rehashing all use the
//!   stored 32 bits.
//! - Shape is governed by a validated `TrieConfig`: `resolution` hash
//!   bits per level, a leaf-expansion threshold, and a strictly smaller
//!   subtree-collapse threshold. Invalid configurations are unconstructible.
//! - Once `depth * resolution` exhausts the 32 hash bits, a bucket is a
//!   forced leaf and grows without subdividing. Fully colliding hash
//!   functions therefore degrade to linear scans in one leaf; that is the
//!   documented worst case, not an error.
//!
//! Why this split?
//! - Localize invariants: the leaf contract is "store entries, match on
//!   (hash, key)"; the tree contract is "counts equal reachable entries,
//!   transitions preserve the entry multiset"; the facade only adds
//!   hashing and the keyed API.
//! - The trie is a strict ownership tree, so nodes live in a generational
//!   arena (`slotmap`): collapsed subtrees return their slots to the
//!   arena free list, and no recursive drop chains form.
//!
//! Notes and non-goals
//! - No persistence, no concurrent mutation, no iteration-order
//!   guarantee beyond "each live entry exactly once".
//! - Duplicate keys are rejected by `insert`; `set` is the overwriting
//!   assignment; the `Index` read panics on a missing key like the
//!   standard maps.
//! - `node_count`/`root_is_leaf` expose the physical shape for tests and
//!   diagnostics; they carry no API stability promise beyond that.

mod bucket;
pub mod config;
mod entry;
pub mod leaf;
mod map;
mod map_proptest;

// Public surface
pub use config::{ConfigError, TrieConfig};
pub use entry::Entry;
pub use leaf::{HashLeaf, LeafStore, VecLeaf};
pub use map::{HashTrieMap, InsertError, Iter, IterMut};
