//! Trie configuration, validated at construction.

use crate::entry::HASH_BITS;
use core::fmt;

/// Shape parameters for a [`HashTrieMap`](crate::HashTrieMap), validated by
/// [`TrieConfig::new`] so a map can never exist with an invalid
/// configuration.
///
/// - `resolution`: hash bits consumed per trie level (1..=32). A node's
///   child array has `2^resolution` slots.
/// - `expansion_threshold`: a leaf that would reach this many entries is
///   extended into an internal node first. A threshold of 1 keeps every
///   non-forced node internal, trading memory for O(1) worst-case leaves.
/// - `collapse_threshold`: an internal node whose count falls to or below
///   this collapses back into a leaf. Must be strictly below
///   `expansion_threshold` so a freshly collapsed leaf does not
///   immediately re-extend.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TrieConfig {
    resolution: u32,
    expansion_threshold: usize,
    collapse_threshold: usize,
}

/// Construction-time validation failures for [`TrieConfig`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConfigError {
    /// `resolution` outside `1..=32`.
    ResolutionOutOfRange { resolution: u32 },
    /// `collapse_threshold >= expansion_threshold`.
    ThresholdOrder {
        expansion_threshold: usize,
        collapse_threshold: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ResolutionOutOfRange { resolution } => {
                write!(f, "resolution {resolution} outside 1..={HASH_BITS}")
            }
            ConfigError::ThresholdOrder {
                expansion_threshold,
                collapse_threshold,
            } => write!(
                f,
                "collapse threshold {collapse_threshold} must be below \
                 expansion threshold {expansion_threshold}"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

impl TrieConfig {
    pub fn new(
        resolution: u32,
        expansion_threshold: usize,
        collapse_threshold: usize,
    ) -> Result<Self, ConfigError> {
        if resolution < 1 || resolution > HASH_BITS {
            return Err(ConfigError::ResolutionOutOfRange { resolution });
        }
        if collapse_threshold >= expansion_threshold {
            return Err(ConfigError::ThresholdOrder {
                expansion_threshold,
                collapse_threshold,
            });
        }
        Ok(Self {
            resolution,
            expansion_threshold,
            collapse_threshold,
        })
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn expansion_threshold(&self) -> usize {
        self.expansion_threshold
    }

    pub fn collapse_threshold(&self) -> usize {
        self.collapse_threshold
    }
}

impl Default for TrieConfig {
    /// 16-way branching, leaves extend at 8 entries and internal nodes
    /// collapse at 4.
    fn default() -> Self {
        Self {
            resolution: 4,
            expansion_threshold: 8,
            collapse_threshold: 4,
        }
    }
}
