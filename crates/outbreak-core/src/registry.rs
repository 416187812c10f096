//! Tag counting.
//!
//! Counts only ever go up. The registry itself does no I/O: the role
//! handler takes a [`snapshot`](TagRegistry::snapshot) after every
//! increment and hands it to the persistence sink.

use std::collections::BTreeMap;

use outbreak_types::{PeerId, TagRecord};

/// Tags received per zombie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRegistry {
    counts: BTreeMap<PeerId, u32>,
    threshold: u32,
}

impl TagRegistry {
    /// Create an empty registry that zombifies at `threshold` tags.
    pub const fn new(threshold: u32) -> Self {
        Self {
            counts: BTreeMap::new(),
            threshold,
        }
    }

    /// Count one more tag from `peer_id` and return its new total.
    pub fn register_tag(&mut self, peer_id: PeerId) -> u32 {
        let count = self.counts.entry(peer_id).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    /// Whether `peer_id` has tagged this device often enough to turn it.
    pub fn threshold_reached(&self, peer_id: PeerId) -> bool {
        self.count(peer_id) >= self.threshold
    }

    /// Tags received from `peer_id` so far.
    pub fn count(&self, peer_id: PeerId) -> u32 {
        self.counts.get(&peer_id).copied().unwrap_or(0)
    }

    /// Every count, in ascending peer id order.
    pub fn snapshot(&self) -> Vec<TagRecord> {
        self.counts
            .iter()
            .map(|(&peer_id, &tag_count)| TagRecord { peer_id, tag_count })
            .collect()
    }
}
