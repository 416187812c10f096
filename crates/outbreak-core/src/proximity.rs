//! Per-peer proximity tracking.
//!
//! Radio sightings are noisy: a zombie walking past produces a handful of
//! strong readings and then nothing. The tracker turns that stream into
//! tag events by requiring a peer to stay in range for a full dwell time,
//! and by letting each continuous in-range interval tag at most once.
//!
//! # Timers
//!
//! Each tracked peer keeps its own timers:
//!
//! - silent for longer than `out_of_range_threshold` -> out of range,
//!   which clears the tag latch
//! - silent for longer than `5 x out_of_range_threshold` -> evicted
//! - in range for at least `proximity_duration` without a tag -> tag
//!
//! Evictions are applied only after every peer has been checked.

use core::time::Duration;
use std::collections::BTreeMap;

use outbreak_types::PeerId;
use tracing::debug;

use crate::config::RulesConfig;

/// Whether a peer is currently considered close.
///
/// The tag latch only exists while in range, so a tagged peer that is out
/// of range cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Close since `since`; `tagged` once this interval produced a tag.
    InRange {
        /// When the current in-range interval began.
        since: Duration,
        /// Whether this interval already tagged.
        tagged: bool,
    },
    /// Not close. A later sighting opens a new interval.
    OutOfRange,
}

/// Proximity state for one peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerState {
    last_seen: Duration,
    presence: Presence,
}

impl PeerState {
    /// Time of the most recent qualifying sighting.
    pub const fn last_seen(&self) -> Duration {
        self.last_seen
    }

    /// Current presence.
    pub const fn presence(&self) -> Presence {
        self.presence
    }

    /// Whether the peer is in range.
    pub const fn in_range(&self) -> bool {
        matches!(self.presence, Presence::InRange { .. })
    }

    /// Whether the current in-range interval already tagged.
    pub const fn tagged(&self) -> bool {
        matches!(self.presence, Presence::InRange { tagged: true, .. })
    }

    /// Start of the current in-range interval, if any.
    pub const fn proximity_start(&self) -> Option<Duration> {
        match self.presence {
            Presence::InRange { since, .. } => Some(since),
            Presence::OutOfRange => None,
        }
    }
}

/// A peer stayed in range long enough to tag this device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagEvent {
    /// The tagging peer.
    pub peer_id: PeerId,
    /// Tick time at which the dwell requirement was met.
    pub at: Duration,
}

/// Tracks every peer currently known to this device.
#[derive(Debug, Clone)]
pub struct ProximityTracker {
    rules: RulesConfig,
    peers: BTreeMap<PeerId, PeerState>,
}

impl ProximityTracker {
    /// Create an empty tracker.
    pub const fn new(rules: RulesConfig) -> Self {
        Self {
            rules,
            peers: BTreeMap::new(),
        }
    }

    /// Record a sighting of `peer_id` at signal strength `rssi`.
    ///
    /// Sightings weaker than the threshold, or from an id above
    /// `max_peer_id`, are dropped. Returns whether the sighting was kept.
    pub fn on_observation(&mut self, peer_id: PeerId, rssi: i16, now: Duration) -> bool {
        if peer_id.get() > self.rules.max_peer_id || rssi < self.rules.rssi_threshold {
            return false;
        }

        let state = self.peers.entry(peer_id).or_insert(PeerState {
            last_seen: now,
            presence: Presence::OutOfRange,
        });
        state.last_seen = now;

        if state.presence == Presence::OutOfRange {
            state.presence = Presence::InRange {
                since: now,
                tagged: false,
            };
            debug!(%peer_id, rssi, "Entered range of zombie");
        }
        true
    }

    /// Advance every peer's timers to `now` and collect tag events.
    ///
    /// Events come out in ascending peer id order.
    pub fn tick(&mut self, now: Duration) -> Vec<TagEvent> {
        let out_of_range = self.rules.out_of_range_threshold();
        let eviction = self.rules.eviction_threshold();
        let dwell = self.rules.proximity_duration();

        let mut events = Vec::new();
        let mut stale = Vec::new();

        for (&peer_id, state) in &mut self.peers {
            let unseen = now.saturating_sub(state.last_seen);
            if unseen > out_of_range {
                if state.in_range() {
                    state.presence = Presence::OutOfRange;
                    debug!(%peer_id, unseen_ms = unseen.as_millis(), "Exited range of zombie");
                }
                if unseen > eviction {
                    stale.push(peer_id);
                }
            } else if let Presence::InRange { since, tagged } = &mut state.presence {
                if !*tagged && now.saturating_sub(*since) >= dwell {
                    *tagged = true;
                    events.push(TagEvent { peer_id, at: now });
                }
            }
        }

        for peer_id in stale {
            self.peers.remove(&peer_id);
            debug!(%peer_id, "Forgot stale zombie");
        }

        events
    }

    /// Whether any tracked peer is in range.
    pub fn any_in_range(&self) -> bool {
        self.peers.values().any(PeerState::in_range)
    }

    /// State of one peer, if tracked.
    pub fn peer(&self, peer_id: PeerId) -> Option<&PeerState> {
        self.peers.get(&peer_id)
    }

    /// Number of tracked peers.
    pub fn tracked_count(&self) -> usize {
        self.peers.len()
    }
}
