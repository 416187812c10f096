//! Records handed to persistence sinks.

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ids::PeerId;

/// How many times one zombie has tagged this device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    /// The tagging zombie.
    pub peer_id: PeerId,
    /// Tags registered against that zombie so far.
    pub tag_count: u32,
}

/// Written once, when a human turns into a zombie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZombificationRecord {
    /// The id this device now broadcasts (the zombie that finished it off).
    pub broadcast_id: PeerId,
    /// Time spent as a human before the transition.
    pub survived: Duration,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn tag_record_json_shape() {
        let record = TagRecord {
            peer_id: PeerId::new(5, 13).unwrap(),
            tag_count: 2,
        };
        let json = serde_json::to_value(record).unwrap();
        assert_eq!(json["peer_id"], 5);
        assert_eq!(json["tag_count"], 2);
    }
}
