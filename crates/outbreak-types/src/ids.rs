//! Peer identifiers.
//!
//! Zombies broadcast a short name made of the [`NAME_DISCRIMINATOR`]
//! followed by their decimal peer number (`"!5"`). A [`PeerId`] can only be
//! constructed inside `[1, max]`, so holding one means the range check
//! already happened.

use serde::{Deserialize, Serialize};

/// Leading character of every advertised zombie name.
pub const NAME_DISCRIMINATOR: char = '!';

/// Numeric identifier of a game device, always `>= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(u16);

impl PeerId {
    /// Create a peer id if `raw` lies in `[1, max]`.
    pub const fn new(raw: u16, max: u16) -> Option<Self> {
        if raw >= 1 && raw <= max {
            Some(Self(raw))
        } else {
            None
        }
    }

    /// Return the raw numeric value.
    pub const fn get(self) -> u16 {
        self.0
    }

    /// Decode an advertised name such as `"!5"`.
    ///
    /// Returns `None` when the discriminator is missing, the suffix is not
    /// made only of ASCII digits, or the number falls outside `[1, max]`.
    pub fn from_advertised_name(name: &str, max: u16) -> Option<Self> {
        let digits = name.strip_prefix(NAME_DISCRIMINATOR)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let raw: u16 = digits.parse().ok()?;
        Self::new(raw, max)
    }

    /// Encode this id as the name a zombie advertises.
    pub fn advertised_name(self) -> String {
        format!("{NAME_DISCRIMINATOR}{}", self.0)
    }
}

impl core::fmt::Display for PeerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_enforces_range() {
        assert!(PeerId::new(0, 13).is_none());
        assert!(PeerId::new(14, 13).is_none());
        assert_eq!(PeerId::new(1, 13).map(PeerId::get), Some(1));
        assert_eq!(PeerId::new(13, 13).map(PeerId::get), Some(13));
    }

    #[test]
    fn decodes_advertised_names() {
        assert_eq!(PeerId::from_advertised_name("!5", 13), PeerId::new(5, 13));
        assert_eq!(PeerId::from_advertised_name("!13", 13), PeerId::new(13, 13));
    }

    #[test]
    fn rejects_malformed_names() {
        for name in ["", "!", "5", "?5", "!x", "!+5", "!-1", "!5a", "! 5", "!0", "!14", "!99999999"] {
            assert!(
                PeerId::from_advertised_name(name, 13).is_none(),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn advertised_name_is_inverse_of_decode() {
        let id = PeerId::new(9, 13);
        let name = id.map(PeerId::advertised_name);
        assert_eq!(name.as_deref(), Some("!9"));
        assert_eq!(
            name.and_then(|n| PeerId::from_advertised_name(&n, 13)),
            id
        );
    }
}
