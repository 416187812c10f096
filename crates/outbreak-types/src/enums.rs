//! Enumeration types shared across the workspace.

use serde::{Deserialize, Serialize};

/// The two roles a device can play.
///
/// This is the configuration-level tag only. The live role, with its
/// per-role state, is `outbreak_core::role::Role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleKind {
    /// Scans for zombies and counts tags.
    #[default]
    Human,
    /// Advertises its id forever.
    Zombie,
}

impl core::fmt::Display for RoleKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Human => write!(f, "human"),
            Self::Zombie => write!(f, "zombie"),
        }
    }
}
