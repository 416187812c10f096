//! Shared type definitions for the Outbreak proximity-tag game.
//!
//! Every crate in the workspace speaks in these types: the peer
//! identifiers broadcast over the radio, the two device roles, and the
//! records handed to persistence sinks.
//!
//! # Modules
//!
//! - [`ids`] -- [`PeerId`] and the advertised-name encoding
//! - [`enums`] -- [`RoleKind`]
//! - [`records`] -- [`TagRecord`] and [`ZombificationRecord`]

pub mod enums;
pub mod ids;
pub mod records;

pub use enums::RoleKind;
pub use ids::{NAME_DISCRIMINATOR, PeerId};
pub use records::{TagRecord, ZombificationRecord};
