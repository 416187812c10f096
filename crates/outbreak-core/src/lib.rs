//! Game core for the Outbreak proximity-tag game.
//!
//! A human device listens for nearby zombies over short-range radio. A
//! zombie that stays close enough for long enough registers a tag; three
//! tags from the same zombie turn the human into a zombie broadcasting
//! that zombie's number.
//!
//! # Modules
//!
//! - [`clock`] -- Injectable monotonic time source.
//! - [`config`] -- Configuration loading from `outbreak-config.yaml`.
//! - [`proximity`] -- Per-peer dwell tracking, tag events, eviction.
//! - [`registry`] -- Tag counts and the zombification threshold.
//! - [`role`] -- The human/zombie state machine as a pure event handler.
//! - [`radio`] -- [`Radio`] capability trait and [`StubRadio`].
//! - [`feedback`] -- Actuator and persistence collaborator traits.
//! - [`device`] -- [`Device`], which applies state-machine effects to its
//!   collaborators and owns the radio.
//! - [`runner`] -- The async tick loop with a [`StopSignal`].
//!
//! [`Radio`]: radio::Radio
//! [`StubRadio`]: radio::StubRadio
//! [`Device`]: device::Device
//! [`StopSignal`]: runner::StopSignal

pub mod clock;
pub mod config;
pub mod device;
pub mod feedback;
pub mod proximity;
pub mod radio;
pub mod registry;
pub mod role;
pub mod runner;
