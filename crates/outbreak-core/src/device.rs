//! The game device: role state machine plus its collaborators.
//!
//! A [`Device`] owns the radio for the whole run. It feeds radio input
//! into [`role::handle`] and carries out the returned effects on the
//! feedback actuators, the persistence sink, and the radio itself.
//!
//! # Radio ownership
//!
//! The radio is acquired by [`Device::start`] (scan for a human, advertise
//! for a zombie) and released by [`Device::stop`]. The human-to-zombie
//! transition releases the scanner before advertising begins. Each release
//! happens at most once, however often `stop` is called.

use core::time::Duration;

use chrono::{DateTime, Utc};
use outbreak_types::{PeerId, RoleKind, ZombificationRecord};
use tracing::{info, warn};

use crate::config::{ConfigError, GameConfig, RulesConfig};
use crate::feedback::{Feedback, TagSink};
use crate::radio::{Radio, RadioError};
use crate::role::{self, Effect, GameEvent, Role};

/// What the device currently holds the radio for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RadioLease {
    Scanning,
    Advertising,
}

/// Result of one device tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tags registered during the tick.
    pub tags: u32,
    /// Set when the device turned into a zombie during the tick.
    pub zombified: Option<PeerId>,
}

/// A game device bound to its radio, actuators, and sink.
#[derive(Debug)]
pub struct Device<R, F, S> {
    rules: RulesConfig,
    role: Role,
    radio: R,
    feedback: F,
    sink: S,
    lease: Option<RadioLease>,
    stopped: bool,
    started_at: DateTime<Utc>,
}

impl<R: Radio, F: Feedback, S: TagSink> Device<R, F, S> {
    /// Build a device from configuration. `now` marks the start of the
    /// human's survival time.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is invalid. No device
    /// is produced in that case.
    pub fn new(
        config: &GameConfig,
        radio: R,
        feedback: F,
        sink: S,
        now: Duration,
    ) -> Result<Self, ConfigError> {
        let role = Role::from_config(config, now)?;
        Ok(Self {
            rules: config.game,
            role,
            radio,
            feedback,
            sink,
            lease: None,
            stopped: false,
            started_at: Utc::now(),
        })
    }

    /// Acquire the radio for the configured role.
    ///
    /// # Errors
    ///
    /// Returns [`RadioError`] if scanning or advertising cannot start.
    pub fn start(&mut self) -> Result<(), RadioError> {
        match self.role {
            Role::Human(_) => {
                self.feedback.show_role(RoleKind::Human);
                self.feedback.indicator_off();
                self.radio.start_scan()?;
                self.lease = Some(RadioLease::Scanning);
                info!("Human started scanning for zombies");
            }
            Role::Zombie(zombie) => {
                self.begin_advertising(zombie.broadcast_id())?;
            }
        }
        Ok(())
    }

    /// Run one tick at time `now`.
    ///
    /// A human polls the radio once, feeds any advertisement to the state
    /// machine, then advances its timers. A zombie does nothing; its
    /// advertisement keeps running on its own.
    ///
    /// # Errors
    ///
    /// Returns [`RadioError`] if polling, releasing the scanner, or
    /// starting the advertisement fails.
    pub fn tick(&mut self, now: Duration) -> Result<TickReport, RadioError> {
        if self.stopped || !matches!(self.role, Role::Human(_)) {
            return Ok(TickReport::default());
        }

        let mut effects = Vec::new();
        if let Some(ad) = self.radio.poll_scan()? {
            effects.extend(role::handle(
                &mut self.role,
                GameEvent::Observed {
                    name: &ad.name,
                    rssi: ad.rssi,
                    now,
                },
                &self.rules,
            ));
        }
        effects.extend(role::handle(
            &mut self.role,
            GameEvent::Elapsed { now },
            &self.rules,
        ));

        let mut report = TickReport::default();
        for effect in effects {
            match effect {
                Effect::IndicatorOn => self.feedback.indicator_on(),
                Effect::IndicatorOff => self.feedback.indicator_off(),
                Effect::Beep(duration) => {
                    report.tags = report.tags.saturating_add(1);
                    self.feedback.beep(duration);
                }
                Effect::PersistTags(records) => {
                    if let Err(e) = self.sink.persist_tag_snapshot(&records) {
                        warn!(error = %e, "Failed to persist tag counts");
                    }
                }
                Effect::Zombified(record) => {
                    self.turn(&record)?;
                    report.zombified = Some(record.broadcast_id);
                }
            }
        }
        Ok(report)
    }

    /// Release the radio and end the run.
    ///
    /// Idempotent: the radio is released at most once, and the role is left
    /// as it was.
    ///
    /// # Errors
    ///
    /// Returns [`RadioError`] if the radio cannot be released cleanly. The
    /// lease is dropped either way, so a retry does not call the radio again.
    pub fn stop(&mut self) -> Result<(), RadioError> {
        self.stopped = true;
        match self.lease.take() {
            Some(RadioLease::Scanning) => {
                self.radio.stop_scan()?;
                info!("Human stopped scanning");
            }
            Some(RadioLease::Advertising) => {
                self.radio.stop_advertising()?;
                info!("Zombie stopped advertising");
            }
            None => {}
        }
        Ok(())
    }

    fn turn(&mut self, record: &ZombificationRecord) -> Result<(), RadioError> {
        if let Err(e) = self.sink.append_zombification_record(record) {
            warn!(error = %e, "Failed to record zombification");
        }
        if self.lease == Some(RadioLease::Scanning) {
            self.lease = None;
            self.radio.stop_scan()?;
        }
        self.begin_advertising(record.broadcast_id)
    }

    fn begin_advertising(&mut self, broadcast_id: PeerId) -> Result<(), RadioError> {
        self.feedback.show_role(RoleKind::Zombie);
        self.feedback.indicator_off();
        let name = broadcast_id.advertised_name();
        self.radio.advertise(&name)?;
        self.lease = Some(RadioLease::Advertising);
        info!(%broadcast_id, name, "Zombie started advertising");
        Ok(())
    }

    /// The current role.
    pub const fn role(&self) -> &Role {
        &self.role
    }

    /// Whether [`stop`](Self::stop) has been called.
    pub const fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Wall-clock time the device was built.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// The radio.
    pub const fn radio(&self) -> &R {
        &self.radio
    }

    /// The feedback actuators.
    pub const fn feedback(&self) -> &F {
        &self.feedback
    }

    /// The persistence sink.
    pub const fn sink(&self) -> &S {
        &self.sink
    }
}
