//! Simulated radio for running a device without badge hardware.
//!
//! Encounters come from the `scenario` section of `outbreak-config.yaml`:
//! each visit is an advertiser that is audible between `arrive_ms` and
//! `depart_ms` of game time. When several advertisers are audible, polls
//! rotate through them, so each poll still reports a single (latest)
//! advertisement the way the real scanner does. Signal strength gets a
//! seeded random jitter so runs are repeatable.

use outbreak_core::clock::Clock;
use outbreak_core::radio::{Advertisement, Radio, RadioError};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::EngineError;

// -----------------------------------------------------------------------
// Configuration
// -----------------------------------------------------------------------

/// Encounter script for the simulated radio.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScenarioConfig {
    /// RNG seed for signal-strength jitter.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Maximum jitter applied to each reading, in dBm either way.
    #[serde(default = "default_jitter_db")]
    pub jitter_db: u8,

    /// Advertisers and when they can be heard.
    #[serde(default = "default_visits")]
    pub visits: Vec<Visit>,
}

/// One advertiser audible over a window of game time.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Visit {
    /// Advertised name, e.g. `"!5"` for zombie 5.
    pub name: String,
    /// Nominal signal strength in dBm.
    pub rssi: i16,
    /// Game time the advertiser becomes audible.
    pub arrive_ms: u64,
    /// Game time the advertiser goes quiet (exclusive).
    pub depart_ms: u64,
}

impl Visit {
    const fn audible_at(&self, now_ms: u64) -> bool {
        self.arrive_ms <= now_ms && now_ms < self.depart_ms
    }
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            jitter_db: default_jitter_db(),
            visits: default_visits(),
        }
    }
}

const fn default_seed() -> u64 {
    42
}

const fn default_jitter_db() -> u8 {
    3
}

/// Zombie 5 closes in three times, zombie 9 lurks out of range, and a
/// pair of headphones wanders past.
fn default_visits() -> Vec<Visit> {
    let visit = |name: &str, rssi, arrive_ms, depart_ms| Visit {
        name: name.to_owned(),
        rssi,
        arrive_ms,
        depart_ms,
    };
    vec![
        visit("!5", -50, 0, 4_000),
        visit("!5", -48, 6_000, 10_000),
        visit("!5", -52, 12_000, 16_000),
        visit("!9", -72, 0, 30_000),
        visit("Headphones", -40, 2_000, 8_000),
    ]
}

impl ScenarioConfig {
    /// Read the `scenario` section of a full config document.
    ///
    /// A document without that section yields the default scenario.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Scenario`] if the YAML cannot be parsed or a
    /// visit window is empty.
    pub fn from_yaml(contents: &str) -> Result<Self, EngineError> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: serde_yml::Value =
            serde_yml::from_str(contents).map_err(|e| EngineError::Scenario {
                message: format!("failed to parse config YAML: {e}"),
            })?;

        let scenario = match raw.get("scenario") {
            Some(value) => {
                serde_yml::from_value(value.clone()).map_err(|e| EngineError::Scenario {
                    message: format!("failed to parse scenario config: {e}"),
                })?
            }
            None => Self::default(),
        };
        scenario.validate()?;
        Ok(scenario)
    }

    /// Reject visits that can never be heard.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Scenario`] naming the first empty window.
    pub fn validate(&self) -> Result<(), EngineError> {
        if let Some(visit) = self.visits.iter().find(|v| v.depart_ms <= v.arrive_ms) {
            return Err(EngineError::Scenario {
                message: format!(
                    "visit by {} departs at {} ms, not after arriving at {} ms",
                    visit.name, visit.depart_ms, visit.arrive_ms
                ),
            });
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------
// Radio
// -----------------------------------------------------------------------

/// A [`Radio`] that plays back a [`ScenarioConfig`] against a [`Clock`].
#[derive(Debug)]
pub struct SimulatedRadio<C> {
    visits: Vec<Visit>,
    jitter_db: i16,
    rng: SmallRng,
    clock: C,
    scanning: bool,
    advertising: Option<String>,
    cursor: usize,
}

impl<C: Clock> SimulatedRadio<C> {
    /// Build a radio that reads game time from `clock`.
    pub fn new(scenario: &ScenarioConfig, clock: C) -> Self {
        Self {
            visits: scenario.visits.clone(),
            jitter_db: i16::from(scenario.jitter_db),
            rng: SmallRng::seed_from_u64(scenario.seed),
            clock,
            scanning: false,
            advertising: None,
            cursor: 0,
        }
    }

    /// The name currently being advertised, if any.
    pub fn advertising(&self) -> Option<&str> {
        self.advertising.as_deref()
    }

    /// The clock the radio reads.
    #[cfg(test)]
    pub const fn clock(&self) -> &C {
        &self.clock
    }
}

impl<C: Clock> Radio for SimulatedRadio<C> {
    fn start_scan(&mut self) -> Result<(), RadioError> {
        self.scanning = true;
        info!(visits = self.visits.len(), "Simulated scan started");
        Ok(())
    }

    fn poll_scan(&mut self) -> Result<Option<Advertisement>, RadioError> {
        if !self.scanning {
            return Err(RadioError::Scan {
                reason: "scanner is not running".to_owned(),
            });
        }

        let now_ms = u64::try_from(self.clock.now().as_millis()).unwrap_or(u64::MAX);
        let audible: Vec<&Visit> = self.visits.iter().filter(|v| v.audible_at(now_ms)).collect();
        let index = self.cursor.checked_rem(audible.len()).unwrap_or(0);
        let Some(visit) = audible.get(index) else {
            return Ok(None);
        };
        let (name, nominal) = (visit.name.clone(), visit.rssi);
        self.cursor = self.cursor.wrapping_add(1);

        let jitter = if self.jitter_db > 0 {
            self.rng.random_range(self.jitter_db.saturating_neg()..=self.jitter_db)
        } else {
            0
        };
        let rssi = nominal.saturating_add(jitter);
        debug!(name = %name, rssi, now_ms, "Simulated advertisement");
        Ok(Some(Advertisement::new(name, rssi)))
    }

    fn stop_scan(&mut self) -> Result<(), RadioError> {
        self.scanning = false;
        info!("Simulated scan stopped");
        Ok(())
    }

    fn advertise(&mut self, name: &str) -> Result<(), RadioError> {
        if let Some(current) = &self.advertising {
            return Err(RadioError::Advertise {
                reason: format!("already advertising as {current}"),
            });
        }
        self.advertising = Some(name.to_owned());
        info!(name, "Simulated advertisement started");
        Ok(())
    }

    fn stop_advertising(&mut self) -> Result<(), RadioError> {
        if let Some(name) = self.advertising.take() {
            info!(name = %name, "Simulated advertisement stopped");
        }
        Ok(())
    }
}
