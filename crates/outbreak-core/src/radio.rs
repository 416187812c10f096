//! Short-range radio capability.
//!
//! The game never talks to radio hardware directly. A [`Radio`] scans for
//! advertisements (keeping only the most recent one between polls) and
//! advertises this device's own name. Transport failures surface as
//! [`RadioError`] and end the run; retries belong to whoever drives the
//! radio.

use std::collections::VecDeque;

/// One received advertisement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    /// Advertised device name, e.g. `"!5"`.
    pub name: String,
    /// Received signal strength in dBm.
    pub rssi: i16,
}

impl Advertisement {
    /// Convenience constructor.
    pub fn new(name: impl Into<String>, rssi: i16) -> Self {
        Self {
            name: name.into(),
            rssi,
        }
    }
}

/// Errors reported by a radio.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RadioError {
    /// Starting, polling, or stopping a scan failed.
    #[error("scan failed: {reason}")]
    Scan {
        /// Description of the failure.
        reason: String,
    },

    /// Starting or stopping an advertisement failed.
    #[error("advertise failed: {reason}")]
    Advertise {
        /// Description of the failure.
        reason: String,
    },
}

/// A short-range radio that can scan and advertise.
pub trait Radio {
    /// Begin scanning indefinitely.
    ///
    /// # Errors
    ///
    /// Returns [`RadioError::Scan`] if the scan cannot be started.
    fn start_scan(&mut self) -> Result<(), RadioError>;

    /// Take the most recent advertisement received since the last poll.
    ///
    /// Older advertisements received in between are lost. Never blocks.
    ///
    /// # Errors
    ///
    /// Returns [`RadioError::Scan`] if the scanner has failed.
    fn poll_scan(&mut self) -> Result<Option<Advertisement>, RadioError>;

    /// Stop scanning.
    ///
    /// # Errors
    ///
    /// Returns [`RadioError::Scan`] if the scan cannot be stopped cleanly.
    fn stop_scan(&mut self) -> Result<(), RadioError>;

    /// Begin advertising `name` continuously.
    ///
    /// # Errors
    ///
    /// Returns [`RadioError::Advertise`] if advertising cannot be started.
    fn advertise(&mut self, name: &str) -> Result<(), RadioError>;

    /// Stop advertising.
    ///
    /// # Errors
    ///
    /// Returns [`RadioError::Advertise`] if advertising cannot be stopped
    /// cleanly.
    fn stop_advertising(&mut self) -> Result<(), RadioError>;
}

/// A scripted in-memory radio.
///
/// Each poll pops the next scripted slot; an exhausted script yields
/// `None`. Every call is counted so tests can check resource handling.
#[derive(Debug, Clone, Default)]
pub struct StubRadio {
    script: VecDeque<Option<Advertisement>>,
    repeat: Option<Advertisement>,
    fail_poll_after: Option<usize>,
    /// Number of `start_scan` calls.
    pub scans_started: u32,
    /// Number of `stop_scan` calls.
    pub scans_stopped: u32,
    /// Number of `poll_scan` calls.
    pub polls: usize,
    /// Names passed to `advertise`, in order.
    pub advertised: Vec<String>,
    /// Number of `stop_advertising` calls.
    pub adverts_stopped: u32,
}

impl StubRadio {
    /// Create a radio that never hears anything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `ticks` polls that each return `ad`.
    #[must_use]
    pub fn hear(mut self, ad: &Advertisement, ticks: usize) -> Self {
        self.script
            .extend(core::iter::repeat_n(Some(ad.clone()), ticks));
        self
    }

    /// Queue `ticks` polls that return nothing.
    #[must_use]
    pub fn silence(mut self, ticks: usize) -> Self {
        self.script.extend(core::iter::repeat_n(None, ticks));
        self
    }

    /// Once the script runs out, return `ad` on every poll.
    #[must_use]
    pub fn then_forever(mut self, ad: Advertisement) -> Self {
        self.repeat = Some(ad);
        self
    }

    /// Fail every poll after `polls` successful ones.
    #[must_use]
    pub const fn fail_after(mut self, polls: usize) -> Self {
        self.fail_poll_after = Some(polls);
        self
    }
}

impl Radio for StubRadio {
    fn start_scan(&mut self) -> Result<(), RadioError> {
        self.scans_started = self.scans_started.saturating_add(1);
        Ok(())
    }

    fn poll_scan(&mut self) -> Result<Option<Advertisement>, RadioError> {
        if self.fail_poll_after.is_some_and(|limit| self.polls >= limit) {
            return Err(RadioError::Scan {
                reason: "scanner went away".to_owned(),
            });
        }
        self.polls = self.polls.saturating_add(1);
        Ok(match self.script.pop_front() {
            Some(slot) => slot,
            None => self.repeat.clone(),
        })
    }

    fn stop_scan(&mut self) -> Result<(), RadioError> {
        self.scans_stopped = self.scans_stopped.saturating_add(1);
        Ok(())
    }

    fn advertise(&mut self, name: &str) -> Result<(), RadioError> {
        self.advertised.push(name.to_owned());
        Ok(())
    }

    fn stop_advertising(&mut self) -> Result<(), RadioError> {
        self.adverts_stopped = self.adverts_stopped.saturating_add(1);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn stub_plays_script_then_repeats() {
        let ad = Advertisement::new("!5", -50);
        let mut radio = StubRadio::new()
            .hear(&ad, 1)
            .silence(1)
            .then_forever(Advertisement::new("!2", -40));

        assert_eq!(radio.poll_scan().unwrap(), Some(ad));
        assert_eq!(radio.poll_scan().unwrap(), None);
        assert_eq!(radio.poll_scan().unwrap().map(|a| a.name), Some("!2".to_owned()));
        assert_eq!(radio.polls, 3);
    }

    #[test]
    fn stub_fails_on_demand() {
        let mut radio = StubRadio::new().fail_after(1);
        assert!(radio.poll_scan().is_ok());
        assert!(matches!(radio.poll_scan(), Err(RadioError::Scan { .. })));
    }
}
