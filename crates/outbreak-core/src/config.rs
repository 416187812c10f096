//! Configuration loading and typed config structures for the Outbreak game.
//!
//! The canonical configuration lives in `outbreak-config.yaml`. This module
//! defines strongly-typed structs that mirror the YAML structure, a loader,
//! and the validation that decides whether a device may be built at all.

use core::time::Duration;
use std::path::Path;

use outbreak_types::{PeerId, RoleKind};
use serde::Deserialize;

/// Multiple of the out-of-range threshold after which a peer is forgotten.
pub const EVICTION_FACTOR: u32 = 5;

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A zombie device was configured without a peer id.
    #[error("zombie must have a peer_id between 1 and {max_peer_id}")]
    MissingPeerId {
        /// Configured upper bound for peer ids.
        max_peer_id: u16,
    },

    /// The configured peer id is outside `[1, max_peer_id]`.
    #[error("peer_id {peer_id} must be between 1 and {max_peer_id}")]
    PeerIdOutOfRange {
        /// The rejected id.
        peer_id: u16,
        /// Configured upper bound for peer ids.
        max_peer_id: u16,
    },

    /// Some other field holds an unusable value.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level game configuration.
///
/// Mirrors the structure of `outbreak-config.yaml`. Every field has a
/// default matching the values the badges ship with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GameConfig {
    /// Identity of this device.
    #[serde(default)]
    pub device: DeviceConfig,

    /// Tagging rules.
    #[serde(default)]
    pub game: RulesConfig,

    /// Tick loop settings.
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GameConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override the device identity:
    /// - `OUTBREAK_ROLE` overrides `device.role` (`human` or `zombie`)
    /// - `OUTBREAK_PEER_ID` overrides `device.peer_id`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if an override cannot be parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.device.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Check every field a device depends on.
    ///
    /// Returns the broadcast id a zombie device starts with, or `None` for
    /// a human.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingPeerId`] or
    /// [`ConfigError::PeerIdOutOfRange`] for a zombie without a usable id,
    /// and [`ConfigError::Invalid`] for zero bounds or thresholds.
    pub fn validate(&self) -> Result<Option<PeerId>, ConfigError> {
        self.game.validate()?;
        if self.runtime.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                reason: "tick_interval_ms must be at least 1".to_owned(),
            });
        }
        match self.device.role {
            RoleKind::Human => Ok(None),
            RoleKind::Zombie => self.device.zombie_id(self.game.max_peer_id).map(Some),
        }
    }
}

/// Identity of this device.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceConfig {
    /// Role the device starts in.
    #[serde(default)]
    pub role: RoleKind,

    /// Device number. Required for a zombie; informational for a human.
    #[serde(default = "default_peer_id")]
    pub peer_id: Option<u16>,
}

impl DeviceConfig {
    /// Override identity fields with environment variables when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a variable holds an unparsable
    /// value.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("OUTBREAK_ROLE") {
            self.role = match val.trim().to_lowercase().as_str() {
                "human" => RoleKind::Human,
                "zombie" => RoleKind::Zombie,
                other => {
                    return Err(ConfigError::Invalid {
                        reason: format!("unknown OUTBREAK_ROLE: {other}"),
                    });
                }
            };
        }
        if let Ok(val) = std::env::var("OUTBREAK_PEER_ID") {
            let peer_id = val.trim().parse().map_err(|e| ConfigError::Invalid {
                reason: format!("invalid OUTBREAK_PEER_ID: {e}"),
            })?;
            self.peer_id = Some(peer_id);
        }
        Ok(())
    }

    /// Resolve the id a zombie broadcasts.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingPeerId`] if no id is set, or
    /// [`ConfigError::PeerIdOutOfRange`] if it falls outside `[1, max_peer_id]`.
    pub fn zombie_id(&self, max_peer_id: u16) -> Result<PeerId, ConfigError> {
        let raw = self
            .peer_id
            .ok_or(ConfigError::MissingPeerId { max_peer_id })?;
        PeerId::new(raw, max_peer_id).ok_or(ConfigError::PeerIdOutOfRange {
            peer_id: raw,
            max_peer_id,
        })
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            role: RoleKind::Human,
            peer_id: default_peer_id(),
        }
    }
}

/// Tagging rules shared by the tracker, the registry, and the role handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RulesConfig {
    /// Largest valid peer number.
    #[serde(default = "default_max_peer_id")]
    pub max_peer_id: u16,

    /// Weakest signal strength (dBm) that still counts as "in range".
    #[serde(default = "default_rssi_threshold")]
    pub rssi_threshold: i16,

    /// Continuous dwell time before a tag registers.
    #[serde(default = "default_proximity_duration_ms")]
    pub proximity_duration_ms: u64,

    /// Silence after which a peer counts as out of range.
    #[serde(default = "default_out_of_range_threshold_ms")]
    pub out_of_range_threshold_ms: u64,

    /// Tags from one zombie needed to turn this device.
    #[serde(default = "default_tag_threshold")]
    pub tag_threshold: u32,

    /// Buzzer duration on each tag.
    #[serde(default = "default_tag_beep_ms")]
    pub tag_beep_ms: u64,
}

impl RulesConfig {
    /// Dwell time before a tag registers.
    pub const fn proximity_duration(&self) -> Duration {
        Duration::from_millis(self.proximity_duration_ms)
    }

    /// Silence after which a peer counts as out of range.
    pub const fn out_of_range_threshold(&self) -> Duration {
        Duration::from_millis(self.out_of_range_threshold_ms)
    }

    /// Silence after which a peer is forgotten entirely.
    pub fn eviction_threshold(&self) -> Duration {
        self.out_of_range_threshold().saturating_mul(EVICTION_FACTOR)
    }

    /// Buzzer duration on each tag.
    pub const fn tag_beep(&self) -> Duration {
        Duration::from_millis(self.tag_beep_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_peer_id == 0 {
            return Err(ConfigError::Invalid {
                reason: "max_peer_id must be at least 1".to_owned(),
            });
        }
        if self.tag_threshold == 0 {
            return Err(ConfigError::Invalid {
                reason: "tag_threshold must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            max_peer_id: default_max_peer_id(),
            rssi_threshold: default_rssi_threshold(),
            proximity_duration_ms: default_proximity_duration_ms(),
            out_of_range_threshold_ms: default_out_of_range_threshold_ms(),
            tag_threshold: default_tag_threshold(),
            tag_beep_ms: default_tag_beep_ms(),
        }
    }
}

/// Tick loop settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RuntimeConfig {
    /// Milliseconds between ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Stop after this many ticks (0 = run until stopped).
    #[serde(default)]
    pub max_ticks: u64,
}

impl RuntimeConfig {
    /// Time between ticks.
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            max_ticks: 0,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit per-peer diagnostics. Has no effect on game behavior.
    #[serde(default = "default_true")]
    pub verbose: bool,
}

impl LoggingConfig {
    /// The filter directive to use when `RUST_LOG` is unset.
    pub fn effective_level(&self) -> &str {
        if self.verbose { "debug" } else { self.level.as_str() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            verbose: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

#[allow(clippy::unnecessary_wraps)]
const fn default_peer_id() -> Option<u16> {
    Some(8)
}

const fn default_max_peer_id() -> u16 {
    13
}

const fn default_rssi_threshold() -> i16 {
    -60
}

const fn default_proximity_duration_ms() -> u64 {
    3_000
}

const fn default_out_of_range_threshold_ms() -> u64 {
    1_000
}

const fn default_tag_threshold() -> u32 {
    3
}

const fn default_tag_beep_ms() -> u64 {
    500
}

const fn default_tick_interval_ms() -> u64 {
    100
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = GameConfig::default();
        assert_eq!(config.device.role, RoleKind::Human);
        assert_eq!(config.game.max_peer_id, 13);
        assert_eq!(config.game.rssi_threshold, -60);
        assert_eq!(config.game.proximity_duration(), Duration::from_secs(3));
        assert_eq!(config.game.out_of_range_threshold(), Duration::from_secs(1));
        assert_eq!(config.game.eviction_threshold(), Duration::from_secs(5));
        assert_eq!(config.game.tag_threshold, 3);
        assert_eq!(config.runtime.tick_interval(), Duration::from_millis(100));
        assert!(matches!(config.validate(), Ok(None)));
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
device:
  role: zombie
  peer_id: 4

game:
  max_peer_id: 20
  rssi_threshold: -70
  proximity_duration_ms: 2000
  out_of_range_threshold_ms: 500
  tag_threshold: 2
  tag_beep_ms: 250

runtime:
  tick_interval_ms: 50
  max_ticks: 600

logging:
  level: "warn"
  verbose: false
"#;

        let config = GameConfig::parse(yaml);
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_default();

        assert_eq!(config.device.role, RoleKind::Zombie);
        assert_eq!(config.device.peer_id, Some(4));
        assert_eq!(config.game.max_peer_id, 20);
        assert_eq!(config.game.rssi_threshold, -70);
        assert_eq!(config.game.eviction_threshold(), Duration::from_millis(2500));
        assert_eq!(config.game.tag_beep(), Duration::from_millis(250));
        assert_eq!(config.runtime.max_ticks, 600);
        assert_eq!(config.logging.effective_level(), "warn");
        assert_eq!(
            config.validate().ok().flatten().map(PeerId::get),
            Some(4)
        );
    }

    #[test]
    fn parse_minimal_yaml() {
        let yaml = "game:\n  tag_threshold: 5\n";
        let config = GameConfig::parse(yaml).ok().unwrap_or_default();

        assert_eq!(config.game.tag_threshold, 5);
        assert_eq!(config.game.max_peer_id, 13);
        assert_eq!(config.device.peer_id, Some(8));
    }

    #[test]
    fn parse_empty_yaml() {
        let config = GameConfig::parse("");
        assert!(config.is_ok());
    }

    #[test]
    fn zombie_without_peer_id_is_rejected() {
        let yaml = "device:\n  role: zombie\n  peer_id: null\n";
        let config = GameConfig::parse(yaml).ok().unwrap_or_default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingPeerId { max_peer_id: 13 })
        ));
    }

    #[test]
    fn zombie_with_out_of_range_peer_id_is_rejected() {
        for raw in [0, 14] {
            let mut config = GameConfig::default();
            config.device.role = RoleKind::Zombie;
            config.device.peer_id = Some(raw);
            assert!(matches!(
                config.validate(),
                Err(ConfigError::PeerIdOutOfRange { peer_id, max_peer_id: 13 }) if peer_id == raw
            ));
        }
    }

    #[test]
    fn human_ignores_peer_id_range() {
        let mut config = GameConfig::default();
        config.device.peer_id = None;
        assert!(matches!(config.validate(), Ok(None)));
    }

    #[test]
    fn zero_thresholds_are_rejected() {
        let mut config = GameConfig::default();
        config.game.tag_threshold = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));

        let mut config = GameConfig::default();
        config.game.max_peer_id = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));

        let mut config = GameConfig::default();
        config.runtime.tick_interval_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn unknown_role_fails_to_parse() {
        let yaml = "device:\n  role: vampire\n";
        assert!(matches!(GameConfig::parse(yaml), Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("outbreak-config.yaml");
        if path.exists() {
            let config = GameConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
