//! Device binary for the Outbreak proximity-tag game.
//!
//! Wires a game device to a simulated radio, log-backed actuators, and
//! the tag data file, then ticks it until interrupted or bounded out.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `outbreak-config.yaml` (or `OUTBREAK_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Validate the device identity and rules
//! 4. Build the simulated radio from the `scenario` section
//! 5. Build the device and install the interrupt handler
//! 6. Run the tick loop
//! 7. Log the result

mod error;
mod feedback;
mod sim_radio;
mod sink;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use outbreak_core::clock::{Clock, TokioClock};
use outbreak_core::config::{ConfigError, GameConfig};
use outbreak_core::device::Device;
use outbreak_core::runner::{self, RunOptions, StopSignal};
use outbreak_types::PeerId;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::feedback::LogFeedback;
use crate::sim_radio::{ScenarioConfig, SimulatedRadio};
use crate::sink::{DEFAULT_TAG_FILE, FileTagSink};

/// Config file used when `OUTBREAK_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "outbreak-config.yaml";

/// Environment variable naming an alternative config file.
const CONFIG_PATH_VAR: &str = "OUTBREAK_CONFIG";

/// Configuration sections the binary needs, read from one document.
struct LoadedConfig {
    game: GameConfig,
    scenario: ScenarioConfig,
    source: Option<PathBuf>,
}

/// Application entry point for the device.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the radio fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. The log filter depends on it.
    let loaded = load_config(&config_path())?;
    let config = loaded.game;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.effective_level())),
        )
        .with_target(true)
        .init();

    info!("outbreak-engine starting");
    match &loaded.source {
        Some(path) => info!(path = %path.display(), "Configuration loaded"),
        None => info!("Config file not found, using defaults"),
    }

    // 3. Validate.
    let broadcast_id = config.validate().map_err(EngineError::from)?;
    info!(
        role = %config.device.role,
        broadcast_id = broadcast_id.map(PeerId::get),
        rssi_threshold = config.game.rssi_threshold,
        proximity_duration_ms = config.game.proximity_duration_ms,
        out_of_range_threshold_ms = config.game.out_of_range_threshold_ms,
        tag_threshold = config.game.tag_threshold,
        "Game rules validated"
    );

    // 4. Simulated radio.
    let clock = TokioClock::new();
    let radio = SimulatedRadio::new(&loaded.scenario, clock);
    info!(
        visits = loaded.scenario.visits.len(),
        seed = loaded.scenario.seed,
        "Simulated radio ready"
    );

    // 5. Device and interrupt handling.
    let mut device = Device::new(
        &config,
        radio,
        LogFeedback::new(),
        FileTagSink::new(DEFAULT_TAG_FILE),
        clock.now(),
    )
    .map_err(EngineError::from)?;

    let stop = Arc::new(StopSignal::new());
    {
        let stop = Arc::clone(&stop);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Interrupt received, stopping device");
                    stop.request_stop();
                }
                Err(e) => warn!(error = %e, "Failed to listen for interrupt"),
            }
        });
    }

    // 6. Run.
    let options = RunOptions {
        tick_interval: config.runtime.tick_interval(),
        max_ticks: config.runtime.max_ticks,
    };
    let summary = runner::run_device(&mut device, &clock, &stop, options)
        .await
        .map_err(EngineError::from)?;

    // 7. Log results.
    runner::log_run_end(&summary);

    info!(
        end_reason = ?summary.end_reason,
        total_ticks = summary.total_ticks,
        beeps = device.feedback().beeps(),
        advertising = device.radio().advertising(),
        tag_file = %device.sink().path().display(),
        "outbreak-engine shutdown complete"
    );

    Ok(())
}

/// Path of the config file, honouring `OUTBREAK_CONFIG`.
fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_PATH_VAR)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Load game and scenario configuration from `path`.
///
/// A missing file yields defaults. Device identity overrides from the
/// environment apply either way.
fn load_config(path: &Path) -> Result<LoadedConfig, EngineError> {
    let (mut game, scenario, source) = if path.exists() {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::from)?;
        (
            GameConfig::parse(&contents)?,
            ScenarioConfig::from_yaml(&contents)?,
            Some(path.to_path_buf()),
        )
    } else {
        (GameConfig::default(), ScenarioConfig::default(), None)
    };
    game.device.apply_env_overrides()?;

    Ok(LoadedConfig {
        game,
        scenario,
        source,
    })
}
