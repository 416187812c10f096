//! Device tick loop with a cooperative stop signal.
//!
//! [`run_device`] drives a [`Device`] at a fixed interval:
//!
//! - **Stop**: a [`StopSignal`] is checked at the top of every tick and also
//!   cuts the inter-tick sleep short
//! - **Bounded runs**: optionally end after `max_ticks`
//! - **Radio release**: the radio is released exactly once on the way out,
//!   including when a transport failure ends the run
//!
//! The inter-tick sleep is the only suspension point, so spawned feedback
//! tasks (the buzzer) keep running alongside the loop.

use core::time::Duration;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use outbreak_types::{PeerId, RoleKind};
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::device::Device;
use crate::feedback::{Feedback, TagSink};
use crate::radio::{Radio, RadioError};

/// Errors that end a run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The radio failed.
    #[error("radio error: {source}")]
    Radio {
        /// The underlying radio error.
        #[from]
        source: RadioError,
    },
}

/// Why the run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEndReason {
    /// A stop was requested.
    Stopped,
    /// The configured tick limit was reached.
    MaxTicksReached,
}

/// Loop settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Time between ticks.
    pub tick_interval: Duration,
    /// Stop after this many ticks (0 = unlimited).
    pub max_ticks: u64,
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Why the run ended.
    pub end_reason: RunEndReason,
    /// Number of ticks executed.
    pub total_ticks: u64,
    /// Total tags registered.
    pub total_tags: u64,
    /// Role at the end of the run.
    pub final_role: RoleKind,
    /// Broadcast id at the end of the run, if a zombie.
    pub broadcast_id: Option<PeerId>,
    /// Wall-clock start of the run.
    pub started_at: DateTime<Utc>,
    /// Wall-clock end of the run.
    pub ended_at: DateTime<Utc>,
}

/// Shared stop flag for a running device.
///
/// Wrap in an `Arc` to stop the loop from another task (a signal handler,
/// for example).
#[derive(Debug, Default)]
pub struct StopSignal {
    stop_requested: AtomicBool,
    notify: Notify,
}

impl StopSignal {
    /// Create an unset signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the loop to stop at the next tick boundary.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.notify.notify_one();
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Wait until a stop is requested.
    pub async fn stopped(&self) {
        while !self.is_stop_requested() {
            self.notify.notified().await;
        }
    }
}

/// Start `device` and tick it until stopped or bounded out.
///
/// # Errors
///
/// Returns [`RunnerError::Radio`] if the radio fails. The radio has been
/// released (best effort) before the error is returned.
pub async fn run_device<R, F, S>(
    device: &mut Device<R, F, S>,
    clock: &dyn Clock,
    stop: &StopSignal,
    options: RunOptions,
) -> Result<RunSummary, RunnerError>
where
    R: Radio,
    F: Feedback,
    S: TagSink,
{
    let mut total_ticks: u64 = 0;
    let mut total_tags: u64 = 0;

    info!(
        role = %device.role().kind(),
        tick_interval_ms = options.tick_interval.as_millis(),
        max_ticks = options.max_ticks,
        "Device starting"
    );

    if let Err(e) = device.start() {
        release_after_failure(device);
        return Err(e.into());
    }

    let end_reason = loop {
        if stop.is_stop_requested() {
            info!("Stop requested");
            break RunEndReason::Stopped;
        }

        let report = match device.tick(clock.now()) {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, tick = total_ticks, "Radio failed, ending run");
                release_after_failure(device);
                return Err(e.into());
            }
        };
        total_ticks = total_ticks.saturating_add(1);
        total_tags = total_tags.saturating_add(u64::from(report.tags));
        if let Some(broadcast_id) = report.zombified {
            info!(tick = total_ticks, %broadcast_id, "Device zombified");
        }

        if options.max_ticks > 0 && total_ticks >= options.max_ticks {
            info!(total_ticks, "Tick limit reached");
            break RunEndReason::MaxTicksReached;
        }

        tokio::select! {
            () = tokio::time::sleep(options.tick_interval) => {}
            () = stop.stopped() => debug!("Sleep interrupted by stop"),
        }
    };

    device.stop()?;

    Ok(RunSummary {
        end_reason,
        total_ticks,
        total_tags,
        final_role: device.role().kind(),
        broadcast_id: device.role().broadcast_id(),
        started_at: device.started_at(),
        ended_at: Utc::now(),
    })
}

fn release_after_failure<R: Radio, F: Feedback, S: TagSink>(device: &mut Device<R, F, S>) {
    if let Err(e) = device.stop() {
        warn!(error = %e, "Failed to release radio after failure");
    }
}

/// Log the outcome of a run.
pub fn log_run_end(summary: &RunSummary) {
    info!(
        reason = ?summary.end_reason,
        total_ticks = summary.total_ticks,
        total_tags = summary.total_tags,
        final_role = %summary.final_role,
        broadcast_id = summary.broadcast_id.map(PeerId::get),
        started_at = %summary.started_at,
        ended_at = %summary.ended_at,
        "Run ended"
    );
}
