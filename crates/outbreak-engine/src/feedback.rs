//! Log-backed actuators for the simulated device.
//!
//! The badge has a status light (green for a human, red for a zombie), a
//! red "eye" LED lit while a zombie, a warning LED, and a buzzer. Here each
//! of them is a log line.

use core::time::Duration;

use outbreak_core::feedback::Feedback;
use outbreak_types::RoleKind;
use tracing::{debug, info, warn};

/// Colour shown on the status light for `role`.
pub const fn status_color(role: RoleKind) -> &'static str {
    match role {
        RoleKind::Human => "green",
        RoleKind::Zombie => "red",
    }
}

/// [`Feedback`] that reports every actuator change through `tracing`.
#[derive(Debug, Default)]
pub struct LogFeedback {
    beeps: u32,
}

impl LogFeedback {
    /// Create feedback with nothing sounded yet.
    pub const fn new() -> Self {
        Self { beeps: 0 }
    }

    /// Beeps requested so far.
    pub const fn beeps(&self) -> u32 {
        self.beeps
    }
}

impl Feedback for LogFeedback {
    fn indicator_on(&mut self) {
        info!(led = "warning", "Zombie nearby");
    }

    fn indicator_off(&mut self) {
        debug!(led = "warning", "Warning light off");
    }

    fn beep(&mut self, duration: Duration) {
        self.beeps = self.beeps.saturating_add(1);
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("No runtime for the buzzer, beep skipped");
            return;
        };
        let beep = self.beeps;
        handle.spawn(async move {
            debug!(beep, duration_ms = duration.as_millis(), "Buzzer on");
            tokio::time::sleep(duration).await;
            debug!(beep, "Buzzer off");
        });
    }

    fn show_role(&mut self, role: RoleKind) {
        let eye = matches!(role, RoleKind::Zombie);
        info!(%role, status = status_color(role), eye, "Status light set");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn colors_follow_role() {
        assert_eq!(status_color(RoleKind::Human), "green");
        assert_eq!(status_color(RoleKind::Zombie), "red");
    }

    #[tokio::test(start_paused = true)]
    async fn beep_returns_before_the_buzzer_stops() {
        let mut feedback = LogFeedback::new();
        let before = tokio::time::Instant::now();

        feedback.beep(Duration::from_millis(500));
        feedback.beep(Duration::from_millis(500));

        assert_eq!(before.elapsed(), Duration::ZERO);
        assert_eq!(feedback.beeps(), 2);
    }

    #[test]
    fn beep_without_runtime_is_skipped() {
        let mut feedback = LogFeedback::new();
        feedback.beep(Duration::from_millis(500));
        assert_eq!(feedback.beeps(), 1);
    }
}
