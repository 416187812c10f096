//! Actuator and persistence collaborators.
//!
//! Both traits are fire-and-forget from the game's point of view: a beep
//! must return immediately (long-running signals are spawned by the
//! implementation), and a failed write is logged by the device rather than
//! ending the game.

use core::time::Duration;

use outbreak_types::{RoleKind, TagRecord, ZombificationRecord};

/// Errors reported by a [`TagSink`].
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The backing store could not be written.
    #[error("failed to write tag data: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

/// Lights and buzzer on the device.
pub trait Feedback {
    /// Light the warning indicator (some zombie is in range).
    fn indicator_on(&mut self);

    /// Clear the warning indicator.
    fn indicator_off(&mut self);

    /// Sound the buzzer for `duration` without blocking the caller.
    fn beep(&mut self, duration: Duration);

    /// Show which role the device is playing.
    fn show_role(&mut self, role: RoleKind);
}

/// Where tag data is persisted.
pub trait TagSink {
    /// Replace the stored tag counts with `records`.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the snapshot cannot be written.
    fn persist_tag_snapshot(&mut self, records: &[TagRecord]) -> Result<(), SinkError>;

    /// Append the one-off zombification record.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the record cannot be written.
    fn append_zombification_record(&mut self, record: &ZombificationRecord)
    -> Result<(), SinkError>;
}

/// A single call made on a [`RecordingFeedback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackCall {
    /// [`Feedback::indicator_on`].
    IndicatorOn,
    /// [`Feedback::indicator_off`].
    IndicatorOff,
    /// [`Feedback::beep`].
    Beep(Duration),
    /// [`Feedback::show_role`].
    ShowRole(RoleKind),
}

/// Feedback that records every call in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingFeedback {
    /// Calls received so far.
    pub calls: Vec<FeedbackCall>,
}

impl RecordingFeedback {
    /// Number of beeps so far.
    pub fn beeps(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, FeedbackCall::Beep(_)))
            .count()
    }

    /// The most recent indicator state, if it was ever set.
    pub fn indicator(&self) -> Option<bool> {
        self.calls.iter().rev().find_map(|call| match call {
            FeedbackCall::IndicatorOn => Some(true),
            FeedbackCall::IndicatorOff => Some(false),
            FeedbackCall::Beep(_) | FeedbackCall::ShowRole(_) => None,
        })
    }
}

impl Feedback for RecordingFeedback {
    fn indicator_on(&mut self) {
        self.calls.push(FeedbackCall::IndicatorOn);
    }

    fn indicator_off(&mut self) {
        self.calls.push(FeedbackCall::IndicatorOff);
    }

    fn beep(&mut self, duration: Duration) {
        self.calls.push(FeedbackCall::Beep(duration));
    }

    fn show_role(&mut self, role: RoleKind) {
        self.calls.push(FeedbackCall::ShowRole(role));
    }
}

/// Sink that keeps everything in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    /// The latest snapshot written.
    pub snapshot: Vec<TagRecord>,
    /// Number of snapshot writes.
    pub writes: usize,
    /// Appended zombification records.
    pub zombifications: Vec<ZombificationRecord>,
}

impl TagSink for MemorySink {
    fn persist_tag_snapshot(&mut self, records: &[TagRecord]) -> Result<(), SinkError> {
        self.snapshot = records.to_vec();
        self.writes = self.writes.saturating_add(1);
        Ok(())
    }

    fn append_zombification_record(
        &mut self,
        record: &ZombificationRecord,
    ) -> Result<(), SinkError> {
        self.zombifications.push(*record);
        Ok(())
    }
}
