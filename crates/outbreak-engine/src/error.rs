//! Error types for the device binary.
//!
//! [`EngineError`] is the top-level error that wraps every failure mode
//! during startup and the run itself.

/// Top-level error for the device binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: outbreak_core::config::ConfigError,
    },

    /// The run loop failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: outbreak_core::runner::RunnerError,
    },

    /// The simulated encounter script is unusable.
    #[error("scenario error: {message}")]
    Scenario {
        /// Description of the scenario failure.
        message: String,
    },
}
