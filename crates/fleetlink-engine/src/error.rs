//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during engine startup and simulation execution.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: fleetlink_core::config::ConfigError,
    },

    /// The initial fleet was rejected.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: fleetlink_core::world::WorldError,
    },

    /// Simulation runner failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: fleetlink_core::runner::RunnerError,
    },

    /// The session listener could not start.
    #[error("session listener error: {source}")]
    Listener {
        /// The underlying listener error.
        #[from]
        source: fleetlink_server::ListenerError,
    },

    /// Observer API server failed to start.
    #[error("observer error: {message}")]
    Observer {
        /// Description of the observer failure.
        message: String,
    },
}
