//! Error handling for the planning layer
//!
//! Configuration problems are the only fatal condition and are detected
//! before any line is processed. Per-line anomalies (unrecognized lines,
//! missing temperature declarations, unreachable lead times) are handled
//! in place by the planners and reported through `tracing`, never as
//! errors: a planner that finds nothing to do must not stop the others.
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Invalid or contradictory planner parameters
///
/// Every variant is detected up front, before a single input line is
/// parsed; nothing is written when one is raised.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Both threshold modes supplied at once
    #[error("both length and mass thresholds supplied; choose one")]
    ConflictingThresholdModes,

    /// Neither threshold mode supplied
    #[error("no pause thresholds supplied")]
    MissingThresholds,

    /// A threshold value that could not be parsed
    #[error("'{text}' is not a valid threshold value")]
    UnparseableThreshold {
        /// The offending token
        text: String,
    },

    /// A threshold that is not a positive finite number
    #[error("threshold {value} must be a positive finite number")]
    InvalidThreshold {
        /// The offending value
        value: f64,
    },

    /// A lead time that is not a positive finite number
    #[error("preheat lead time {seconds}s must be a positive finite number")]
    InvalidLeadTime {
        /// The offending value, seconds
        seconds: f64,
    },

    /// A filament diameter that is not a positive finite number
    #[error("filament diameter {diameter_mm}mm must be a positive finite number")]
    InvalidDiameter {
        /// The offending value, mm
        diameter_mm: f64,
    },

    /// A filament density that is not a positive finite number
    #[error("filament density {density_g_cm3}g/cm³ must be a positive finite number")]
    InvalidDensity {
        /// The offending value, g/cm³
        density_g_cm3: f64,
    },

    /// An empty pause instruction
    #[error("pause instruction text is empty")]
    EmptyPauseCode,
}

/// Main error type for toolpost
///
/// Unifies fatal configuration errors with the I/O errors of the thin
/// file-handling layer around the core.
#[derive(Error, Debug)]
pub enum PostError {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type using PostError
pub type Result<T> = std::result::Result<T, PostError>;
