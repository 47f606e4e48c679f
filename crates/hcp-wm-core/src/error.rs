//! Error types for the HCP WM core
//!
//! Layout errors cover name resolution against the fixed HCP run and
//! condition tables. Configuration errors cover out-of-range analysis
//! parameters.

use thiserror::Error;

// ============================================================================
// Dataset Layout Errors
// ============================================================================

/// Errors from resolving experiment, condition and run identifiers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// No experiment with this code exists in the BOLD run table
    #[error("Found no data for experiment '{name}'")]
    UnknownExperiment {
        /// Name that was requested
        name: String,
    },

    /// Condition is not one of the experiment's EV names
    #[error("Unknown condition '{condition}' for experiment {experiment}")]
    UnknownCondition {
        /// Experiment code
        experiment: &'static str,
        /// Condition that was requested
        condition: String,
    },

    /// Run index past the experiment's run count
    #[error("Run index {run} out of range: experiment has {available} runs")]
    RunOutOfRange {
        /// Requested 0-based run index
        run: usize,
        /// Number of runs for the experiment
        available: usize,
    },

    /// 1-based run id with no entry in the BOLD run table
    #[error("Unknown BOLD run id {run_id}")]
    UnknownRun {
        /// Requested run id
        run_id: usize,
    },
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Errors from validating an [`AnalysisConfig`](crate::config::AnalysisConfig).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A parameter is outside its valid range
    #[error("Invalid configuration parameter {parameter}: {reason}")]
    InvalidParameter {
        /// Parameter name
        parameter: &'static str,
        /// Reason for rejection
        reason: String,
    },

    /// Layout lookup failed while validating names
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Result type for layout lookups
pub type LayoutResult<T> = Result<T, LayoutError>;

/// Result type for configuration validation
pub type ConfigResult<T> = Result<T, ConfigError>;
