//! Error Types for Native Processing
//!
//! Error types for dataset access, averaging, model fitting, result
//! persistence and surface rendering using `thiserror`.

use std::path::PathBuf;

use hcp_wm_core::error::{ConfigError, LayoutError};
use thiserror::Error;

/// Dataset access errors
#[derive(Error, Debug)]
pub enum DatasetError {
    /// Underlying file I/O failed
    #[error("IO error on {path}: {source}")]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Source error
        #[source]
        source: std::io::Error,
    },

    /// Numeric npy file could not be read
    #[error("Failed to read array {path}: {reason}")]
    Npy {
        /// File being read
        path: PathBuf,
        /// Reader message
        reason: String,
    },

    /// npz archive could not be read
    #[error("Failed to read archive {path}: {reason}")]
    Npz {
        /// Archive being read
        path: PathBuf,
        /// Reader message
        reason: String,
    },

    /// Archive does not contain the expected array
    #[error("Archive {path} has no array named '{name}'")]
    MissingArray {
        /// Archive path
        path: PathBuf,
        /// Array name
        name: &'static str,
    },

    /// Unicode npy header or payload is malformed
    #[error("Malformed npy file {path}: {reason}")]
    MalformedNpy {
        /// File being read
        path: PathBuf,
        /// What was wrong
        reason: String,
    },

    /// EV text line is not three numeric columns
    #[error("Malformed EV file {path} line {line}: {reason}")]
    EvParse {
        /// EV file
        path: PathBuf,
        /// 1-based line number
        line: usize,
        /// What was wrong
        reason: String,
    },

    /// Loaded array has an unexpected shape
    #[error("Unexpected shape for {what}: expected {expected}, got {got:?}")]
    Shape {
        /// Array description
        what: &'static str,
        /// Expected shape description
        expected: String,
        /// Actual shape
        got: Vec<usize>,
    },

    /// Experiment, condition or run lookup failed
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Averaging and design-matrix errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessingError {
    /// Different number of time series and event records
    #[error("Length of time series ({series}) and EV records ({evs}) must match")]
    LengthMismatch {
        /// Number of per-run series
        series: usize,
        /// Number of per-run event records
        evs: usize,
    },

    /// Runs disagree on the number of regions
    #[error("Run {run} has {got} regions, expected {expected}")]
    RegionMismatch {
        /// Offending run position
        run: usize,
        /// Expected region count
        expected: usize,
        /// Actual region count
        got: usize,
    },

    /// No frame survived clipping in any run
    #[error("No frames selected across {runs} runs")]
    EmptySelection {
        /// Number of runs inspected
        runs: usize,
    },

    /// Label vector and design rows differ in length
    #[error("Label count {labels} does not match design rows {rows}")]
    LabelMismatch {
        /// Number of labels
        labels: usize,
        /// Number of design rows
        rows: usize,
    },

    /// Subject supplied the wrong number of condition averages
    #[error("Subject {subject} has {got} condition averages, expected {expected}")]
    ConditionCount {
        /// Subject id
        subject: u32,
        /// Expected count
        expected: usize,
        /// Supplied count
        got: usize,
    },
}

/// Classifier fitting errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Too few samples for the requested operation
    #[error("Insufficient samples for {operation}: got {got}, need {need}")]
    InsufficientSamples {
        /// What needed the samples
        operation: &'static str,
        /// Samples available
        got: usize,
        /// Samples required
        need: usize,
    },

    /// Feature matrix and labels disagree
    #[error("Dimension mismatch: {rows} rows but {labels} labels")]
    DimensionMismatch {
        /// Matrix rows
        rows: usize,
        /// Label count
        labels: usize,
    },

    /// Prediction input has the wrong number of features
    #[error("Expected {expected} features, got {got}")]
    FeatureMismatch {
        /// Fitted feature count
        expected: usize,
        /// Supplied feature count
        got: usize,
    },

    /// No candidate regularization strengths
    #[error("Regularization grid is empty")]
    EmptyGrid,

    /// Parameter outside its valid range
    #[error("Invalid model parameter {parameter}: {reason}")]
    InvalidParameter {
        /// Parameter name
        parameter: &'static str,
        /// Reason
        reason: String,
    },
}

/// Result persistence errors
#[derive(Error, Debug)]
pub enum ResultsError {
    /// Directory or file I/O failed
    #[error("IO error on {path}: {source}")]
    Io {
        /// Path being written
        path: PathBuf,
        /// Source error
        #[source]
        source: std::io::Error,
    },

    /// npy write failed
    #[error("Failed to write array {path}: {reason}")]
    Npy {
        /// Target file
        path: PathBuf,
        /// Writer message
        reason: String,
    },

    /// JSON serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Run statistics could not be assembled
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Surface rendering errors
#[derive(Error, Debug)]
pub enum VizError {
    /// Surface mesh could not be read
    #[error("Failed to read surface {path}: {reason}")]
    Mesh {
        /// Mesh file
        path: PathBuf,
        /// Reader message
        reason: String,
    },

    /// Atlas labels do not match mesh vertices
    #[error("Atlas has {labels} labels but mesh has {vertices} vertices")]
    LabelCount {
        /// Number of atlas labels
        labels: usize,
        /// Number of mesh vertices
        vertices: usize,
    },

    /// Output could not be written
    #[error("IO error on {path}: {source}")]
    Io {
        /// Output file
        path: PathBuf,
        /// Source error
        #[source]
        source: std::io::Error,
    },

    /// Scene serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// End-to-end decoding errors
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Invalid analysis configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Dataset access failed
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// Averaging or design construction failed
    #[error("Subject {subject}, condition {condition}: {source}")]
    Subject {
        /// Subject id
        subject: u32,
        /// Condition name
        condition: String,
        /// Source error
        #[source]
        source: ProcessingError,
    },

    /// Design matrix could not be assembled
    #[error(transparent)]
    Processing(#[from] ProcessingError),

    /// Model fitting failed
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Result type for dataset access
pub type DatasetResult<T> = Result<T, DatasetError>;

/// Result type for averaging and design construction
pub type ProcessingResult<T> = Result<T, ProcessingError>;

/// Result type for model fitting
pub type ModelResult<T> = Result<T, ModelError>;

/// Result type for persistence
pub type ResultsResult<T> = Result<T, ResultsError>;

/// Result type for rendering
pub type VizResult<T> = Result<T, VizError>;

/// Result type for end-to-end decoding
pub type PipelineResult<T> = Result<T, PipelineError>;
