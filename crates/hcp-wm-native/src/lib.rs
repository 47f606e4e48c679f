//! HCP WM Native - dataset access, decoding and rendering
//!
//! This crate runs the array and file side of the working-memory decoding
//! pipeline:
//! - Parcellated time series, region tables, atlas and EV files
//! - Selective averaging of event windows across runs
//! - Subject × condition design matrices for both label schemes
//! - Repeated L1 logistic decoding with cross-validated C
//! - Result persistence and cortical surface views
//!
//! # Modules
//!
//! - [`dataset`]: On-disk HCP layout readers
//! - [`processing`]: Averaging, design matrices, network summaries
//! - [`ml`]: Splits, folds, L1 logistic regression, repeated training
//! - [`pipeline`]: Dataset to decoding run, per label scheme
//! - [`results`]: npy/JSON outputs per task
//! - [`viz`]: Surface projection and HTML rendering

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod dataset;
pub mod error;
pub mod ml;
pub mod pipeline;
pub mod processing;
pub mod results;
pub mod viz;

// Re-export key types
pub use dataset::{HcpDataset, SurfaceAtlas};
pub use error::{DatasetError, ModelError, PipelineError, ProcessingError, ResultsError, VizError};
pub use ml::{DecodingRun, DecodingSummary, DecodingTrainer, LogisticModel, LogisticRegressionCv};
pub use pipeline::DecodingPipeline;
pub use processing::{DesignMatrix, DesignMatrixBuilder, LabelScheme, SelectiveAverager};
pub use results::ResultsWriter;
pub use viz::SurfaceRenderer;
