//! Signal processing pipelines
//!
//! This module turns loaded time series into classifier input:
//! - [`averaging`]: Event-window selective averaging across runs
//! - [`design`]: Subject × condition design matrices and label schemes
//! - [`networks`]: Network/hemisphere summaries of region vectors

pub mod averaging;
pub mod design;
pub mod networks;

pub use averaging::{selective_average, SelectiveAverager};
pub use design::{DesignMatrix, DesignMatrixBuilder, LabelScheme, SampleKey};
pub use networks::{summarize_networks, NetworkEntry};
