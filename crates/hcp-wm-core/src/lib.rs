//! HCP WM Core - types, dataset layout and frame windowing
//!
//! This crate holds the pieces of the working-memory decoding pipeline that
//! do not touch arrays or files: parcel and event types, the HCP run/condition
//! tables, onset/duration to frame-index conversion, and configuration.
//!
//! # Modules
//!
//! - [`types`]: Regions, hemispheres, events and per-run event records
//! - [`layout`]: Experiments, BOLD run table, condition names, run selection
//! - [`timing`]: Event window to frame-index extraction
//! - [`math`]: Summary statistics and seed derivation
//! - [`config`]: Analysis configuration with the canonical HCP constants
//! - [`error`]: Layout and configuration errors
//!
//! # Example
//!
//! ```rust
//! use hcp_wm_core::timing::condition_frames;
//! use hcp_wm_core::types::{Event, RunEvents};
//!
//! let tr = 0.72;
//! let run = RunEvents::from_events(vec![Event::new(0.0, 2.0 * tr, 1.0)]);
//! let frames = condition_frames(&[run], 0, tr);
//! assert_eq!(frames, vec![vec![0, 1]]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod config;
pub mod error;
pub mod layout;
pub mod math;
pub mod timing;
pub mod types;

// Re-export commonly used types at crate root
pub use config::{AnalysisConfig, ModelConfig, SplitConfig, SurfaceConfig};
pub use error::{ConfigError, LayoutError};
pub use layout::{Experiment, RunSelection};
pub use timing::{condition_frames, FrameWindow};
pub use types::{Event, Hemisphere, Region, RunEvents, SubjectId};
