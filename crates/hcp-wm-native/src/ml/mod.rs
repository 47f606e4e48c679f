//! Decoding models
//!
//! - [`split`]: Seeded shuffle train/test split
//! - [`folds`]: Deterministic stratified k-fold assignment
//! - [`logistic`]: L1-penalized logistic regression (FISTA, one-vs-rest)
//! - [`cv`]: Cross-validated choice of C
//! - [`trainer`]: Repeated decoding with per-repetition seeds

pub mod cv;
pub mod folds;
pub mod logistic;
pub mod split;
pub mod trainer;

pub use cv::{CvFit, LogisticRegressionCv};
pub use folds::{stratified_folds, Fold};
pub use logistic::{LogisticModel, SolverConfig};
pub use split::{train_test_split, TrainTestSplit};
pub use trainer::{summarize, DecodingRun, DecodingSummary, DecodingTrainer, Repetition};
