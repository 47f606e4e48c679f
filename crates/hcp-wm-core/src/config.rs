//! Analysis configuration.
//!
//! The defaults are the constants of the HCP working-memory decoding
//! analysis; a JSON file may override any subset of them.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::layout::Experiment;
use crate::math::logspace;

/// Working-memory conditions in decoding order: four 0-back blocks then
/// four 2-back blocks, categories in the same order within each block.
pub const WM_CONDITIONS: [&str; 8] = [
    "0bk_body",
    "0bk_faces",
    "0bk_places",
    "0bk_tools",
    "2bk_body",
    "2bk_faces",
    "2bk_places",
    "2bk_tools",
];

/// Stimulus categories within a memory-load block
pub const WM_CATEGORIES: [&str; 4] = ["body", "faces", "places", "tools"];

/// Top-level analysis configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Number of subjects (ids `0..n_subjects`)
    pub n_subjects: u32,
    /// Number of cortical parcels
    pub n_parcels: usize,
    /// Repetition time (seconds)
    pub tr_s: f64,
    /// Experiment code
    pub experiment: String,
    /// Ordered condition list used to build the design matrix
    pub conditions: Vec<String>,
    /// Stimulus categories (block length of the condition list)
    pub categories: Vec<String>,
    /// Frames skipped at each event start
    pub skip_frames: usize,
    /// Subtract each region's temporal mean from every run on load
    pub remove_mean: bool,
    /// Number of split/fit/score repetitions
    pub repetitions: usize,
    /// Base seed for per-repetition seed derivation
    pub seed: u64,
    /// Train/test split settings
    pub split: SplitConfig,
    /// Classifier settings
    pub model: ModelConfig,
    /// Surface rendering settings
    pub surface: SurfaceConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            n_subjects: 339,
            n_parcels: 360,
            tr_s: 0.72,
            experiment: "WM".to_string(),
            conditions: WM_CONDITIONS.iter().map(ToString::to_string).collect(),
            categories: WM_CATEGORIES.iter().map(ToString::to_string).collect(),
            skip_frames: 0,
            remove_mean: true,
            repetitions: 10,
            seed: 2021,
            split: SplitConfig::default(),
            model: ModelConfig::default(),
            surface: SurfaceConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Resolved experiment
    ///
    /// # Errors
    ///
    /// Fails if the experiment code is unknown.
    pub fn experiment(&self) -> ConfigResult<Experiment> {
        Ok(Experiment::from_name(&self.experiment)?)
    }

    /// Check parameter ranges and condition names
    ///
    /// # Errors
    ///
    /// Returns the first invalid parameter found.
    pub fn validate(&self) -> ConfigResult<()> {
        let experiment = self.experiment()?;
        for condition in &self.conditions {
            experiment.validate_condition(condition)?;
        }

        if self.n_parcels == 0 {
            return Err(invalid("n_parcels", "must be positive"));
        }
        if !(self.tr_s.is_finite() && self.tr_s > 0.0) {
            return Err(invalid("tr_s", format!("{} is not a positive duration", self.tr_s)));
        }
        if self.categories.is_empty() {
            return Err(invalid("categories", "must not be empty"));
        }
        if self.conditions.is_empty() || self.conditions.len() % self.categories.len() != 0 {
            return Err(invalid(
                "conditions",
                format!(
                    "{} conditions do not form whole blocks of {} categories",
                    self.conditions.len(),
                    self.categories.len()
                ),
            ));
        }
        if self.repetitions == 0 {
            return Err(invalid("repetitions", "must be at least 1"));
        }
        self.split.validate()?;
        self.model.validate()
    }
}

/// Train/test split settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Fraction of samples held out for testing
    pub test_fraction: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: 1.0 / 8.0,
        }
    }
}

impl SplitConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.test_fraction > 0.0 && self.test_fraction < 1.0 {
            Ok(())
        } else {
            Err(invalid(
                "split.test_fraction",
                format!("{} not in (0, 1)", self.test_fraction),
            ))
        }
    }
}

/// L1 logistic regression settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Inverse regularization strengths to search
    pub cs: Vec<f64>,
    /// Stratified folds used to pick C
    pub cv_folds: usize,
    /// Maximum solver iterations per fit
    pub max_iter: usize,
    /// Relative convergence tolerance on parameter change
    pub tol: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            cs: logspace(-4.0, 4.0, 10),
            cv_folds: 10,
            max_iter: 1000,
            tol: 1e-4,
        }
    }
}

impl ModelConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.cs.is_empty() {
            return Err(invalid("model.cs", "C grid is empty"));
        }
        if let Some(c) = self.cs.iter().find(|c| !(c.is_finite() && **c > 0.0)) {
            return Err(invalid("model.cs", format!("{c} is not a positive C")));
        }
        if self.cv_folds < 2 {
            return Err(invalid("model.cv_folds", "need at least 2 folds"));
        }
        if self.max_iter == 0 {
            return Err(invalid("model.max_iter", "must be at least 1"));
        }
        if !(self.tol > 0.0) {
            return Err(invalid("model.tol", "must be positive"));
        }
        Ok(())
    }
}

/// Surface rendering settings
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Colormap saturation bound; max |value| when unset
    pub vmax: Option<f64>,
}

fn invalid(parameter: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidParameter {
        parameter,
        reason: reason.into(),
    }
}
