//! Repeated split / cross-validate / test decoding runs
//!
//! Each repetition draws its own `StdRng` from `derive_seed(seed, r)`, so a
//! repetition can be replayed on its own and the full sequence is
//! reproducible for a fixed seed.

use hcp_wm_core::config::{ModelConfig, SplitConfig};
use hcp_wm_core::math::{derive_seed, MeanStd};
use ndarray::{Array2, Array3, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use super::cv::LogisticRegressionCv;
use super::logistic::LogisticModel;
use super::split::train_test_split;
use crate::error::{ModelError, ModelResult};
use crate::processing::design::{DesignMatrix, LabelScheme};

/// One split / fit / score cycle
#[derive(Clone, Debug)]
pub struct Repetition {
    /// Repetition index
    pub index: usize,
    /// Seed the split was drawn with
    pub seed: u64,
    /// Test-split accuracy
    pub accuracy: f64,
    /// C chosen by cross-validation
    pub best_c: f64,
    /// Mean CV accuracy per C
    pub cv_scores: Vec<f64>,
    /// Model refit on the training split
    pub model: LogisticModel,
    /// Training rows
    pub train_size: usize,
    /// Test rows
    pub test_size: usize,
}

/// Statistics across repetitions (population std)
#[derive(Clone, Debug)]
pub struct DecodingSummary {
    /// Test accuracy mean and std
    pub accuracy: MeanStd,
    /// Element-wise coefficient mean (coefficient rows × regions)
    pub coef_mean: Array2<f64>,
    /// Element-wise coefficient std
    pub coef_std: Array2<f64>,
}

/// All repetitions of one decoding task
#[derive(Clone, Debug)]
pub struct DecodingRun {
    /// Label scheme decoded
    pub scheme: LabelScheme,
    /// Class names indexed by label
    pub class_names: Vec<String>,
    /// Repetitions in order
    pub repetitions: Vec<Repetition>,
    /// Cross-repetition statistics
    pub summary: DecodingSummary,
}

impl DecodingRun {
    /// Test accuracies in repetition order
    #[must_use]
    pub fn accuracies(&self) -> Vec<f64> {
        self.repetitions.iter().map(|r| r.accuracy).collect()
    }

    /// Chosen C values in repetition order
    #[must_use]
    pub fn best_cs(&self) -> Vec<f64> {
        self.repetitions.iter().map(|r| r.best_c).collect()
    }

    /// Name of each coefficient row: the positive class for a binary model
    #[must_use]
    pub fn coef_row_names(&self) -> Vec<String> {
        let rows = self.summary.coef_mean.nrows();
        if rows == 1 {
            vec![self.class_names.get(1).cloned().unwrap_or_default()]
        } else {
            (0..rows)
                .map(|k| self.class_names.get(k).cloned().unwrap_or_else(|| k.to_string()))
                .collect()
        }
    }

    /// Coefficients stacked as (repetitions, coefficient rows, regions)
    ///
    /// # Errors
    ///
    /// Fails if repetitions disagree on coefficient shape.
    pub fn stacked_coefs(&self) -> ModelResult<Array3<f64>> {
        stack_coefs(&self.repetitions)
    }
}

/// Runs repeated decoding over a design matrix
#[derive(Clone, Debug)]
pub struct DecodingTrainer {
    split: SplitConfig,
    model: ModelConfig,
    repetitions: usize,
    seed: u64,
}

impl DecodingTrainer {
    /// Create a trainer
    #[must_use]
    pub fn new(split: SplitConfig, model: ModelConfig, repetitions: usize, seed: u64) -> Self {
        Self {
            split,
            model,
            repetitions,
            seed,
        }
    }

    /// Number of repetitions
    #[must_use]
    pub fn repetitions(&self) -> usize {
        self.repetitions
    }

    /// Base seed
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Run every repetition and summarize
    ///
    /// # Errors
    ///
    /// Propagates split, fold and fit errors; fails on zero repetitions.
    pub fn run(&self, design: &DesignMatrix, scheme: LabelScheme) -> ModelResult<DecodingRun> {
        if self.repetitions == 0 {
            return Err(ModelError::InvalidParameter {
                parameter: "repetitions",
                reason: "must be at least 1".to_string(),
            });
        }
        info!(
            task = scheme.slug(),
            samples = design.n_samples(),
            regions = design.n_regions(),
            repetitions = self.repetitions,
            "Decoding"
        );

        let repetitions = (0..self.repetitions)
            .map(|r| self.run_repetition(design, r))
            .collect::<ModelResult<Vec<_>>>()?;
        let summary = summarize(&repetitions)?;
        info!(
            task = scheme.slug(),
            accuracy_mean = summary.accuracy.mean,
            accuracy_std = summary.accuracy.std,
            "Decoding finished"
        );

        Ok(DecodingRun {
            scheme,
            class_names: design.class_names().to_vec(),
            repetitions,
            summary,
        })
    }

    /// Run repetition `index` alone
    ///
    /// # Errors
    ///
    /// Propagates split, fold and fit errors.
    pub fn run_repetition(&self, design: &DesignMatrix, index: usize) -> ModelResult<Repetition> {
        let seed = derive_seed(self.seed, index as u64);
        let mut rng = StdRng::seed_from_u64(seed);
        let split = train_test_split(design.n_samples(), self.split.test_fraction, &mut rng)?;

        let x = design.x();
        let labels = design.labels();
        let x_train = x.select(Axis(0), &split.train);
        let y_train: Vec<usize> = split.train.iter().map(|&r| labels[r]).collect();
        let x_test = x.select(Axis(0), &split.test);
        let y_test: Vec<usize> = split.test.iter().map(|&r| labels[r]).collect();

        let fit = LogisticRegressionCv::with_config(&self.model).fit(x_train.view(), &y_train, &design.classes())?;
        let accuracy = fit.model.score(x_test.view(), &y_test)?;
        debug!(
            repetition = index,
            seed,
            accuracy,
            best_c = fit.best_c,
            nonzero = fit.model.n_nonzero(),
            "Repetition done"
        );

        Ok(Repetition {
            index,
            seed,
            accuracy,
            best_c: fit.best_c,
            cv_scores: fit.cv_scores,
            model: fit.model,
            train_size: split.train.len(),
            test_size: split.test.len(),
        })
    }
}

fn stack_coefs(repetitions: &[Repetition]) -> ModelResult<Array3<f64>> {
    let first = repetitions.first().ok_or(ModelError::InsufficientSamples {
        operation: "coefficient stacking",
        got: 0,
        need: 1,
    })?;
    let (k, p) = first.model.coef().dim();
    let mut stacked = Array3::zeros((repetitions.len(), k, p));
    for (mut slot, rep) in stacked.outer_iter_mut().zip(repetitions) {
        if rep.model.coef().dim() != (k, p) {
            return Err(ModelError::FeatureMismatch {
                expected: k * p,
                got: rep.model.coef().len(),
            });
        }
        slot.assign(rep.model.coef());
    }
    Ok(stacked)
}

/// Accuracy and coefficient statistics over repetitions
///
/// # Errors
///
/// Fails on an empty sequence or inconsistent coefficient shapes.
pub fn summarize(repetitions: &[Repetition]) -> ModelResult<DecodingSummary> {
    let stacked = stack_coefs(repetitions)?;
    let accuracies: Vec<f64> = repetitions.iter().map(|r| r.accuracy).collect();
    let coef_mean = stacked.mean_axis(Axis(0)).ok_or(ModelError::InsufficientSamples {
        operation: "coefficient mean",
        got: 0,
        need: 1,
    })?;
    let coef_std = stacked.std_axis(Axis(0), 0.0);

    Ok(DecodingSummary {
        accuracy: MeanStd::of(&accuracies),
        coef_mean,
        coef_std,
    })
}
