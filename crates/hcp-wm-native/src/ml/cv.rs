//! Cross-validated choice of the regularization strength
//!
//! The C grid is kept in ascending order. For every stratified fold the
//! whole grid is fit as a path warm-started from the strongest penalty to
//! the weakest, scored on the held-out rows, and the C with the best mean
//! fold accuracy is refit on all rows. Ties go to the smallest C.

use hcp_wm_core::config::ModelConfig;
use ndarray::{Array2, ArrayView2, Axis};
use tracing::{debug, info};

use super::folds::stratified_folds;
use super::logistic::{lipschitz_constant, LogisticModel, SolverConfig};
use crate::error::{ModelError, ModelResult};

/// Result of a cross-validated fit
#[derive(Clone, Debug)]
pub struct CvFit {
    /// Model refit on all rows with the chosen C
    pub model: LogisticModel,
    /// Chosen C
    pub best_c: f64,
    /// Mean fold accuracy per C, in ascending C order
    pub cv_scores: Vec<f64>,
    /// Accuracy per (fold, C)
    pub fold_scores: Array2<f64>,
}

/// L1 logistic regression with C chosen by stratified k-fold CV
#[derive(Clone, Debug, PartialEq)]
pub struct LogisticRegressionCv {
    cs: Vec<f64>,
    cv_folds: usize,
    solver: SolverConfig,
}

impl LogisticRegressionCv {
    /// Create from a C grid (any order) and fold count
    #[must_use]
    pub fn new(mut cs: Vec<f64>, cv_folds: usize, solver: SolverConfig) -> Self {
        cs.sort_by(f64::total_cmp);
        Self { cs, cv_folds, solver }
    }

    /// Create from model settings
    #[must_use]
    pub fn with_config(config: &ModelConfig) -> Self {
        Self::new(config.cs.clone(), config.cv_folds, SolverConfig::from(config))
    }

    /// C grid, ascending
    #[must_use]
    pub fn cs(&self) -> &[f64] {
        &self.cs
    }

    /// Select C by cross-validation and refit on all rows
    ///
    /// `classes` fixes the coefficient layout (see
    /// [`LogisticModel::fit_with_classes`]).
    ///
    /// # Errors
    ///
    /// Fails on an empty grid, mismatched inputs, or too few rows per fold.
    pub fn fit(&self, x: ArrayView2<'_, f64>, labels: &[usize], classes: &[usize]) -> ModelResult<CvFit> {
        if self.cs.is_empty() {
            return Err(ModelError::EmptyGrid);
        }
        if x.nrows() != labels.len() {
            return Err(ModelError::DimensionMismatch {
                rows: x.nrows(),
                labels: labels.len(),
            });
        }

        let folds = stratified_folds(labels, self.cv_folds)?;
        let mut fold_scores = Array2::zeros((folds.len(), self.cs.len()));

        for (f, fold) in folds.iter().enumerate() {
            let x_train = x.select(Axis(0), &fold.train);
            let y_train: Vec<usize> = fold.train.iter().map(|&r| labels[r]).collect();
            let x_test = x.select(Axis(0), &fold.test);
            let y_test: Vec<usize> = fold.test.iter().map(|&r| labels[r]).collect();

            let lipschitz = lipschitz_constant(x_train.view());
            let path = LogisticModel::fit_path(
                x_train.view(),
                &y_train,
                classes,
                &self.cs,
                &self.solver,
                lipschitz,
            )?;
            for (j, model) in path.iter().enumerate() {
                fold_scores[[f, j]] = model.score(x_test.view(), &y_test)?;
            }
            debug!(fold = f, train = fold.train.len(), test = fold.test.len(), "CV fold done");
        }

        let cv_scores: Vec<f64> = fold_scores
            .mean_axis(Axis(0))
            .map(|m| m.to_vec())
            .ok_or(ModelError::InsufficientSamples {
                operation: "cross-validation",
                got: 0,
                need: self.cv_folds,
            })?;

        let best = cv_scores
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |(bi, bv), (i, &v)| if v > bv { (i, v) } else { (bi, bv) })
            .0;
        let best_c = self.cs[best];
        info!(best_c, cv_accuracy = cv_scores[best], "Selected regularization strength");

        let model = LogisticModel::fit_with_classes(x, labels, classes, best_c, &self.solver)?;
        Ok(CvFit {
            model,
            best_c,
            cv_scores,
            fold_scores,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    /// Feature 0 carries the label, feature 1 alternates independently of it
    fn dataset(n: usize) -> (Array2<f64>, Vec<usize>) {
        let labels: Vec<usize> = (0..n).map(|i| i % 2).collect();
        let x = Array2::from_shape_fn((n, 2), |(i, j)| {
            let sign = if labels[i] == 1 { 1.0 } else { -1.0 };
            if j == 0 {
                sign * (1.0 + (i % 5) as f64 * 0.1)
            } else if (i / 2) % 2 == 0 {
                0.5
            } else {
                -0.5
            }
        });
        (x, labels)
    }

    #[test]
    fn test_selects_from_grid_and_refits() {
        let (x, y) = dataset(40);
        let cv = LogisticRegressionCv::new(vec![1e-4, 1.0, 100.0], 5, SolverConfig::default());
        let fit = cv.fit(x.view(), &y, &[0, 1]).unwrap();

        assert!(cv.cs().contains(&fit.best_c));
        assert_eq!(fit.cv_scores.len(), 3);
        assert_eq!(fit.fold_scores.dim(), (5, 3));
        assert!(fit.best_c > 1e-4);
        assert_eq!(fit.model.score(x.view(), &y).unwrap(), 1.0);
    }

    #[test]
    fn test_ties_pick_first_c() {
        let (x, y) = dataset(40);
        // Both strong-ish C values separate the data perfectly
        let cv = LogisticRegressionCv::new(vec![10.0, 100.0], 5, SolverConfig::default());
        let fit = cv.fit(x.view(), &y, &[0, 1]).unwrap();
        assert_eq!(fit.cv_scores, vec![1.0, 1.0]);
        assert_eq!(fit.best_c, 10.0);
    }

    #[test]
    fn test_descending_grid_sorted_before_selection() {
        let (x, y) = dataset(40);
        let cv = LogisticRegressionCv::new(vec![100.0, 10.0], 5, SolverConfig::default());
        assert_eq!(cv.cs(), &[10.0, 100.0]);

        let fit = cv.fit(x.view(), &y, &[0, 1]).unwrap();
        assert_eq!(fit.cv_scores, vec![1.0, 1.0]);
        assert_eq!(fit.best_c, 10.0);
    }

    #[test]
    fn test_empty_grid() {
        let (x, y) = dataset(10);
        let cv = LogisticRegressionCv::new(Vec::new(), 5, SolverConfig::default());
        assert!(matches!(cv.fit(x.view(), &y, &[0, 1]), Err(ModelError::EmptyGrid)));
    }
}
