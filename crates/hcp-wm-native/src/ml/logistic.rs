//! L1-penalized logistic regression
//!
//! Each binary problem minimizes
//!
//! ```text
//! ||w||_1 + C * sum_i [ log(1 + exp(z_i)) - y_i z_i ],   z_i = x_i . w + b
//! ```
//!
//! with an unpenalized intercept. Dividing by `C n` gives the form solved
//! here: mean log-loss plus `lambda ||w||_1`, `lambda = 1 / (C n)`.
//!
//! # Solver
//!
//! FISTA (accelerated proximal gradient) with backtracking. The initial step
//! is `1 / L` where `L = sigma_max([X 1])^2 / (4 n)` is estimated by power
//! iteration; backtracking halves it if the estimate is low.
//!
//! Multi-class problems are fit one-vs-rest and share the same C.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use hcp_wm_core::config::ModelConfig;
use tracing::debug;

use crate::error::{ModelError, ModelResult};

const POWER_ITERATIONS: usize = 30;
const MAX_BACKTRACKS: usize = 60;

/// Solver stopping rules
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Maximum FISTA iterations
    pub max_iter: usize,
    /// Stop when the largest parameter change is below `tol * max(1, |params|_inf)`
    pub tol: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tol: 1e-4,
        }
    }
}

impl From<&ModelConfig> for SolverConfig {
    fn from(config: &ModelConfig) -> Self {
        Self {
            max_iter: config.max_iter,
            tol: config.tol,
        }
    }
}

/// Solution of one binary problem
#[derive(Clone, Debug, PartialEq)]
pub struct BinaryFit {
    /// Feature weights
    pub coef: Array1<f64>,
    /// Intercept
    pub intercept: f64,
    /// Iterations used
    pub n_iter: usize,
    /// True if the tolerance was reached
    pub converged: bool,
}

/// Numerically stable `log(1 + exp(z))`
fn softplus(z: f64) -> f64 {
    z.max(0.0) + (-z.abs()).exp().ln_1p()
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

fn soft_threshold(v: f64, threshold: f64) -> f64 {
    if v > threshold {
        v - threshold
    } else if v < -threshold {
        v + threshold
    } else {
        0.0
    }
}

fn max_abs(a: &Array1<f64>) -> f64 {
    a.iter().fold(0.0f64, |m, v| m.max(v.abs()))
}

/// Mean log-loss at (w, b)
#[allow(clippy::cast_precision_loss)]
fn smooth_loss(x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>, w: &Array1<f64>, b: f64) -> f64 {
    let z = x.dot(w) + b;
    let total: f64 = z.iter().zip(y).map(|(&z, &y)| softplus(z) - y * z).sum();
    total / x.nrows() as f64
}

/// Mean log-loss and its gradient at (w, b)
#[allow(clippy::cast_precision_loss)]
fn smooth_loss_grad(
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    w: &Array1<f64>,
    b: f64,
) -> (f64, Array1<f64>, f64) {
    let n = x.nrows() as f64;
    let z = x.dot(w) + b;
    let mut loss = 0.0;
    let residual: Array1<f64> = z
        .iter()
        .zip(y)
        .map(|(&z, &y)| {
            loss += softplus(z) - y * z;
            sigmoid(z) - y
        })
        .collect();
    let grad_w = x.t().dot(&residual) / n;
    let grad_b = residual.sum() / n;
    (loss / n, grad_w, grad_b)
}

/// Lipschitz constant of the mean log-loss gradient w.r.t. (w, b)
#[allow(clippy::cast_precision_loss)]
pub fn lipschitz_constant(x: ArrayView2<'_, f64>) -> f64 {
    let (n, p) = x.dim();
    if n == 0 {
        return 1.0;
    }

    // Power iteration on [X 1]^T [X 1]
    let mut v = Array1::<f64>::from_elem(p, 1.0);
    let mut v_b = 1.0f64;
    let mut sigma_sq = 0.0;
    for _ in 0..POWER_ITERATIONS {
        let norm = (v.dot(&v) + v_b * v_b).sqrt();
        if norm == 0.0 {
            break;
        }
        v /= norm;
        v_b /= norm;

        let u = x.dot(&v) + v_b;
        let next = x.t().dot(&u);
        let next_b = u.sum();
        sigma_sq = next.dot(&v) + next_b * v_b;
        v = next;
        v_b = next_b;
    }

    (0.25 * sigma_sq / n as f64).max(f64::EPSILON)
}

/// Fit one binary L1 logistic problem with labels `y` in {0, 1}
///
/// `warm` seeds the solver (C path continuation); `lipschitz` comes from
/// [`lipschitz_constant`] on the same `x`.
#[allow(clippy::cast_precision_loss)]
pub fn fit_binary(
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    c: f64,
    warm: Option<&BinaryFit>,
    lipschitz: f64,
    solver: &SolverConfig,
) -> BinaryFit {
    let (n, p) = x.dim();
    let lambda = 1.0 / (c * n as f64);

    let (mut w, mut b) = warm.map_or_else(|| (Array1::zeros(p), 0.0), |fit| (fit.coef.clone(), fit.intercept));
    let mut w_prev = w.clone();
    let mut b_prev = b;
    let mut momentum_t = 1.0f64;
    let mut step = 1.0 / lipschitz;
    let mut converged = false;
    let mut n_iter = 0;

    for iter in 0..solver.max_iter {
        n_iter = iter + 1;

        let t_next = (1.0 + 4.0f64.mul_add(momentum_t * momentum_t, 1.0).sqrt()) / 2.0;
        let beta = (momentum_t - 1.0) / t_next;
        let v = &w + &((&w - &w_prev) * beta);
        let v_b = b + beta * (b - b_prev);

        let (f_v, grad_w, grad_b) = smooth_loss_grad(x, y, &v, v_b);

        let mut w_new = v.clone();
        let mut b_new = v_b;
        for _ in 0..MAX_BACKTRACKS {
            w_new = (&v - &(&grad_w * step)).mapv(|u| soft_threshold(u, step * lambda));
            b_new = v_b - step * grad_b;

            let dw = &w_new - &v;
            let db = b_new - v_b;
            let model = f_v + grad_w.dot(&dw) + grad_b * db + (dw.dot(&dw) + db * db) / (2.0 * step);
            if smooth_loss(x, y, &w_new, b_new) <= model + 1e-12 * model.abs() {
                break;
            }
            step *= 0.5;
        }

        w_prev = std::mem::replace(&mut w, w_new);
        b_prev = std::mem::replace(&mut b, b_new);
        momentum_t = t_next;

        let delta = max_abs(&(&w - &w_prev)).max((b - b_prev).abs());
        let scale = max_abs(&w).max(b.abs()).max(1.0);
        if delta <= solver.tol * scale {
            converged = true;
            break;
        }
    }

    BinaryFit {
        coef: w,
        intercept: b,
        n_iter,
        converged,
    }
}

/// Fitted L1 logistic classifier (binary or one-vs-rest)
#[derive(Clone, Debug, PartialEq)]
pub struct LogisticModel {
    classes: Vec<usize>,
    coef: Array2<f64>,
    intercept: Array1<f64>,
    c: f64,
    n_iter: usize,
}

impl LogisticModel {
    /// Fit with the classes present in `labels`
    ///
    /// # Errors
    ///
    /// Fails on mismatched inputs or fewer than two classes.
    pub fn fit(x: ArrayView2<'_, f64>, labels: &[usize], c: f64, solver: &SolverConfig) -> ModelResult<Self> {
        let mut classes = labels.to_vec();
        classes.sort_unstable();
        classes.dedup();
        Self::fit_with_classes(x, labels, &classes, c, solver)
    }

    /// Fit against a fixed class list
    ///
    /// Classes absent from `labels` still get a coefficient row, so models
    /// fit on different subsets share one shape.
    ///
    /// # Errors
    ///
    /// Fails on mismatched inputs, fewer than two classes, or a bad C.
    pub fn fit_with_classes(
        x: ArrayView2<'_, f64>,
        labels: &[usize],
        classes: &[usize],
        c: f64,
        solver: &SolverConfig,
    ) -> ModelResult<Self> {
        let lipschitz = lipschitz_constant(x);
        Self::fit_path(x, labels, classes, &[c], solver, lipschitz)?
            .pop()
            .ok_or(ModelError::EmptyGrid)
    }

    /// Fit one model per C, warm-starting each from the previous one
    ///
    /// # Errors
    ///
    /// Same as [`fit_with_classes`](Self::fit_with_classes).
    pub(crate) fn fit_path(
        x: ArrayView2<'_, f64>,
        labels: &[usize],
        classes: &[usize],
        cs: &[f64],
        solver: &SolverConfig,
        lipschitz: f64,
    ) -> ModelResult<Vec<Self>> {
        validate_inputs(x, labels, classes)?;
        if let Some(&c) = cs.iter().find(|c| !(c.is_finite() && **c > 0.0)) {
            return Err(ModelError::InvalidParameter {
                parameter: "C",
                reason: format!("{c} is not positive"),
            });
        }

        // One binary target per coefficient row
        let targets: Vec<Array1<f64>> = if classes.len() == 2 {
            vec![indicator(labels, classes[1])]
        } else {
            classes.iter().map(|&k| indicator(labels, k)).collect()
        };

        let mut previous: Vec<Option<BinaryFit>> = vec![None; targets.len()];

        let mut models = Vec::with_capacity(cs.len());
        for &c in cs {
            let fits: Vec<BinaryFit> = targets
                .iter()
                .zip(&previous)
                .map(|(y, warm)| fit_binary(x, y.view(), c, warm.as_ref(), lipschitz, solver))
                .collect();

            let mut coef = Array2::zeros((fits.len(), x.ncols()));
            for (mut row, fit) in coef.outer_iter_mut().zip(&fits) {
                row.assign(&fit.coef);
            }
            let intercept: Array1<f64> = fits.iter().map(|f| f.intercept).collect();
            let n_iter = fits.iter().map(|f| f.n_iter).max().unwrap_or(0);
            if fits.iter().any(|f| !f.converged) {
                debug!(c, n_iter, "Solver hit max_iter before converging");
            }

            previous = fits.into_iter().map(Some).collect();
            models.push(Self {
                classes: classes.to_vec(),
                coef,
                intercept,
                c,
                n_iter,
            });
        }
        Ok(models)
    }

    /// Decision values, one column per coefficient row
    ///
    /// # Errors
    ///
    /// Fails if `x` has the wrong number of features.
    pub fn decision_function(&self, x: ArrayView2<'_, f64>) -> ModelResult<Array2<f64>> {
        if x.ncols() != self.coef.ncols() {
            return Err(ModelError::FeatureMismatch {
                expected: self.coef.ncols(),
                got: x.ncols(),
            });
        }
        Ok(x.dot(&self.coef.t()) + &self.intercept.view().insert_axis(Axis(0)))
    }

    /// Predicted class labels
    ///
    /// # Errors
    ///
    /// Fails if `x` has the wrong number of features.
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> ModelResult<Vec<usize>> {
        let scores = self.decision_function(x)?;
        Ok(scores
            .outer_iter()
            .map(|row| {
                if self.is_binary() {
                    self.classes[usize::from(row[0] > 0.0)]
                } else {
                    let best = row
                        .iter()
                        .enumerate()
                        .fold((0, f64::NEG_INFINITY), |(bi, bv), (i, &v)| if v > bv { (i, v) } else { (bi, bv) })
                        .0;
                    self.classes[best]
                }
            })
            .collect())
    }

    /// Fraction of rows predicted correctly
    ///
    /// # Errors
    ///
    /// Fails on mismatched inputs.
    #[allow(clippy::cast_precision_loss)]
    pub fn score(&self, x: ArrayView2<'_, f64>, labels: &[usize]) -> ModelResult<f64> {
        if x.nrows() != labels.len() {
            return Err(ModelError::DimensionMismatch {
                rows: x.nrows(),
                labels: labels.len(),
            });
        }
        if labels.is_empty() {
            return Err(ModelError::InsufficientSamples {
                operation: "scoring",
                got: 0,
                need: 1,
            });
        }
        let predictions = self.predict(x)?;
        let correct = predictions.iter().zip(labels).filter(|(p, l)| p == l).count();
        Ok(correct as f64 / labels.len() as f64)
    }

    /// True for a two-class model with a single coefficient row
    #[must_use]
    pub fn is_binary(&self) -> bool {
        self.classes.len() == 2
    }

    /// Class labels, in coefficient-row order for multi-class models
    #[must_use]
    pub fn classes(&self) -> &[usize] {
        &self.classes
    }

    /// Coefficients (1 × features for binary, classes × features otherwise)
    #[must_use]
    pub fn coef(&self) -> &Array2<f64> {
        &self.coef
    }

    /// Intercepts, one per coefficient row
    #[must_use]
    pub fn intercept(&self) -> &Array1<f64> {
        &self.intercept
    }

    /// Inverse regularization strength used
    #[must_use]
    pub fn c(&self) -> f64 {
        self.c
    }

    /// Largest iteration count over the binary problems
    #[must_use]
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    /// Number of non-zero coefficients
    #[must_use]
    pub fn n_nonzero(&self) -> usize {
        self.coef.iter().filter(|v| **v != 0.0).count()
    }
}

fn indicator(labels: &[usize], positive: usize) -> Array1<f64> {
    labels.iter().map(|&l| if l == positive { 1.0 } else { 0.0 }).collect()
}

fn validate_inputs(x: ArrayView2<'_, f64>, labels: &[usize], classes: &[usize]) -> ModelResult<()> {
    if x.nrows() != labels.len() {
        return Err(ModelError::DimensionMismatch {
            rows: x.nrows(),
            labels: labels.len(),
        });
    }
    if x.nrows() == 0 {
        return Err(ModelError::InsufficientSamples {
            operation: "fit",
            got: 0,
            need: 1,
        });
    }
    if classes.len() < 2 {
        return Err(ModelError::InsufficientSamples {
            operation: "fit (distinct classes)",
            got: classes.len(),
            need: 2,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    /// Two well-separated clusters along feature 0; feature 1 is noise-free zero
    fn separable() -> (Array2<f64>, Vec<usize>) {
        let x = array![
            [-2.0, 0.0],
            [-1.5, 0.0],
            [-1.0, 0.0],
            [-2.5, 0.0],
            [1.0, 0.0],
            [1.5, 0.0],
            [2.0, 0.0],
            [2.5, 0.0],
        ];
        (x, vec![0, 0, 0, 0, 1, 1, 1, 1])
    }

    #[test]
    fn test_softplus_sigmoid_stable() {
        assert!((softplus(0.0) - 2f64.ln()).abs() < 1e-12);
        assert!((softplus(800.0) - 800.0).abs() < 1e-9);
        assert!(softplus(-800.0).abs() < 1e-12);
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!(sigmoid(-800.0) >= 0.0);
    }

    #[test]
    fn test_soft_threshold() {
        assert_eq!(soft_threshold(3.0, 1.0), 2.0);
        assert_eq!(soft_threshold(-3.0, 1.0), -2.0);
        assert_eq!(soft_threshold(0.5, 1.0), 0.0);
    }

    #[test]
    fn test_separable_binary() {
        let (x, y) = separable();
        let model = LogisticModel::fit(x.view(), &y, 10.0, &SolverConfig::default()).unwrap();

        assert!(model.is_binary());
        assert_eq!(model.coef().dim(), (1, 2));
        assert!(model.coef()[[0, 0]] > 0.0);
        assert_eq!(model.coef()[[0, 1]], 0.0);
        assert_eq!(model.score(x.view(), &y).unwrap(), 1.0);
    }

    #[test]
    fn test_strong_penalty_zeroes_weights() {
        let (x, y) = separable();
        let model = LogisticModel::fit(x.view(), &y, 1e-4, &SolverConfig::default()).unwrap();
        assert_eq!(model.n_nonzero(), 0);
        // Balanced classes: intercept stays near zero
        assert!(model.intercept()[0].abs() < 1e-3);
    }

    #[test]
    fn test_one_vs_rest_three_classes() {
        let x = array![
            [3.0, 0.0],
            [3.5, 0.2],
            [0.0, 3.0],
            [0.2, 3.5],
            [-3.0, -3.0],
            [-3.5, -3.2],
        ];
        let y = vec![0, 0, 1, 1, 2, 2];
        let model = LogisticModel::fit(x.view(), &y, 100.0, &SolverConfig::default()).unwrap();

        assert_eq!(model.coef().dim(), (3, 2));
        assert_eq!(model.predict(x.view()).unwrap(), y);
    }

    #[test]
    fn test_fixed_classes_keep_shape() {
        let (x, _) = separable();
        let y = vec![0, 0, 0, 0, 2, 2, 2, 2];
        let model =
            LogisticModel::fit_with_classes(x.view(), &y, &[0, 1, 2, 3], 1.0, &SolverConfig::default()).unwrap();
        assert_eq!(model.coef().nrows(), 4);
        assert!(model.predict(x.view()).unwrap().iter().all(|p| *p == 0 || *p == 2));
    }

    #[test]
    fn test_single_class_rejected() {
        let (x, _) = separable();
        let err = LogisticModel::fit(x.view(), &[1; 8], 1.0, &SolverConfig::default()).unwrap_err();
        assert!(matches!(err, ModelError::InsufficientSamples { .. }));
    }

    #[test]
    fn test_feature_mismatch() {
        let (x, y) = separable();
        let model = LogisticModel::fit(x.view(), &y, 1.0, &SolverConfig::default()).unwrap();
        let wrong = Array2::<f64>::zeros((2, 3));
        assert!(matches!(
            model.predict(wrong.view()),
            Err(ModelError::FeatureMismatch { expected: 2, got: 3 })
        ));
    }

    #[test]
    fn test_lipschitz_bounds_gradient_curvature() {
        let (x, _) = separable();
        let l = lipschitz_constant(x.view());
        // sigma_max^2 of [X 1] is at most its squared Frobenius norm
        let frob: f64 = x.iter().map(|v| v * v).sum::<f64>() + 8.0;
        assert!(l > 0.0);
        assert!(l <= 0.25 * frob / 8.0 + 1e-9);
    }
}
