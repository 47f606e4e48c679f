//! Summary statistics and seed derivation
//!
//! Standard deviations are population standard deviations (ddof = 0)
//! throughout the workspace.

use serde::{Deserialize, Serialize};

/// Mean and population standard deviation of a sequence
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeanStd {
    /// Arithmetic mean
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
}

impl MeanStd {
    /// Compute over a slice; NaN for an empty slice
    #[must_use]
    pub fn of(values: &[f64]) -> Self {
        Self {
            mean: mean(values),
            std: std_population(values),
        }
    }
}

/// Arithmetic mean; NaN for an empty slice
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; NaN for an empty slice
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn std_population(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// `n` values evenly spaced on a log10 scale from `10^start` to `10^stop`
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn logspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![10f64.powf(start)],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n).map(|i| 10f64.powf(start + step * i as f64)).collect()
        }
    }
}

/// Seed for repetition `index` under `base_seed` (SplitMix64 finalizer)
///
/// Depends only on its two arguments, so any repetition can be replayed
/// without running the ones before it.
#[must_use]
pub const fn derive_seed(base_seed: u64, index: u64) -> u64 {
    let mut z = base_seed.wrapping_add(index.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
