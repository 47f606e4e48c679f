//! Stratified k-fold assignment
//!
//! Deterministic, no shuffling. Labels are sorted and dealt round-robin to
//! folds; each class then fills its folds in row order. Fold sizes differ by
//! at most one and class proportions are kept as close as possible.

use tracing::warn;

use crate::error::{ModelError, ModelResult};

/// Train/test rows of one fold
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fold {
    /// Training rows (ascending)
    pub train: Vec<usize>,
    /// Validation rows (ascending)
    pub test: Vec<usize>,
}

/// Split rows into `n_splits` stratified folds
///
/// # Errors
///
/// Fails if there are fewer rows than folds, or every class has fewer
/// members than folds.
pub fn stratified_folds(labels: &[usize], n_splits: usize) -> ModelResult<Vec<Fold>> {
    let n = labels.len();
    if n_splits < 2 {
        return Err(ModelError::InvalidParameter {
            parameter: "cv_folds",
            reason: format!("need at least 2 folds, got {n_splits}"),
        });
    }
    if n < n_splits {
        return Err(ModelError::InsufficientSamples {
            operation: "stratified folds",
            got: n,
            need: n_splits,
        });
    }

    // Encode classes by order of first appearance
    let mut first_seen: Vec<usize> = Vec::new();
    let encoded: Vec<usize> = labels
        .iter()
        .map(|label| {
            first_seen.iter().position(|c| c == label).unwrap_or_else(|| {
                first_seen.push(*label);
                first_seen.len() - 1
            })
        })
        .collect();
    let n_classes = first_seen.len();

    let mut counts = vec![0usize; n_classes];
    for &k in &encoded {
        counts[k] += 1;
    }
    if counts.iter().all(|&c| c < n_splits) {
        return Err(ModelError::InsufficientSamples {
            operation: "stratified folds (members per class)",
            got: counts.iter().copied().max().unwrap_or(0),
            need: n_splits,
        });
    }
    if let Some(&smallest) = counts.iter().min().filter(|&&c| c < n_splits) {
        warn!(smallest, n_splits, "Least populated class has fewer members than folds");
    }

    // allocation[fold][class]: class counts in sorted[fold::n_splits]
    let mut sorted = encoded.clone();
    sorted.sort_unstable();
    let mut allocation = vec![vec![0usize; n_classes]; n_splits];
    for (i, &k) in sorted.iter().enumerate() {
        allocation[i % n_splits][k] += 1;
    }

    let mut test_fold = vec![0usize; n];
    for k in 0..n_classes {
        let mut folds_for_class = (0..n_splits).flat_map(|f| std::iter::repeat(f).take(allocation[f][k]));
        for (row, _) in encoded.iter().enumerate().filter(|(_, &c)| c == k) {
            test_fold[row] = folds_for_class.next().unwrap_or(n_splits - 1);
        }
    }

    Ok((0..n_splits)
        .map(|f| {
            let (test, train): (Vec<usize>, Vec<usize>) = (0..n).partition(|&row| test_fold[row] == f);
            Fold { train, test }
        })
        .collect())
}
