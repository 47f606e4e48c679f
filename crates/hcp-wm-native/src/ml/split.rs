//! Shuffled train/test splitting

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{ModelError, ModelResult};

/// Row indices of a train/test partition
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrainTestSplit {
    /// Training rows
    pub train: Vec<usize>,
    /// Held-out rows
    pub test: Vec<usize>,
}

/// Shuffle `0..n` and hold out `ceil(test_fraction * n)` rows
///
/// The first `n_test` indices of the permutation form the test set.
///
/// # Errors
///
/// Fails if the fraction is outside (0, 1) or either side would be empty.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn train_test_split<R: Rng + ?Sized>(
    n: usize,
    test_fraction: f64,
    rng: &mut R,
) -> ModelResult<TrainTestSplit> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(ModelError::InvalidParameter {
            parameter: "test_fraction",
            reason: format!("{test_fraction} not in (0, 1)"),
        });
    }

    let n_test = (test_fraction * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(ModelError::InsufficientSamples {
            operation: "train/test split",
            got: n,
            need: 2,
        });
    }

    let mut permutation: Vec<usize> = (0..n).collect();
    permutation.shuffle(rng);
    let train = permutation.split_off(n_test);

    Ok(TrainTestSplit {
        train,
        test: permutation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_sizes_round_test_up() {
        let mut rng = StdRng::seed_from_u64(7);
        let split = train_test_split(20, 0.125, &mut rng).unwrap();
        assert_eq!(split.test.len(), 3);
        assert_eq!(split.train.len(), 17);

        let mut all: Vec<_> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_same_seed_same_split() {
        let a = train_test_split(50, 0.125, &mut StdRng::seed_from_u64(3)).unwrap();
        let b = train_test_split(50, 0.125, &mut StdRng::seed_from_u64(3)).unwrap();
        let c = train_test_split(50, 0.125, &mut StdRng::seed_from_u64(4)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_rejects_tiny_input() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(train_test_split(1, 0.5, &mut rng).is_err());
        assert!(train_test_split(10, 0.0, &mut rng).is_err());
    }
}
