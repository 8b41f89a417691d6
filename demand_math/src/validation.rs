//! Forward-chaining train/test splits for time-ordered samples
//!
//! Samples are assumed to be sorted chronologically. The series is cut into
//! `n_splits + 1` equal blocks (any remainder goes to the first training
//! block); fold `i` tests on block `i + 1` and trains on everything before
//! it. Test rows therefore always come after their training rows and the
//! training window grows with each fold.

use crate::{MathError, Result};
use std::ops::Range;

/// One train/test fold, expressed as index ranges into the ordered samples
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    /// Rows used for fitting
    pub train: Range<usize>,
    /// Rows used for scoring, all after `train`
    pub test: Range<usize>,
}

/// Build forward-chaining folds over `n_samples` ordered rows.
pub fn forward_chaining_splits(n_samples: usize, n_splits: usize) -> Result<Vec<Fold>> {
    if n_splits == 0 {
        return Err(MathError::InvalidInput(
            "Number of splits must be positive".to_string(),
        ));
    }
    if n_samples < n_splits + 1 {
        return Err(MathError::InsufficientData(format!(
            "Cannot make {} forward-chaining splits from {} samples",
            n_splits, n_samples
        )));
    }

    let test_size = n_samples / (n_splits + 1);
    let first_test = n_samples - n_splits * test_size;

    Ok((0..n_splits)
        .map(|i| {
            let start = first_test + i * test_size;
            Fold {
                train: 0..start,
                test: start..start + test_size,
            }
        })
        .collect())
}

/// The largest usable number of splits, capped at `requested`.
/// Returns 0 when there are fewer than two samples.
pub fn feasible_splits(n_samples: usize, requested: usize) -> usize {
    requested.min(n_samples.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_six_samples_five_splits() {
        let folds = forward_chaining_splits(6, 5).unwrap();
        assert_eq!(folds.len(), 5);
        assert_eq!(folds[0], Fold { train: 0..1, test: 1..2 });
        assert_eq!(folds[4], Fold { train: 0..5, test: 5..6 });
    }

    #[test]
    fn test_remainder_goes_to_first_train_block() {
        let folds = forward_chaining_splits(10, 3).unwrap();
        // test_size = 2, first test starts at 10 - 6 = 4
        assert_eq!(folds[0], Fold { train: 0..4, test: 4..6 });
        assert_eq!(folds[1], Fold { train: 0..6, test: 6..8 });
        assert_eq!(folds[2], Fold { train: 0..8, test: 8..10 });
    }

    #[rstest]
    #[case(20, 5)]
    #[case(7, 3)]
    #[case(100, 4)]
    fn test_test_always_after_train(#[case] n: usize, #[case] k: usize) {
        for fold in forward_chaining_splits(n, k).unwrap() {
            assert!(!fold.train.is_empty());
            assert!(!fold.test.is_empty());
            assert_eq!(fold.train.end, fold.test.start);
            assert!(fold.test.end <= n);
        }
    }

    #[test]
    fn test_invalid_splits() {
        assert!(forward_chaining_splits(3, 0).is_err());
        assert!(forward_chaining_splits(3, 3).is_err());
    }

    #[test]
    fn test_feasible_splits() {
        assert_eq!(feasible_splits(100, 5), 5);
        assert_eq!(feasible_splits(4, 5), 3);
        assert_eq!(feasible_splits(1, 5), 0);
        assert_eq!(feasible_splits(0, 5), 0);
    }
}
