//! Stratified train/test split.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{PipelineError, Result};

/// Row indices of the two partitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split binary labels so each class keeps its share in both partitions.
///
/// Each class is shuffled with the seeded generator and `round(n_class *
/// test_size)` of its rows are held out.
///
/// # Errors
/// Returns `Training` if `test_size` is outside `(0, 1)` or either partition
/// would be empty.
pub fn stratified_split(labels: &[u8], test_size: f64, seed: u64) -> Result<SplitIndices> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(PipelineError::Training(format!(
            "test_size must be in (0, 1), got {test_size}"
        )));
    }

    let mut class0: Vec<usize> = Vec::new();
    let mut class1: Vec<usize> = Vec::new();
    for (i, &label) in labels.iter().enumerate() {
        if label == 0 {
            class0.push(i);
        } else {
            class1.push(i);
        }
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    class0.shuffle(&mut rng);
    class1.shuffle(&mut rng);

    let test0 = (class0.len() as f64 * test_size).round() as usize;
    let test1 = (class1.len() as f64 * test_size).round() as usize;

    let test: Vec<usize> = class0[..test0]
        .iter()
        .chain(class1[..test1].iter())
        .copied()
        .collect();
    let train: Vec<usize> = class0[test0..]
        .iter()
        .chain(class1[test1..].iter())
        .copied()
        .collect();

    if train.is_empty() || test.is_empty() {
        return Err(PipelineError::Training(format!(
            "Stratified split of {} rows left an empty partition",
            labels.len()
        )));
    }

    tracing::debug!(
        "Split: train={} ({}+{}) test={} ({}+{})",
        train.len(),
        class0.len() - test0,
        class1.len() - test1,
        test.len(),
        test0,
        test1,
    );

    Ok(SplitIndices { train, test })
}
