use rand::{SeedableRng, seq::SliceRandom};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::Classification;

/// Row indices of the training and held-out partitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Stratified, seeded train/test split.
///
/// Each class is shuffled on its own and `round(n_class * test_size)` of its
/// rows are held out, capped so at least one row per class stays in the
/// training partition. The same labels, fraction and seed always give the
/// same split. Both index lists come back sorted.
#[must_use]
pub fn stratified_split(labels: &[Classification], test_size: f64, seed: u64) -> Split {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut split = Split {
        train: Vec::with_capacity(labels.len()),
        test: Vec::new(),
    };

    for class in [Classification::Real, Classification::Fake] {
        let mut rows = labels
            .iter()
            .enumerate()
            .filter(|(_, label)| **label == class)
            .map(|(idx, _)| idx)
            .collect::<Vec<_>>();
        if rows.is_empty() {
            continue;
        }
        rows.shuffle(&mut rng);

        let n_test = ((rows.len() as f64 * test_size).round() as usize).min(rows.len() - 1);
        let train_rows = rows.split_off(n_test);
        debug!(%class, train = train_rows.len(), test = rows.len(), "Class split");
        split.test.extend(rows);
        split.train.extend(train_rows);
    }

    split.train.sort_unstable();
    split.test.sort_unstable();
    split
}
