use rand::prelude::*;
use rand::rngs::StdRng;

use crate::dataset::DataSet;
use crate::error::{EvalError, Result};

/// Hold out one random interaction per user as the test set.
///
/// Users with a single interaction keep it in the training set, since there
/// would be nothing left to learn from.
pub fn leave_one_out(data: &DataSet, seed: u64) -> (DataSet, DataSet) {
    // Group interaction positions by user
    let mut by_user: Vec<Vec<usize>> = vec![Vec::new(); data.user_count()];
    for (pos, &u) in data.user_indices().iter().enumerate() {
        by_user[u].push(pos);
    }

    let mut train = Vec::with_capacity(data.len());
    let mut test = Vec::with_capacity(by_user.len());
    let mut rng = StdRng::seed_from_u64(seed);

    for positions in by_user {
        if positions.len() < 2 {
            train.extend(positions);
            continue;
        }
        let Some(&held_out) = positions.choose(&mut rng) else {
            continue;
        };
        test.push(held_out);
        train.extend(positions.into_iter().filter(|&pos| pos != held_out));
    }

    train.sort_unstable();
    test.sort_unstable();
    (data.subset(&train), data.subset(&test))
}

/// Shuffle all interactions and send `test_ratio` of them to the test set.
pub fn train_test_split(data: &DataSet, test_ratio: f64, seed: u64) -> Result<(DataSet, DataSet)> {
    if !(0.0..=1.0).contains(&test_ratio) {
        return Err(EvalError::InvalidArgument(format!(
            "test_ratio must be between 0 and 1, got {test_ratio}"
        )));
    }

    let n = data.len();
    let mut positions: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    positions.shuffle(&mut rng);

    let test_size = (n as f64 * test_ratio).round() as usize;
    let (test, train) = positions.split_at(test_size.min(n));
    Ok((data.subset(train), data.subset(test)))
}
