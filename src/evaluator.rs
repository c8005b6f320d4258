use rayon::prelude::*;

use crate::dataset::DataSet;
use crate::error::Result;
use crate::indexer::Indexer;
use crate::metrics::{mae, rmse, RankingMetric};
use crate::model::{Predictor, RuntimeOptions};
use crate::subset::TargetSet;

// ── Helpers ────────────────────────────────────────────────────────

/// Run `op` on the options' worker pool, or on the global pool.
fn install<T, F>(options: &RuntimeOptions, op: F) -> T
where
    T: Send,
    F: FnOnce() -> T + Send,
{
    match options.thread_pool() {
        Some(pool) => pool.install(op),
        None => op(),
    }
}

/// Model score with non-finite values mapped to 0.
#[inline]
fn score<P: Predictor + ?Sized>(model: &P, user_id: &str, item_id: &str) -> f64 {
    let s = model.predict(user_id, item_id);
    if s.is_finite() { s } else { 0.0 }
}

macro_rules! report {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            tracing::info!($($arg)+);
        } else {
            tracing::debug!($($arg)+);
        }
    };
}

// ── AUC ────────────────────────────────────────────────────────────

/// Rank-sum AUC for one user, ties counted as half. `None` unless the user has
/// both positive and negative candidates.
fn user_auc<P: Predictor + ?Sized>(
    model: &P,
    user_id: &str,
    target: &TargetSet,
    items: &Indexer,
    excluded: Option<&TargetSet>,
) -> Option<f64> {
    let mut scored: Vec<(f64, bool)> = Vec::with_capacity(items.len());
    for item_id in items.ids() {
        let positive = target.value(item_id).is_some_and(|v| v != 0.0);
        if !positive && excluded.is_some_and(|ex| ex.contains(item_id)) {
            continue;
        }
        scored.push((score(model, user_id, item_id), positive));
    }

    let n_pos = scored.iter().filter(|(_, pos)| *pos).count();
    let n_neg = scored.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    scored.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

    // Tied scores share the mean of the ranks they span.
    let mut rank_sum = 0.0f64;
    let mut start = 0;
    while start < scored.len() {
        let mut end = start + 1;
        while end < scored.len() && scored[end].0 == scored[start].0 {
            end += 1;
        }
        let mid_rank = (start + 1 + end) as f64 / 2.0;
        let hits = scored[start..end].iter().filter(|(_, pos)| *pos).count();
        rank_sum += mid_rank * hits as f64;
        start = end;
    }

    let p = n_pos as f64;
    let n = n_neg as f64;
    Some((rank_sum - p * (p + 1.0) / 2.0) / (p * n))
}

fn auc_inner<P: Predictor + Sync + ?Sized>(
    model: &P,
    test_set: &DataSet,
    exclude_set: Option<&DataSet>,
    options: &RuntimeOptions,
) -> f64 {
    let items = test_set.item_indexer();
    let n_users = test_set.user_count();

    let (sum, count) = install(options, || {
        (0..n_users)
            .into_par_iter()
            .filter_map(|u| {
                let user_id = test_set.user_indexer().to_id(u)?;
                let target = test_set.user_by_index(u)?;
                let excluded = exclude_set.and_then(|ex| ex.user(user_id));
                let auc = user_auc(model, user_id, target, items, excluded);
                if auc.is_none() {
                    tracing::debug!(user = user_id, "skipping user without both positive and negative items");
                }
                auc
            })
            .fold(|| (0.0f64, 0usize), |acc, auc| (acc.0 + auc, acc.1 + 1))
            .reduce(|| (0.0, 0), |a, b| (a.0 + b.0, a.1 + b.1))
    });

    let auc = if count == 0 { 0.0 } else { sum / count as f64 };
    report!(
        options.verbose,
        eligible = count,
        skipped = n_users - count,
        auc,
        "evaluated AUC"
    );
    auc
}

/// Macro-averaged AUC of `model` over every user of `test_set`.
///
/// For each user the candidates are all items of the test set; positives are
/// the user's held-out items with a nonzero rating. Users without both a
/// positive and a negative candidate are skipped. Returns 0 when no user is
/// eligible.
pub fn evaluate_auc<P: Predictor + Sync + ?Sized>(
    model: &P,
    test_set: &DataSet,
    options: Option<&RuntimeOptions>,
) -> f64 {
    let options = options.cloned().unwrap_or_default();
    auc_inner(model, test_set, None, &options)
}

/// Like [`evaluate_auc`], but items a user already has in `exclude_set`
/// (typically the training data) are not used as negatives.
pub fn evaluate_auc_excluding<P: Predictor + Sync + ?Sized>(
    model: &P,
    test_set: &DataSet,
    exclude_set: &DataSet,
    options: Option<&RuntimeOptions>,
) -> f64 {
    let options = options.cloned().unwrap_or_default();
    auc_inner(model, test_set, Some(exclude_set), &options)
}

// ── Top-N & ranking evaluation ─────────────────────────────────────

/// The `n` best-scoring items for `user_id`, best first. Items in `excluded`
/// are never recommended; equal scores are ordered by item index.
pub fn top_n<P: Predictor + ?Sized>(
    model: &P,
    user_id: &str,
    items: &Indexer,
    excluded: Option<&TargetSet>,
    n: usize,
) -> Vec<String> {
    let mut scored: Vec<(f64, usize)> = items
        .ids()
        .iter()
        .enumerate()
        .filter(|(_, id)| !excluded.is_some_and(|ex| ex.contains(id)))
        .map(|(idx, id)| (score(model, user_id, id), idx))
        .collect();

    let take = n.min(scored.len());
    if take == 0 {
        return vec![];
    }
    let by_score = |a: &(f64, usize), b: &(f64, usize)| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1));
    scored.select_nth_unstable_by(take - 1, by_score);
    scored.truncate(take);
    scored.sort_unstable_by(by_score);
    scored
        .into_iter()
        .filter_map(|(_, idx)| items.to_id(idx).map(str::to_owned))
        .collect()
}

/// Average each of `metrics` over the top-`n` lists of every test user.
///
/// Candidates are the items of `test_set` and `exclude_set`; a user's own
/// items in `exclude_set` are left out of their list. Returns one value per
/// metric, in order, all 0 when the test set is empty.
pub fn evaluate_rank<P: Predictor + Sync + ?Sized>(
    model: &P,
    test_set: &DataSet,
    exclude_set: Option<&DataSet>,
    n: usize,
    metrics: &[RankingMetric],
    options: Option<&RuntimeOptions>,
) -> Vec<f64> {
    let options = options.cloned().unwrap_or_default();

    let mut items = test_set.item_indexer().clone();
    if let Some(ex) = exclude_set {
        for id in ex.item_indexer().ids() {
            items.add(id);
        }
    }

    let n_users = test_set.user_count();
    let (sums, count) = install(&options, || {
        (0..n_users)
            .into_par_iter()
            .filter_map(|u| {
                let user_id = test_set.user_indexer().to_id(u)?;
                let target = test_set.user_by_index(u).filter(|t| !t.is_empty())?;
                let excluded = exclude_set.and_then(|ex| ex.user(user_id));
                let list = top_n(model, user_id, &items, excluded, n);
                Some(metrics.iter().map(|m| m.compute(target, &list)).collect::<Vec<f64>>())
            })
            .fold(
                || (vec![0.0f64; metrics.len()], 0usize),
                |(mut sums, count), scores| {
                    sums.iter_mut().zip(&scores).for_each(|(s, v)| *s += v);
                    (sums, count + 1)
                },
            )
            .reduce(
                || (vec![0.0f64; metrics.len()], 0usize),
                |(mut a, ca), (b, cb)| {
                    a.iter_mut().zip(&b).for_each(|(s, v)| *s += v);
                    (a, ca + cb)
                },
            )
    });

    let means: Vec<f64> = if count == 0 {
        sums
    } else {
        sums.into_iter().map(|s| s / count as f64).collect()
    };
    for (metric, value) in metrics.iter().zip(&means) {
        report!(options.verbose, metric = %metric, n, users = count, value, "evaluated ranking");
    }
    means
}

// ── Rating evaluation ──────────────────────────────────────────────

/// RMSE and MAE of the model's predictions against every rating in `test_set`.
pub fn evaluate_rating<P: Predictor + ?Sized>(model: &P, test_set: &DataSet) -> Result<[f64; 2]> {
    let (predicted, actual): (Vec<f64>, Vec<f64>) = test_set
        .iter()
        .map(|(user, item, rating)| (score(model, user, item), rating))
        .unzip();
    Ok([rmse(&predicted, &actual)?, mae(&predicted, &actual)?])
}
