use std::fmt;
use std::str::FromStr;

use ahash::AHashSet;

use crate::error::{check_len, EvalError, Result};
use crate::subset::TargetSet;

// ── Pointwise metrics ──────────────────────────────────────────────

/// Root mean squared error. Empty input scores 0.
pub fn rmse(predicted: &[f64], actual: &[f64]) -> Result<f64> {
    check_len(predicted.len(), actual.len())?;
    if predicted.is_empty() {
        return Ok(0.0);
    }
    let sse: f64 = predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| (p - a) * (p - a))
        .sum();
    Ok((sse / predicted.len() as f64).sqrt())
}

/// Mean absolute error. Empty input scores 0.
pub fn mae(predicted: &[f64], actual: &[f64]) -> Result<f64> {
    check_len(predicted.len(), actual.len())?;
    if predicted.is_empty() {
        return Ok(0.0);
    }
    let sae: f64 = predicted.iter().zip(actual).map(|(p, a)| (p - a).abs()).sum();
    Ok(sae / predicted.len() as f64)
}

// ── Ranking metrics ────────────────────────────────────────────────
//
// `rank_list` is best first and taken as-is: no re-sorting, no tie-breaking.
// Ids unknown to `target` are misses. A relevant id repeated in the list only
// counts at its first position. Zero denominators score 0.

#[inline]
fn discount(pos: usize) -> f64 {
    // `pos` is zero-based, so rank i = pos + 1 gets 1 / log2(i + 1)
    1.0 / (pos as f64 + 2.0).log2()
}

/// Zero-based positions of the first occurrence of each relevant id.
fn hit_positions<'a, S: AsRef<str>>(
    target: &'a TargetSet,
    rank_list: &'a [S],
) -> impl Iterator<Item = usize> + 'a {
    let mut seen: AHashSet<&'a str> = AHashSet::new();
    rank_list.iter().enumerate().filter_map(move |(pos, id)| {
        let id = id.as_ref();
        (target.contains(id) && seen.insert(id)).then_some(pos)
    })
}

pub fn ndcg<S: AsRef<str>>(target: &TargetSet, rank_list: &[S]) -> f64 {
    let dcg: f64 = hit_positions(target, rank_list).map(discount).sum();
    let idcg: f64 = (0..target.len().min(rank_list.len())).map(discount).sum();
    if idcg == 0.0 { 0.0 } else { dcg / idcg }
}

pub fn precision<S: AsRef<str>>(target: &TargetSet, rank_list: &[S]) -> f64 {
    if rank_list.is_empty() {
        return 0.0;
    }
    hit_positions(target, rank_list).count() as f64 / rank_list.len() as f64
}

pub fn recall<S: AsRef<str>>(target: &TargetSet, rank_list: &[S]) -> f64 {
    if target.is_empty() {
        return 0.0;
    }
    hit_positions(target, rank_list).count() as f64 / target.len() as f64
}

/// Average precision, normalised by the size of the target set rather than
/// the number of hits found.
pub fn map<S: AsRef<str>>(target: &TargetSet, rank_list: &[S]) -> f64 {
    if target.is_empty() {
        return 0.0;
    }
    let sum: f64 = hit_positions(target, rank_list)
        .enumerate()
        .map(|(hit, pos)| (hit + 1) as f64 / (pos + 1) as f64)
        .sum();
    sum / target.len() as f64
}

pub use self::map as average_precision;

/// Reciprocal rank of the first hit.
pub fn mrr<S: AsRef<str>>(target: &TargetSet, rank_list: &[S]) -> f64 {
    rank_list
        .iter()
        .position(|id| target.contains(id.as_ref()))
        .map_or(0.0, |pos| 1.0 / (pos + 1) as f64)
}

/// 1 if any item of the list is relevant.
pub fn hit_rate<S: AsRef<str>>(target: &TargetSet, rank_list: &[S]) -> f64 {
    if rank_list.iter().any(|id| target.contains(id.as_ref())) { 1.0 } else { 0.0 }
}

// ── Metric selection ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RankingMetric {
    Ndcg,
    Precision,
    Recall,
    Map,
    Mrr,
    HitRate,
}

impl RankingMetric {
    pub const ALL: [RankingMetric; 6] = [
        RankingMetric::Ndcg,
        RankingMetric::Precision,
        RankingMetric::Recall,
        RankingMetric::Map,
        RankingMetric::Mrr,
        RankingMetric::HitRate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RankingMetric::Ndcg => "ndcg",
            RankingMetric::Precision => "precision",
            RankingMetric::Recall => "recall",
            RankingMetric::Map => "map",
            RankingMetric::Mrr => "mrr",
            RankingMetric::HitRate => "hr",
        }
    }

    pub fn compute<S: AsRef<str>>(self, target: &TargetSet, rank_list: &[S]) -> f64 {
        match self {
            RankingMetric::Ndcg => ndcg(target, rank_list),
            RankingMetric::Precision => precision(target, rank_list),
            RankingMetric::Recall => recall(target, rank_list),
            RankingMetric::Map => map(target, rank_list),
            RankingMetric::Mrr => mrr(target, rank_list),
            RankingMetric::HitRate => hit_rate(target, rank_list),
        }
    }
}

impl fmt::Display for RankingMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RankingMetric {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ndcg" => Ok(RankingMetric::Ndcg),
            "precision" => Ok(RankingMetric::Precision),
            "recall" => Ok(RankingMetric::Recall),
            "map" | "ap" => Ok(RankingMetric::Map),
            "mrr" | "rr" => Ok(RankingMetric::Mrr),
            "hr" | "hit_rate" => Ok(RankingMetric::HitRate),
            _ => Err(EvalError::UnknownMetric(s.to_owned())),
        }
    }
}
