use numpy::PyReadonlyArray2;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::dataset::DataSet;
use crate::error::EvalError;
use crate::evaluator::evaluate_auc;
use crate::metrics::{self, RankingMetric};
use crate::model::{MatrixModel, RuntimeOptions, ScoreMatrix};
use crate::subset::TargetSet;

impl From<EvalError> for PyErr {
    fn from(err: EvalError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

// ── Pointwise ──────────────────────────────────────────────────────

#[pyfunction]
pub fn rmse(predicted: Vec<f64>, actual: Vec<f64>) -> PyResult<f64> {
    Ok(metrics::rmse(&predicted, &actual)?)
}

#[pyfunction]
pub fn mae(predicted: Vec<f64>, actual: Vec<f64>) -> PyResult<f64> {
    Ok(metrics::mae(&predicted, &actual)?)
}

// ── Ranking ────────────────────────────────────────────────────────

#[pyfunction]
pub fn ndcg(target: Vec<String>, rank_list: Vec<String>) -> f64 {
    metrics::ndcg(&TargetSet::from_ids(&target), &rank_list)
}

#[pyfunction]
pub fn precision(target: Vec<String>, rank_list: Vec<String>) -> f64 {
    metrics::precision(&TargetSet::from_ids(&target), &rank_list)
}

#[pyfunction]
pub fn recall(target: Vec<String>, rank_list: Vec<String>) -> f64 {
    metrics::recall(&TargetSet::from_ids(&target), &rank_list)
}

#[pyfunction]
pub fn map(target: Vec<String>, rank_list: Vec<String>) -> f64 {
    metrics::map(&TargetSet::from_ids(&target), &rank_list)
}

#[pyfunction]
pub fn mrr(target: Vec<String>, rank_list: Vec<String>) -> f64 {
    metrics::mrr(&TargetSet::from_ids(&target), &rank_list)
}

#[pyfunction]
pub fn hit_rate(target: Vec<String>, rank_list: Vec<String>) -> f64 {
    metrics::hit_rate(&TargetSet::from_ids(&target), &rank_list)
}

/// Dispatch by metric name: ndcg, precision, recall, map, mrr or hr.
#[pyfunction]
pub fn ranking_metric(metric: &str, target: Vec<String>, rank_list: Vec<String>) -> PyResult<f64> {
    let metric: RankingMetric = metric.parse()?;
    Ok(metric.compute(&TargetSet::from_ids(&target), &rank_list))
}

// ── AUC on dense matrices ──────────────────────────────────────────

/// AUC of a dense `scores` matrix (n_users × n_items) against a dense held-out
/// matrix of the same shape. Nonzero cells of `test` are positives; the item
/// universe is every item with at least one held-out interaction.
#[pyfunction]
#[pyo3(signature = (scores, test, n_jobs=0, verbose=false))]
pub fn auc_from_scores(
    py: Python<'_>,
    scores: PyReadonlyArray2<f64>,
    test: PyReadonlyArray2<f64>,
    n_jobs: usize,
    verbose: bool,
) -> PyResult<f64> {
    let scores = scores.as_array();
    let test = test.as_array();
    if scores.shape() != test.shape() {
        return Err(PyValueError::new_err(format!(
            "scores shape {:?} does not match test shape {:?}",
            scores.shape(),
            test.shape()
        )));
    }

    let (n_users, n_items) = (scores.nrows(), scores.ncols());
    let mut score_matrix = ScoreMatrix::zeros(n_users, n_items);
    let mut test_matrix = ScoreMatrix::zeros(n_users, n_items);
    for u in 0..n_users {
        for i in 0..n_items {
            score_matrix.set(u, i, scores[[u, i]]);
            test_matrix.set(u, i, test[[u, i]]);
        }
    }

    let model = MatrixModel::from_matrix(score_matrix);
    let test_set = DataSet::from_score_matrix(&test_matrix);
    let options = RuntimeOptions::default().with_n_jobs(n_jobs).with_verbose(verbose);
    Ok(py.detach(|| evaluate_auc(&model, &test_set, Some(&options))))
}
