//! Offline evaluation of recommender models.
//!
//! Pointwise accuracy ([`rmse`], [`mae`]), per-user ranking quality
//! ([`ndcg`], [`precision`], [`recall`], [`map`], [`mrr`], [`hit_rate`]) and a
//! dataset-level [`evaluate_auc`] that queries a [`Predictor`].

pub mod dataset;
pub mod error;
pub mod evaluator;
pub mod indexer;
pub mod metrics;
pub mod model;
pub mod model_selection;
pub mod subset;

#[cfg(feature = "python")]
mod python;

pub use dataset::DataSet;
pub use error::{EvalError, Result};
pub use evaluator::{evaluate_auc, evaluate_auc_excluding, evaluate_rank, evaluate_rating, top_n};
pub use indexer::Indexer;
pub use metrics::{average_precision, hit_rate, mae, map, mrr, ndcg, precision, recall, rmse, RankingMetric};
pub use model::{MatrixModel, Model, ParamValue, Params, Predictor, RuntimeOptions, ScoreMatrix};
pub use model_selection::{leave_one_out, train_test_split};
pub use subset::TargetSet;

#[cfg(feature = "python")]
mod bindings {
    use mimalloc::MiMalloc;
    use pyo3::prelude::*;

    use crate::python;

    #[global_allocator]
    static GLOBAL: MiMalloc = MiMalloc;

    #[pymodule]
    fn _receval(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(python::rmse, m)?)?;
        m.add_function(wrap_pyfunction!(python::mae, m)?)?;
        m.add_function(wrap_pyfunction!(python::ndcg, m)?)?;
        m.add_function(wrap_pyfunction!(python::precision, m)?)?;
        m.add_function(wrap_pyfunction!(python::recall, m)?)?;
        m.add_function(wrap_pyfunction!(python::map, m)?)?;
        m.add_function(wrap_pyfunction!(python::mrr, m)?)?;
        m.add_function(wrap_pyfunction!(python::hit_rate, m)?)?;
        m.add_function(wrap_pyfunction!(python::ranking_metric, m)?)?;
        m.add_function(wrap_pyfunction!(python::auc_from_scores, m)?)?;
        Ok(())
    }
}
