use std::sync::{Arc, OnceLock};

use ahash::AHashMap;
use faer::Mat;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::dataset::DataSet;
use crate::error::{check_len, Result};
use crate::indexer::Indexer;

// ── Capabilities ───────────────────────────────────────────────────

/// Anything that can score a (user, item) pair.
///
/// Implementations return `0.0` for identifiers they cannot resolve instead of
/// failing, so evaluation can run over partial or noisy inputs.
pub trait Predictor {
    fn predict(&self, user_id: &str, item_id: &str) -> f64;
}

/// A trainable model. Evaluators only ever need the `Predictor` half.
pub trait Model: Predictor {
    fn params(&self) -> Params;
    fn set_params(&mut self, params: Params);
    fn fit(&mut self, train: &DataSet, options: &RuntimeOptions) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Bool(bool),
}

pub type Params = AHashMap<String, ParamValue>;

/// Options shared by fitting and evaluation.
///
/// With `n_jobs > 0` the worker pool is built on first use and then shared by
/// every run with these options, clones included.
#[derive(Debug, Clone, Default)]
pub struct RuntimeOptions {
    /// Report progress at `info` level instead of `debug`.
    pub verbose: bool,
    n_jobs: usize,
    pool: Arc<OnceLock<Option<ThreadPool>>>,
}

impl RuntimeOptions {
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Worker threads for per-user work. 0 uses the global rayon pool.
    pub fn with_n_jobs(mut self, n_jobs: usize) -> Self {
        self.n_jobs = n_jobs;
        self.pool = Arc::default();
        self
    }

    pub fn n_jobs(&self) -> usize {
        self.n_jobs
    }

    /// The dedicated pool, or `None` for the global one. A pool that fails to
    /// build is reported once and the global pool is used from then on.
    pub(crate) fn thread_pool(&self) -> Option<&ThreadPool> {
        if self.n_jobs == 0 {
            return None;
        }
        self.pool
            .get_or_init(|| match ThreadPoolBuilder::new().num_threads(self.n_jobs).build() {
                Ok(pool) => Some(pool),
                Err(err) => {
                    tracing::warn!(%err, n_jobs = self.n_jobs, "falling back to the global thread pool");
                    None
                }
            })
            .as_ref()
    }
}

// ── Dense score matrix ─────────────────────────────────────────────

/// Dense (user index × item index) score lookup. Out-of-range cells read as 0.
#[derive(Debug, Clone)]
pub struct ScoreMatrix {
    mat: Mat<f64>,
}

impl ScoreMatrix {
    pub fn zeros(n_users: usize, n_items: usize) -> Self {
        Self { mat: Mat::zeros(n_users, n_items) }
    }

    /// Size the matrix to the largest indices seen and fill it from COO triples.
    pub fn from_triples(users: &[usize], items: &[usize], ratings: &[f64]) -> Result<Self> {
        check_len(users.len(), items.len())?;
        check_len(users.len(), ratings.len())?;
        let n_users = users.iter().max().map_or(0, |&u| u + 1);
        let n_items = items.iter().max().map_or(0, |&i| i + 1);
        let mut matrix = Self::zeros(n_users, n_items);
        for ((&u, &i), &r) in users.iter().zip(items).zip(ratings) {
            matrix.mat[(u, i)] = r;
        }
        Ok(matrix)
    }

    pub fn get(&self, user: usize, item: usize) -> f64 {
        if user < self.mat.nrows() && item < self.mat.ncols() {
            self.mat[(user, item)]
        } else {
            0.0
        }
    }

    /// Writes outside the matrix are ignored.
    pub fn set(&mut self, user: usize, item: usize, value: f64) {
        if user < self.mat.nrows() && item < self.mat.ncols() {
            self.mat[(user, item)] = value;
        }
    }

    pub fn n_users(&self) -> usize {
        self.mat.nrows()
    }

    pub fn n_items(&self) -> usize {
        self.mat.ncols()
    }
}

// ── Matrix-backed model ────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Resolver {
    /// Identifiers are decimal indices into the matrix.
    Numeric,
    /// Identifiers go through the indexers of the data set the model was fitted on.
    Indexed { users: Indexer, items: Indexer },
}

/// Predicts by looking scores up in a `ScoreMatrix`.
///
/// Built directly from numeric triples it serves as a fixed oracle; `fit`
/// memorises the ratings of a training set.
#[derive(Debug, Clone)]
pub struct MatrixModel {
    matrix: ScoreMatrix,
    resolver: Resolver,
}

impl Default for MatrixModel {
    fn default() -> Self {
        Self {
            matrix: ScoreMatrix::zeros(0, 0),
            resolver: Resolver::Numeric,
        }
    }
}

impl MatrixModel {
    pub fn from_matrix(matrix: ScoreMatrix) -> Self {
        Self { matrix, resolver: Resolver::Numeric }
    }

    pub fn from_triples(users: &[usize], items: &[usize], ratings: &[f64]) -> Result<Self> {
        ScoreMatrix::from_triples(users, items, ratings).map(Self::from_matrix)
    }

    pub fn matrix(&self) -> &ScoreMatrix {
        &self.matrix
    }

    fn resolve(&self, user_id: &str, item_id: &str) -> Option<(usize, usize)> {
        match &self.resolver {
            Resolver::Numeric => Some((user_id.parse().ok()?, item_id.parse().ok()?)),
            Resolver::Indexed { users, items } => {
                Some((users.to_index(user_id)?, items.to_index(item_id)?))
            }
        }
    }
}

impl Predictor for MatrixModel {
    fn predict(&self, user_id: &str, item_id: &str) -> f64 {
        match self.resolve(user_id, item_id) {
            Some((u, i)) => self.matrix.get(u, i),
            None => 0.0,
        }
    }
}

impl Model for MatrixModel {
    fn params(&self) -> Params {
        Params::new()
    }

    fn set_params(&mut self, _params: Params) {}

    fn fit(&mut self, train: &DataSet, options: &RuntimeOptions) -> Result<()> {
        let users = train.user_indexer().clone();
        let items = train.item_indexer().clone();
        let mut matrix = ScoreMatrix::zeros(users.len(), items.len());
        for (user, item, rating) in train.iter() {
            if let (Some(u), Some(i)) = (users.to_index(user), items.to_index(item)) {
                matrix.set(u, i, rating);
            }
        }
        if options.verbose {
            tracing::info!(
                n_users = users.len(),
                n_items = items.len(),
                n_ratings = train.len(),
                "fitted matrix model"
            );
        }
        self.matrix = matrix;
        self.resolver = Resolver::Indexed { users, items };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_pool_is_built_once_and_shared() {
        assert!(RuntimeOptions::default().thread_pool().is_none());

        let options = RuntimeOptions::default().with_n_jobs(2);
        let copy = options.clone();
        let pool = options.thread_pool().unwrap();
        assert_eq!(pool.current_num_threads(), 2);
        assert!(std::ptr::eq(pool, copy.thread_pool().unwrap()));

        let resized = copy.with_n_jobs(3);
        let other = resized.thread_pool().unwrap();
        assert_eq!(other.current_num_threads(), 3);
        assert!(!std::ptr::eq(pool, other));
    }

    #[test]
    fn out_of_range_reads_zero() {
        let m = ScoreMatrix::from_triples(&[0, 1], &[1, 2], &[3.0, 4.0]).unwrap();
        assert_eq!(m.n_users(), 2);
        assert_eq!(m.n_items(), 3);
        assert_eq!(m.get(1, 2), 4.0);
        assert_eq!(m.get(5, 0), 0.0);
        assert_eq!(m.get(0, 7), 0.0);
    }

    #[test]
    fn numeric_model_tolerates_bad_ids() {
        let model = MatrixModel::from_triples(&[0, 2], &[0, 1], &[1.5, 2.5]).unwrap();
        assert_eq!(model.predict("2", "1"), 2.5);
        assert_eq!(model.predict("x", "1"), 0.0);
        assert_eq!(model.predict("-1", "0"), 0.0);
        assert_eq!(model.predict("9", "9"), 0.0);
    }

    #[test]
    fn fit_memorises_training_ratings() {
        let train = DataSet::new(&["alice", "bob"], &["tea", "coffee"], &[4.0, 2.0]).unwrap();
        let mut model = MatrixModel::default();
        model.fit(&train, &RuntimeOptions::default()).unwrap();
        assert_eq!(model.predict("alice", "tea"), 4.0);
        assert_eq!(model.predict("alice", "coffee"), 0.0);
        assert_eq!(model.predict("carol", "tea"), 0.0);
        assert!(model.params().is_empty());
    }
}
