use approx::assert_abs_diff_eq;
use receval::{
    evaluate_auc, evaluate_auc_excluding, evaluate_rank, evaluate_rating, leave_one_out, mae, map,
    mrr, ndcg, precision, recall, rmse, DataSet, MatrixModel, Model, Params, Predictor,
    RankingMetric, RuntimeOptions, ScoreMatrix, TargetSet,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn assert_close(expected: f64, actual: f64, epsilon: f64) {
    assert_abs_diff_eq!(expected, actual, epsilon = epsilon);
}

fn rank_list() -> Vec<String> {
    (0..10).map(|i| i.to_string()).collect()
}

/// Fails loudly if an evaluator reaches past `predict`.
struct PredictOnly(MatrixModel);

impl Predictor for PredictOnly {
    fn predict(&self, user_id: &str, item_id: &str) -> f64 {
        self.0.predict(user_id, item_id)
    }
}

impl Model for PredictOnly {
    fn params(&self) -> Params {
        panic!("PredictOnly::params should never be called");
    }

    fn set_params(&mut self, _params: Params) {
        panic!("PredictOnly::set_params should never be called");
    }

    fn fit(&mut self, _train: &DataSet, _options: &RuntimeOptions) -> receval::Result<()> {
        panic!("PredictOnly::fit should never be called");
    }
}

/// 1.0 0.0 0.0
/// 0.0 0.5 0.0
/// 0.0 0.0 1.0
fn diagonal_model() -> PredictOnly {
    let model = MatrixModel::from_triples(
        &[0, 0, 0, 1, 1, 1, 2, 2, 2],
        &[0, 1, 2, 0, 1, 2, 0, 1, 2],
        &[1.0, 0.0, 0.0, 0.0, 0.5, 0.0, 0.0, 0.0, 1.0],
    )
    .unwrap();
    PredictOnly(model)
}

fn diagonal_test_set() -> DataSet {
    DataSet::new(&["0", "1", "2"], &["0", "1", "2"], &[1.0, 0.5, 1.0]).unwrap()
}

#[test]
fn rmse_reference() {
    assert_close(1.63299, rmse(&[0.0, 0.0, 0.0], &[-2.0, 0.0, 2.0]).unwrap(), 1e-5);
}

#[test]
fn mae_reference() {
    assert_close(1.33333, mae(&[0.0, 0.0, 0.0], &[-2.0, 0.0, 2.0]).unwrap(), 1e-5);
}

#[test]
fn ndcg_reference() {
    let target = TargetSet::from_ids(&["1", "3", "5", "7"]);
    assert_close(0.6766372989, ndcg(&target, &rank_list()), 1e-5);
}

#[test]
fn precision_reference() {
    let target = TargetSet::from_ids(&["1", "3", "5", "7"]);
    assert_close(0.4, precision(&target, &rank_list()), 1e-5);
}

#[test]
fn recall_reference() {
    let target = TargetSet::from_ids(&["1", "3", "15", "17", "19"]);
    assert_close(0.4, recall(&target, &rank_list()), 1e-5);
}

#[test]
fn map_reference() {
    let target = TargetSet::from_ids(&["1", "3", "7", "9"]);
    assert_close(0.44375, map(&target, &rank_list()), 1e-5);
}

#[test]
fn mrr_reference() {
    let target = TargetSet::from_ids(&["3"]);
    assert_close(0.25, mrr(&target, &rank_list()), 1e-5);
}

#[test]
fn auc_perfect_separation() {
    init_tracing();
    let model = diagonal_model();
    let test = diagonal_test_set();
    assert_eq!(evaluate_auc(&model, &test, None), 1.0);

    let options = RuntimeOptions::default().with_n_jobs(2).with_verbose(true);
    assert_eq!(evaluate_auc(&model, &test, Some(&options)), 1.0);
}

#[test]
fn auc_reversed_scores() {
    let model = MatrixModel::from_triples(
        &[0, 0, 1, 1],
        &[0, 1, 0, 1],
        &[0.0, 1.0, 1.0, 0.0],
    )
    .unwrap();
    let test = DataSet::new(&["0", "1"], &["0", "1"], &[1.0, 1.0]).unwrap();
    assert_eq!(evaluate_auc(&model, &test, None), 0.0);
}

#[test]
fn auc_excluding_training_items() {
    // user 0 holds out item 0, but item 1 (scored higher) was seen in training
    let model = MatrixModel::from_triples(&[0, 0, 0], &[0, 1, 2], &[0.5, 0.9, 0.1]).unwrap();
    let test = DataSet::new(&["0", "1", "1"], &["0", "1", "2"], &[1.0, 1.0, 1.0]).unwrap();
    let train = DataSet::new(&["0"], &["1"], &[1.0]).unwrap();

    // user 1 is unknown to the model, so every candidate ties at 0.5
    let plain = evaluate_auc(&model, &test, None);
    let excluding = evaluate_auc_excluding(&model, &test, &train, None);
    assert_close(0.5, plain, 1e-12);
    assert_close(0.75, excluding, 1e-12);
}

#[test]
fn rank_and_rating_on_a_split() {
    init_tracing();
    let users = ["a", "a", "a", "b", "b", "b"];
    let items = ["x", "y", "z", "x", "y", "z"];
    let data = DataSet::new(&users, &items, &[5.0, 3.0, 1.0, 2.0, 4.0, 1.0]).unwrap();
    let (train, test) = leave_one_out(&data, 3);
    assert_eq!(test.len(), 2);

    // An oracle that memorised everything scores perfectly on held-out ratings.
    let mut oracle = MatrixModel::default();
    oracle.fit(&data, &RuntimeOptions::default()).unwrap();
    let [rmse, mae] = evaluate_rating(&oracle, &test).unwrap();
    assert_eq!(rmse, 0.0);
    assert_eq!(mae, 0.0);

    // With training items excluded, the held-out item is the only candidate left.
    let scores = evaluate_rank(&oracle, &test, Some(&train), 1, &RankingMetric::ALL, None);
    for score in scores {
        assert_close(1.0, score, 1e-12);
    }
}

#[test]
fn auc_on_dense_matrices() {
    // held-out:        scores:
    // 1 0 0            0.9 0.1 0.5
    // 0 0 3            0.2 0.8 0.4
    let test = ScoreMatrix::from_triples(&[0, 1], &[0, 2], &[1.0, 3.0]).unwrap();
    let scores = ScoreMatrix::from_triples(
        &[0, 0, 0, 1, 1, 1],
        &[0, 1, 2, 0, 1, 2],
        &[0.9, 0.1, 0.5, 0.2, 0.8, 0.4],
    )
    .unwrap();
    let test_set = DataSet::from_score_matrix(&test);
    // item 1 has no held-out interaction, so only items 0 and 2 are candidates
    assert_eq!(test_set.item_count(), 2);

    let model = MatrixModel::from_matrix(scores);
    let options = RuntimeOptions::default().with_n_jobs(1);
    assert_eq!(evaluate_auc(&model, &test_set, Some(&options)), 1.0);
}
