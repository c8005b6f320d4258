use thiserror::Error;

pub type Result<T> = std::result::Result<T, EvalError>;

#[derive(Debug, Error)]
pub enum EvalError {
    /// Two index-aligned inputs have different lengths.
    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unknown metric: '{0}'. Must be one of: ndcg, precision, recall, map, mrr, hr")]
    UnknownMetric(String),
}

/// Fail with `LengthMismatch` unless both lengths agree.
pub(crate) fn check_len(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(EvalError::LengthMismatch { expected, actual });
    }
    Ok(())
}
