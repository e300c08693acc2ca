use thiserror::Error;

/// Failures raised while resolving a property expression.
///
/// A strategy that simply does not recognize a token is not an error: it
/// answers `Ok(None)` and the chain moves on.
#[derive(Debug, Error)]
pub enum EvalError {
    /// A strategy was used before it was fully configured.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A user-facing failure, e.g. a required property that is not set.
    #[error("{0}")]
    Failure(String),

    #[error("substring {start}..{end} out of range for property `{name}` (length {len})")]
    IndexOutOfRange {
        name: String,
        start: usize,
        end: usize,
        len: usize,
    },

    /// Cycle guard push/pop imbalance; signals broken chain composition.
    #[error("internal consistency error: {0}")]
    InternalConsistency(String),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("invalid settings: {0}")]
    InvalidSettings(#[from] serde_json::Error),
}

impl EvalError {
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        EvalError::Configuration(message.into())
    }

    pub fn failure<S: Into<String>>(message: S) -> Self {
        EvalError::Failure(message.into())
    }
}

pub type Result<T> = std::result::Result<T, EvalError>;
