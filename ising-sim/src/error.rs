use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while building a model or collecting samples.
///
/// Sweep-time operations (`delta`, `flip`) never return an error once a model
/// has been constructed, so only construction, input and bookkeeping failures
/// appear here.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("spin value {0} doesn't match any valid state")]
    InvalidSpinValue(f64),

    #[error("the model holds no valid configuration")]
    InvalidModel,

    #[error("recorder {member} observed {found} sweeps, expected {expected}")]
    RecorderLengthMismatch {
        member: usize,
        expected: usize,
        found: usize,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<validator::ValidationErrors> for Error {
    fn from(e: validator::ValidationErrors) -> Self {
        Self::Config(format!("{e}"))
    }
}
