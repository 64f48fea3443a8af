use thiserror::Error;

pub type Result<T> = std::result::Result<T, ShellError>;

#[derive(Debug, Error)]
pub enum ShellError {
    /// Malformed command line; the message says what was expected.
    #[error("usage: {0}")]
    Usage(String),

    #[error("no valid model, use `init` or `grid` first")]
    NoModel,

    #[error("no energy series recorded, run `evolve [sweeps] -e` first")]
    NoTrajectory,

    #[error(transparent)]
    Engine(#[from] ising_sim::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<validator::ValidationErrors> for ShellError {
    fn from(e: validator::ValidationErrors) -> Self {
        Self::Engine(e.into())
    }
}
