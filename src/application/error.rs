// Service error taxonomy
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("unknown machine: {0}")]
    UnknownMachine(String),

    #[error("unknown session: {0}")]
    UnknownSession(String),

    #[error(transparent)]
    Catalog(#[from] anyhow::Error),
}
