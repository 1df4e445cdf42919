use thiserror::Error;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Data error: {0}")]
    Data(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) => ErrorKind::Configuration,
            Error::Data(_) => ErrorKind::Data,
        }
    }
}

/// Coarse error classification shared by every crate in the workspace. Core
/// does no I/O, so only the io crate reports `Store`.
///
/// - `Configuration`: raised before any I/O, never retried.
/// - `Data`: bad input or incompatible tables; aborts the run.
/// - `Store`: the underlying store failed; surfaced unmodified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Data,
    Store,
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Data(e.to_string())
    }
}
