use h3load_core::error::ErrorKind;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("data error: {0}")]
    Data(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] h3load_core::error::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::Store,
            Error::Csv(e) if e.is_io_error() => ErrorKind::Store,
            Error::Json(e) if e.is_io() => ErrorKind::Store,
            Error::Csv(_) | Error::Json(_) | Error::Data(_) => ErrorKind::Data,
            Error::Config(_) => ErrorKind::Configuration,
            Error::Core(e) => e.kind(),
        }
    }
}
