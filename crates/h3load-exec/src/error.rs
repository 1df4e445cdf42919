use std::fmt;

use thiserror::Error;

use h3load_core::error::ErrorKind;
use h3load_io::Error as IoError;
use h3load_operators::OpError;

/// Stage list a failing step belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Preprocessing,
    Aggregation,
    Postprocessing,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Preprocessing => "preprocessing",
            Phase::Aggregation => "aggregation",
            Phase::Postprocessing => "postprocessing",
        })
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid pipeline configuration: {0}")]
    Config(String),

    #[error("reader '{reader}' failed: {source}")]
    Read {
        reader: &'static str,
        #[source]
        source: IoError,
    },

    #[error("{phase} stage '{stage}' failed: {source}")]
    Stage {
        phase: Phase,
        stage: &'static str,
        #[source]
        source: OpError,
    },

    #[error("writing dataset '{dataset}' failed: {source}")]
    Output {
        dataset: String,
        #[source]
        source: IoError,
    },
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Config(_) => ErrorKind::Configuration,
            PipelineError::Read { source, .. } | PipelineError::Output { source, .. } => {
                source.kind()
            }
            PipelineError::Stage { source, .. } => match source {
                OpError::Config(_) => ErrorKind::Configuration,
                OpError::Data(_) => ErrorKind::Data,
            },
        }
    }
}
