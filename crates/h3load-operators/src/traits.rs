//! Stage traits + the operator error type.
//!
//! The pipeline owns boxed trait objects for each stage kind and calls them
//! strictly in declared order. Implementations must be deterministic and must
//! not keep run-scoped state, so one instance can serve several runs.

use h3load_core::types::Table;
use thiserror::Error;

use crate::aggregate::Reduction;

#[derive(Debug, Error)]
pub enum OpError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("data error: {0}")]
    Data(String),
}

impl From<h3load_core::error::Error> for OpError {
    fn from(e: h3load_core::error::Error) -> Self {
        use h3load_core::error::Error as E;
        match e {
            E::Config(s) => OpError::Config(s),
            E::Data(s) => OpError::Data(s),
        }
    }
}

/// Table -> Table transform applied before aggregation.
pub trait PreprocessingStep: Send + Sync {
    /// Human-readable step name (stable).
    fn name(&self) -> &'static str;

    fn run(&self, input: Table) -> Result<Table, OpError>;
}

/// Declares one reduction for the combined aggregation pass.
pub trait AggregationStep: Send + Sync {
    fn name(&self) -> &'static str;

    fn reduction(&self) -> Reduction;
}

/// Table -> Table transform applied after aggregation.
pub trait PostprocessingStep: Send + Sync {
    fn name(&self) -> &'static str;

    fn run(&self, input: Table) -> Result<Table, OpError>;
}
