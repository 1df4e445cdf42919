//! Readers that produce the initial `Table` of a run.
//!
//! Every reader emits `latitude` and `longitude` (real, key role) first, then
//! any requested extra key columns, then the requested data columns.

pub mod csv;
pub mod memory;

use h3load_core::types::Table;

use crate::error::Result;

pub trait Reader: Send + Sync {
    /// Human-readable reader name (stable).
    fn name(&self) -> &'static str;

    /// Produce the full input table. Called exactly once per pipeline run.
    fn read(&self) -> Result<Table>;
}
