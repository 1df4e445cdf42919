//! Summary of one successful pipeline run.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub dataset: String,

    /// Engine version string for provenance.
    pub engine_version: String,

    pub rows_read: usize,
    pub rows_written: usize,

    pub preprocessing_steps: usize,
    pub aggregation_steps: usize,
    pub postprocessing_steps: usize,

    pub resolution: Option<u8>,

    /// Milliseconds since Unix epoch (UTC).
    pub started_ms: u64,
    pub finished_ms: u64,
}

impl RunReport {
    pub(crate) fn start(dataset: impl Into<String>, resolution: Option<u8>) -> Self {
        Self {
            dataset: dataset.into(),
            engine_version: h3load_core::VERSION.to_string(),
            rows_read: 0,
            rows_written: 0,
            preprocessing_steps: 0,
            aggregation_steps: 0,
            postprocessing_steps: 0,
            resolution,
            started_ms: now_millis(),
            finished_ms: 0,
        }
    }

    pub(crate) fn finish(mut self, rows_written: usize) -> Self {
        self.rows_written = rows_written;
        self.finished_ms = now_millis();
        self
    }

    pub fn duration_ms(&self) -> u64 {
        self.finished_ms.saturating_sub(self.started_ms)
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
