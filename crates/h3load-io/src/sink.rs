//! Output sink contract consumed by the pipeline.
//!
//! The pipeline calls `OutputSink::store` exactly once per successful run.
//! `store` writes the table and, in create mode only, the dataset's metadata
//! record.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use h3load_core::metadata::DatasetMetadata;
use h3load_core::types::Table;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Replace any existing dataset under the same name.
    #[default]
    Create,
    /// Add rows to an existing dataset with an identical schema.
    Append,
}

/// Where and how a run's output lands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputTarget {
    pub dataset_name: String,
    #[serde(default)]
    pub mode: WriteMode,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_dataset_type")]
    pub dataset_type: String,
    /// Overrides the column role tags when deriving the metadata key schema.
    #[serde(default)]
    pub key_columns: Option<Vec<String>>,
}

fn default_dataset_type() -> String {
    "h3".to_string()
}

impl OutputTarget {
    pub fn new(dataset_name: impl Into<String>, mode: WriteMode) -> Self {
        Self {
            dataset_name: dataset_name.into(),
            mode,
            description: String::new(),
            dataset_type: default_dataset_type(),
            key_columns: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_dataset_type(mut self, dataset_type: impl Into<String>) -> Self {
        self.dataset_type = dataset_type.into();
        self
    }

    pub fn with_key_columns(mut self, key_columns: Vec<String>) -> Self {
        self.key_columns = Some(key_columns);
        self
    }

    /// Dataset names become file names, so keep them to a safe alphabet.
    pub fn validate(&self) -> Result<()> {
        let name = &self.dataset_name;
        if name.is_empty() {
            return Err(Error::Config("dataset name must not be empty".into()));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(Error::Config(format!(
                "dataset name '{name}' may only contain ASCII letters, digits, '_' and '-'"
            )));
        }
        Ok(())
    }

    pub fn derive_metadata(&self, table: &Table) -> Result<DatasetMetadata> {
        Ok(DatasetMetadata::derive(
            self.dataset_name.clone(),
            self.description.clone(),
            self.dataset_type.clone(),
            table,
            self.key_columns.as_deref(),
        )?)
    }
}

pub trait OutputSink: Send + Sync {
    fn target(&self) -> &OutputTarget;

    /// Persist `table` under the target dataset name.
    fn write(&self, table: &Table, mode: WriteMode) -> Result<()>;

    /// Create or overwrite the catalog record for a dataset.
    fn write_metadata(&self, record: &DatasetMetadata) -> Result<()>;

    /// Write `table` and, in create mode, its metadata.
    ///
    /// The record is derived before anything is written so a bad key
    /// override fails without touching the store.
    fn store(&self, table: &Table) -> Result<()> {
        let target = self.target();
        let record = match target.mode {
            WriteMode::Create => Some(target.derive_metadata(table)?),
            WriteMode::Append => None,
        };
        self.write(table, target.mode)?;
        if let Some(record) = record {
            self.write_metadata(&record)?;
        }
        Ok(())
    }
}

/// Sink that keeps the dataset in memory; useful for tests and embedding.
#[derive(Debug, Clone)]
pub struct MemorySink {
    target: OutputTarget,
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    table: Option<Table>,
    metadata: Option<DatasetMetadata>,
    writes: usize,
}

impl MemorySink {
    pub fn new(target: OutputTarget) -> Self {
        Self {
            target,
            state: Arc::new(Mutex::new(MemoryState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn table(&self) -> Option<Table> {
        self.lock().table.clone()
    }

    pub fn metadata(&self) -> Option<DatasetMetadata> {
        self.lock().metadata.clone()
    }

    /// Number of `write` calls that reached this sink.
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }
}

impl OutputSink for MemorySink {
    fn target(&self) -> &OutputTarget {
        &self.target
    }

    fn write(&self, table: &Table, mode: WriteMode) -> Result<()> {
        let mut state = self.lock();
        let appended = match (mode, state.table.as_mut()) {
            (WriteMode::Append, Some(existing)) => {
                existing
                    .extend(table.clone())
                    .map_err(|e| Error::Data(format!("append rejected: {e}")))?;
                true
            }
            _ => false,
        };
        if !appended {
            state.table = Some(table.clone());
        }
        state.writes += 1;
        Ok(())
    }

    fn write_metadata(&self, record: &DatasetMetadata) -> Result<()> {
        self.lock().metadata = Some(record.clone());
        Ok(())
    }
}
