//! Preprocessing steps: reshape the raw table before it is binned.

use serde::{Deserialize, Serialize};

use h3load_core::types::Table;

use crate::arith::{apply_to_data_columns, ArithOp};
use crate::traits::{OpError, PreprocessingStep};

/// Add `value` to every data column (or to `columns` only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddConstant {
    pub value: f64,
    #[serde(default)]
    pub columns: Option<Vec<String>>,
}

impl AddConstant {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            columns: None,
        }
    }

    pub fn on_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = Some(columns);
        self
    }
}

impl PreprocessingStep for AddConstant {
    fn name(&self) -> &'static str {
        "add_constant"
    }

    fn run(&self, input: Table) -> Result<Table, OpError> {
        apply_to_data_columns(input, self.columns.as_deref(), ArithOp::Add(self.value))
    }
}

/// Multiply every data column (or `columns` only) by `factor`, e.g. for unit
/// conversion before values are reduced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleBy {
    pub factor: f64,
    #[serde(default)]
    pub columns: Option<Vec<String>>,
}

impl ScaleBy {
    pub fn new(factor: f64) -> Self {
        Self {
            factor,
            columns: None,
        }
    }

    pub fn on_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = Some(columns);
        self
    }
}

impl PreprocessingStep for ScaleBy {
    fn name(&self) -> &'static str {
        "scale_by"
    }

    fn run(&self, input: Table) -> Result<Table, OpError> {
        apply_to_data_columns(input, self.columns.as_deref(), ArithOp::Mul(self.factor))
    }
}
