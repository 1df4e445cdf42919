//! Postprocessing steps: rescale aggregated values before they are stored.

use serde::{Deserialize, Serialize};

use h3load_core::types::Table;

use crate::arith::{apply_to_data_columns, ArithOp};
use crate::traits::{OpError, PostprocessingStep};

/// Multiply data columns by a constant. Key columns, including the cell id
/// and centroid columns, are left as they are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiplyValue {
    pub multiply_by: f64,
    #[serde(default)]
    pub columns: Option<Vec<String>>,
}

impl MultiplyValue {
    pub fn new(multiply_by: f64) -> Self {
        Self {
            multiply_by,
            columns: None,
        }
    }
}

impl PostprocessingStep for MultiplyValue {
    fn name(&self) -> &'static str {
        "multiply_value"
    }

    fn run(&self, input: Table) -> Result<Table, OpError> {
        apply_to_data_columns(
            input,
            self.columns.as_deref(),
            ArithOp::Mul(self.multiply_by),
        )
    }
}
