//! Reader over a prepared in-memory table.

use h3load_core::types::Table;

use crate::error::Result;
use crate::readers::Reader;

#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    table: Table,
}

impl MemoryReader {
    pub fn new(table: Table) -> Self {
        Self { table }
    }
}

impl Reader for MemoryReader {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn read(&self) -> Result<Table> {
        Ok(self.table.clone())
    }
}
