//! Dataset metadata records kept in the store's catalog.
//!
//! A record is derived from the final table of a run and is always written
//! whole; there is no partial update path.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::types::Table;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub dataset_name: String,
    pub description: String,
    pub key_schema: Schema,
    pub value_schema: Schema,
    pub dataset_type: String,
}

impl DatasetMetadata {
    /// Derive key/value schemas from `table`.
    ///
    /// Without `key_override` the column role tags decide which side a column
    /// lands on. With it, exactly the named columns are keys and every other
    /// column is a value; each named column must exist. Both schemas keep
    /// table order.
    pub fn derive(
        dataset_name: impl Into<String>,
        description: impl Into<String>,
        dataset_type: impl Into<String>,
        table: &Table,
        key_override: Option<&[String]>,
    ) -> Result<Self> {
        if let Some(keys) = key_override {
            for k in keys {
                table.require(k).map_err(|_| {
                    Error::Data(format!("declared key column '{k}' is not in the table"))
                })?;
            }
        }

        let mut key_schema = Schema::default();
        let mut value_schema = Schema::default();
        for col in table.columns() {
            let is_key = match key_override {
                Some(keys) => keys.iter().any(|k| *k == col.name),
                None => col.is_key(),
            };
            if is_key {
                key_schema.fields.push(col.field());
            } else {
                value_schema.fields.push(col.field());
            }
        }

        Ok(Self {
            dataset_name: dataset_name.into(),
            description: description.into(),
            key_schema,
            value_schema,
            dataset_type: dataset_type.into(),
        })
    }
}
