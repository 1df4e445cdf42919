//! Lightweight columnar table passed between pipeline stages.
//!
//! A `Table` is owned by whoever holds it: stages take one by value and
//! return a new one, so a caller's copy is never mutated behind its back.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::{DataType, Field, Schema};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Real(f64),
    Integer(i64),
    Text(String),
}

impl Scalar {
    pub fn data_type(&self) -> DataType {
        match self {
            Scalar::Real(_) => DataType::Real,
            Scalar::Integer(_) => DataType::Integer,
            Scalar::Text(_) => DataType::Text,
        }
    }

    /// Numeric view; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Real(v) => Some(*v),
            Scalar::Integer(v) => Some(*v as f64),
            Scalar::Text(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Real(v) => write!(f, "{v}"),
            Scalar::Integer(v) => write!(f, "{v}"),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Real(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Integer(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_string())
    }
}

/// Whether a column identifies a grouping unit or holds a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnRole {
    Key,
    Data,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub role: ColumnRole,
    pub data_type: DataType,
    pub values: Vec<Scalar>,
}

impl Column {
    pub fn new(
        name: impl Into<String>,
        role: ColumnRole,
        data_type: DataType,
        values: Vec<Scalar>,
    ) -> Self {
        Self {
            name: name.into(),
            role,
            data_type,
            values,
        }
    }

    pub fn key(name: impl Into<String>, data_type: DataType, values: Vec<Scalar>) -> Self {
        Self::new(name, ColumnRole::Key, data_type, values)
    }

    pub fn data(name: impl Into<String>, data_type: DataType, values: Vec<Scalar>) -> Self {
        Self::new(name, ColumnRole::Data, data_type, values)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn field(&self) -> Field {
        Field::new(self.name.clone(), self.data_type)
    }

    pub fn is_key(&self) -> bool {
        self.role == ColumnRole::Key
    }
}

/// Ordered set of named, typed columns with a uniform row count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Build a table, checking that names are unique, lengths agree, and
    /// every value matches its column's declared type.
    pub fn try_new(columns: Vec<Column>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(columns.len());
        let expected_rows = columns.first().map(Column::len).unwrap_or(0);

        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(Error::Data(format!("duplicate column '{}'", col.name)));
            }
            if col.len() != expected_rows {
                return Err(Error::Data(format!(
                    "column '{}' has {} rows, expected {}",
                    col.name,
                    col.len(),
                    expected_rows
                )));
            }
            if let Some((row, bad)) = col
                .values
                .iter()
                .enumerate()
                .find(|(_, v)| v.data_type() != col.data_type)
            {
                return Err(Error::Data(format!(
                    "column '{}' is {}, but row {} holds a {} value",
                    col.name,
                    col.data_type,
                    row,
                    bad.data_type()
                )));
            }
        }

        Ok(Self { columns })
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Like `column`, but a missing column is a data error.
    pub fn require(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| Error::Data(format!("column '{name}' not found")))
    }

    pub fn schema(&self) -> Schema {
        Schema::new(self.columns.iter().map(Column::field).collect())
    }

    pub fn key_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.role == ColumnRole::Key)
    }

    pub fn data_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.role == ColumnRole::Data)
    }

    /// Values of row `idx` in column order.
    pub fn row(&self, idx: usize) -> Option<Vec<&Scalar>> {
        if idx >= self.num_rows() {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.values[idx]).collect())
    }

    /// Materialize all rows; convenient for comparisons in tests and writers.
    pub fn rows(&self) -> Vec<Vec<Scalar>> {
        (0..self.num_rows())
            .map(|r| self.columns.iter().map(|c| c.values[r].clone()).collect())
            .collect()
    }

    /// Append the rows of `other`, which must have an identical schema.
    pub fn extend(&mut self, other: Table) -> Result<()> {
        if let Some(diff) = self.schema().diff(&other.schema()) {
            return Err(Error::Data(format!("cannot extend table: {diff}")));
        }
        for (dst, src) in self.columns.iter_mut().zip(other.columns) {
            dst.values.extend(src.values);
        }
        Ok(())
    }
}
