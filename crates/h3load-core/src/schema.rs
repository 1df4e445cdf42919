//! Logical schema types. Pure data.
//!
//! The type set is deliberately closed: every store and every reader in the
//! workspace speaks exactly these three types.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Real,
    Integer,
    Text,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Real => "real",
            DataType::Integer => "integer",
            DataType::Text => "text",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Real | DataType::Integer)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// `(name, type)` pairs in declared order.
    pub fn pairs(&self) -> Vec<(&str, &'static str)> {
        self.fields
            .iter()
            .map(|f| (f.name.as_str(), f.data_type.as_str()))
            .collect()
    }

    /// Describe the first difference against `other`, if any.
    ///
    /// Used to validate appends against a stored schema.
    pub fn diff(&self, other: &Schema) -> Option<String> {
        if self.fields.len() != other.fields.len() {
            return Some(format!(
                "expected {} columns, found {}",
                self.fields.len(),
                other.fields.len()
            ));
        }
        for (i, (a, b)) in self.fields.iter().zip(&other.fields).enumerate() {
            if a.name != b.name {
                return Some(format!(
                    "column {i}: expected '{}', found '{}'",
                    a.name, b.name
                ));
            }
            if a.data_type != b.data_type {
                return Some(format!(
                    "column '{}': expected type {}, found {}",
                    a.name, a.data_type, b.data_type
                ));
            }
        }
        None
    }
}
