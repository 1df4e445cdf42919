//! Convenient re-exports for downstream crates.

pub use crate::config::{LoaderConfig, LogLevel};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::metadata::DatasetMetadata;
pub use crate::schema::{DataType, Field, Schema};
pub use crate::types::{Column, ColumnRole, Scalar, Table};
pub use crate::{LATITUDE, LONGITUDE};
