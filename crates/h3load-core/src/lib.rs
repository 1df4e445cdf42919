#![forbid(unsafe_code)]
//! h3load-core: tables, schemas, dataset metadata, and loader configuration.
//!
//! Everything here is pure data. Grid indexing lives in `h3load-operators`,
//! file access in `h3load-io`, orchestration in `h3load-exec`.

pub mod config;
pub mod error;
pub mod metadata;
pub mod prelude;
pub mod schema;
pub mod types;

/// Name of the latitude coordinate column produced by every reader.
pub const LATITUDE: &str = "latitude";

/// Name of the longitude coordinate column produced by every reader.
pub const LONGITUDE: &str = "longitude";

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
