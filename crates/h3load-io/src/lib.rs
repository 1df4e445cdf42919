#![forbid(unsafe_code)]
//! h3load-io: everything that touches the file system.
//!
//! - `readers`: produce the initial `Table` of a run (CSV, in-memory).
//! - `sink`: the `OutputSink` contract the pipeline hands its final table to.
//! - `store`: a durable local store, one set of files per dataset plus a
//!   metadata catalog.

pub mod error;
pub mod readers;
pub mod sink;
pub mod store;

pub use error::{Error, Result};
pub use readers::{csv::CsvFileReader, memory::MemoryReader, Reader};
pub use sink::{MemorySink, OutputSink, OutputTarget, WriteMode};
pub use store::{LocalStore, StoreDir};
