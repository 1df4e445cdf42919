#![forbid(unsafe_code)]
//! h3load-exec: drive Reader -> preprocessing -> aggregation ->
//! postprocessing -> OutputSink, once per `run`.
//!
//! Runs are synchronous and single-threaded. Independent pipelines writing
//! different datasets may run concurrently on separate threads.

pub mod dsl;
pub mod error;
pub mod pipeline;
pub mod report;

pub use dsl::{parse_yaml_pipeline, DslError, PipelineSpec};
pub use error::{Phase, PipelineError};
pub use pipeline::LoadingPipeline;
pub use report::RunReport;
