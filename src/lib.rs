#![forbid(unsafe_code)]
//! h3load: read point data, index it on the H3 grid, aggregate per cell, and
//! store the result as a named dataset with a metadata record.
//!
//! This crate re-exports the workspace members so downstream users and the
//! integration tests can depend on a single package.

pub use h3load_core;
pub use h3load_exec;
pub use h3load_io;
pub use h3load_operators;

pub use h3load_core::prelude::*;
pub use h3load_exec::{
    parse_yaml_pipeline, DslError, LoadingPipeline, Phase, PipelineError, PipelineSpec, RunReport,
};
pub use h3load_io::{
    CsvFileReader, LocalStore, MemoryReader, MemorySink, OutputSink, OutputTarget, Reader,
    StoreDir, WriteMode,
};
pub use h3load_operators::{
    AddConstant, AggregationStep, CountAggregation, MaxAggregation, MeanAggregation,
    MinAggregation, MultiplyValue, PostprocessingStep, PreprocessingStep, Reduction, ScaleBy,
    SumAggregation, CELL_LATITUDE, CELL_LONGITUDE, H3_CELL,
};
