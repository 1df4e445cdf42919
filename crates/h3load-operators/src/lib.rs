#![forbid(unsafe_code)]
//! h3load-operators: the stages a loading pipeline threads a table through.
//!
//! Design intent:
//! - Pure and synchronous: no I/O, no shared state between invocations.
//! - Each stage takes a `Table` by value and returns a new one.
//! - Aggregation steps only *declare* a reduction; the combined pass in
//!   `aggregate` does the grouping once for all of them.

pub mod aggregate;
pub mod grid;
pub mod postprocess;
pub mod preprocess;
pub mod traits;

mod arith;

pub use aggregate::{
    aggregate, AggregationPlan, CountAggregation, MaxAggregation, MeanAggregation,
    MinAggregation, Reduction, SumAggregation, CELL_LATITUDE, CELL_LONGITUDE, H3_CELL,
};
pub use grid::Grid;
pub use postprocess::MultiplyValue;
pub use preprocess::{AddConstant, ScaleBy};
pub use traits::{AggregationStep, OpError, PostprocessingStep, PreprocessingStep};
