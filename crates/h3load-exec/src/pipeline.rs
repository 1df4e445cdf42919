//! The loading pipeline: one reader, three ordered stage lists, one sink.

use tracing::{debug, info};

use h3load_core::types::Table;
use h3load_core::{LATITUDE, LONGITUDE};
use h3load_io::{OutputSink, Reader};
use h3load_operators::{
    aggregate, AggregationPlan, AggregationStep, Grid, PostprocessingStep, PreprocessingStep,
};

use crate::error::{Phase, PipelineError};
use crate::report::RunReport;

pub struct LoadingPipeline {
    reader: Box<dyn Reader>,
    preprocess: Vec<Box<dyn PreprocessingStep>>,
    aggregate: Vec<Box<dyn AggregationStep>>,
    postprocess: Vec<Box<dyn PostprocessingStep>>,
    output: Box<dyn OutputSink>,
    resolution: Option<u8>,
}

impl LoadingPipeline {
    /// Validate and assemble a pipeline. Performs no I/O.
    pub fn new(
        reader: Box<dyn Reader>,
        preprocess: Vec<Box<dyn PreprocessingStep>>,
        aggregate: Vec<Box<dyn AggregationStep>>,
        postprocess: Vec<Box<dyn PostprocessingStep>>,
        output: Box<dyn OutputSink>,
        resolution: Option<u8>,
    ) -> Result<Self, PipelineError> {
        if let Some(r) = resolution {
            Grid::new(r).map_err(|e| PipelineError::Config(e.to_string()))?;
        }
        if !aggregate.is_empty() {
            let r = resolution.ok_or_else(|| {
                PipelineError::Config(
                    "aggregation steps were given but no grid resolution is set".into(),
                )
            })?;
            AggregationPlan::from_steps(r, Vec::new(), &aggregate)
                .validate()
                .map_err(|e| PipelineError::Config(e.to_string()))?;
        }
        output
            .target()
            .validate()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        Ok(Self {
            reader,
            preprocess,
            aggregate,
            postprocess,
            output,
            resolution,
        })
    }

    pub fn resolution(&self) -> Option<u8> {
        self.resolution
    }

    pub fn dataset_name(&self) -> &str {
        &self.output.target().dataset_name
    }

    /// Read, transform, and store once. The sink is only reached when every
    /// stage succeeded.
    pub fn run(&self) -> Result<RunReport, PipelineError> {
        let mut report = RunReport::start(self.dataset_name(), self.resolution);
        info!(
            dataset = %report.dataset,
            reader = self.reader.name(),
            "starting load"
        );

        let mut table = self.reader.read().map_err(|source| PipelineError::Read {
            reader: self.reader.name(),
            source,
        })?;
        report.rows_read = table.num_rows();
        debug!(rows = table.num_rows(), "input read");

        for step in &self.preprocess {
            table = step.run(table).map_err(|source| PipelineError::Stage {
                phase: Phase::Preprocessing,
                stage: step.name(),
                source,
            })?;
            report.preprocessing_steps += 1;
            debug!(stage = step.name(), rows = table.num_rows(), "preprocessing stage done");
        }

        if let Some(resolution) = self.resolution.filter(|_| !self.aggregate.is_empty()) {
            let plan =
                AggregationPlan::from_steps(resolution, extra_key_columns(&table), &self.aggregate);
            table = aggregate(table, &plan).map_err(|source| PipelineError::Stage {
                phase: Phase::Aggregation,
                stage: "aggregate",
                source,
            })?;
            report.aggregation_steps = self.aggregate.len();
            debug!(
                resolution,
                groups = table.num_rows(),
                reductions = self.aggregate.len(),
                "aggregation done"
            );
        }

        for step in &self.postprocess {
            table = step.run(table).map_err(|source| PipelineError::Stage {
                phase: Phase::Postprocessing,
                stage: step.name(),
                source,
            })?;
            report.postprocessing_steps += 1;
            debug!(stage = step.name(), rows = table.num_rows(), "postprocessing stage done");
        }

        self.output
            .store(&table)
            .map_err(|source| PipelineError::Output {
                dataset: report.dataset.clone(),
                source,
            })?;

        let report = report.finish(table.num_rows());
        info!(
            dataset = %report.dataset,
            rows_read = report.rows_read,
            rows_written = report.rows_written,
            duration_ms = report.duration_ms(),
            "load finished"
        );
        Ok(report)
    }
}

/// Key columns other than the coordinates, in table order.
fn extra_key_columns(table: &Table) -> Vec<String> {
    table
        .key_columns()
        .filter(|c| c.name != LATITUDE && c.name != LONGITUDE)
        .map(|c| c.name.clone())
        .collect()
}
