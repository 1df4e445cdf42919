//! YAML description of a loading pipeline.
//!
//! Example:
//! ```yaml
//! reader: { format: csv, file_path: data/points.csv, data_columns: [value1], key_columns: [company] }
//! preprocess:  [ { op: add_constant, value: 1 } ]
//! aggregate:   [ { op: min }, { op: max } ]
//! postprocess: [ { op: multiply_value, multiply_by: 2 } ]
//! output: { dataset_name: points, mode: create, description: "daily points" }
//! resolution: 1
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use h3load_core::config::LoaderConfig;
use h3load_io::{CsvFileReader, LocalStore, OutputTarget, Reader};
use h3load_operators::{
    AddConstant, AggregationStep, CountAggregation, MaxAggregation, MeanAggregation,
    MinAggregation, MultiplyValue, PostprocessingStep, PreprocessingStep, Reduction, ScaleBy,
    SumAggregation,
};

use crate::error::PipelineError;
use crate::pipeline::LoadingPipeline;

#[derive(Debug, Error)]
pub enum DslError {
    #[error("invalid pipeline description: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid pipeline description: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSpec {
    pub reader: ReaderSpec,
    #[serde(default)]
    pub preprocess: Vec<PreprocessSpec>,
    #[serde(default)]
    pub aggregate: Vec<AggregateSpec>,
    #[serde(default)]
    pub postprocess: Vec<PostprocessSpec>,
    pub output: OutputSpec,
    #[serde(default)]
    pub resolution: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "format")]
pub enum ReaderSpec {
    Csv(CsvFileReader),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum PreprocessSpec {
    AddConstant(AddConstant),
    ScaleBy(ScaleBy),
}

/// Written as `{ op: min }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSpec {
    pub op: Reduction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum PostprocessSpec {
    MultiplyValue(MultiplyValue),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSpec {
    /// Falls back to `LoaderConfig::database_dir` when absent.
    #[serde(default)]
    pub database_dir: Option<String>,
    #[serde(flatten)]
    pub target: OutputTarget,
}

/// Parse a pipeline description. Nothing is opened or validated beyond the
/// document's shape.
pub fn parse_yaml_pipeline(yaml_src: &str) -> Result<PipelineSpec, DslError> {
    let spec: PipelineSpec = serde_yaml::from_str(yaml_src)?;
    if spec.reader.data_columns().is_empty() {
        return Err(DslError::Invalid(
            "reader.data_columns must name at least one column".into(),
        ));
    }
    Ok(spec)
}

impl ReaderSpec {
    fn data_columns(&self) -> &[String] {
        match self {
            ReaderSpec::Csv(r) => &r.data_columns,
        }
    }

    fn build(&self) -> Box<dyn Reader> {
        match self {
            ReaderSpec::Csv(r) => Box::new(r.clone()),
        }
    }
}

impl PreprocessSpec {
    fn build(&self) -> Box<dyn PreprocessingStep> {
        match self {
            PreprocessSpec::AddConstant(s) => Box::new(s.clone()),
            PreprocessSpec::ScaleBy(s) => Box::new(s.clone()),
        }
    }
}

impl PostprocessSpec {
    fn build(&self) -> Box<dyn PostprocessingStep> {
        match self {
            PostprocessSpec::MultiplyValue(s) => Box::new(s.clone()),
        }
    }
}

fn aggregation_step(spec: &AggregateSpec) -> Box<dyn AggregationStep> {
    match spec.op {
        Reduction::Min => Box::new(MinAggregation),
        Reduction::Max => Box::new(MaxAggregation),
        Reduction::Sum => Box::new(SumAggregation),
        Reduction::Mean => Box::new(MeanAggregation),
        Reduction::Count => Box::new(CountAggregation),
    }
}

impl PipelineSpec {
    /// Resolution after falling back to the loader default.
    pub fn effective_resolution(&self, cfg: &LoaderConfig) -> Option<u8> {
        self.resolution.or(cfg.default_resolution)
    }

    pub fn database_dir<'a>(&'a self, cfg: &'a LoaderConfig) -> &'a str {
        self.output
            .database_dir
            .as_deref()
            .unwrap_or(&cfg.database_dir)
    }

    /// Assemble the pipeline, writing into a `LocalStore`.
    pub fn build(&self, cfg: &LoaderConfig) -> Result<LoadingPipeline, PipelineError> {
        let store = LocalStore::new(self.database_dir(cfg), self.output.target.clone())
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        LoadingPipeline::new(
            self.reader.build(),
            self.preprocess.iter().map(PreprocessSpec::build).collect(),
            self.aggregate.iter().map(aggregation_step).collect(),
            self.postprocess.iter().map(PostprocessSpec::build).collect(),
            Box::new(store),
            self.effective_resolution(cfg),
        )
    }
}
