//! End-to-end pipeline runs against a local store.

mod test_data_gen;

use h3load::{
    AddConstant, AggregationStep, CsvFileReader, ErrorKind, LoadingPipeline, LocalStore,
    MaxAggregation, MinAggregation, MultiplyValue, OutputTarget, PipelineError,
    PostprocessingStep, PreprocessingStep, Scalar, StoreDir, WriteMode,
};
use tempfile::TempDir;
use test_data_gen::*;

fn reader(dir: &TempDir) -> Box<CsvFileReader> {
    let path = write_csv(dir.path(), "2_cell_agg.csv", TWO_CELL_AGG);
    Box::new(CsvFileReader::new(path, vec!["value1".into(), "value2".into()]))
}

fn output(dir: &TempDir, target: OutputTarget) -> Box<LocalStore> {
    Box::new(LocalStore::new(dir.path(), target).unwrap())
}

fn min_max() -> Vec<Box<dyn AggregationStep>> {
    vec![Box::new(MinAggregation), Box::new(MaxAggregation)]
}

fn add_one() -> Vec<Box<dyn PreprocessingStep>> {
    vec![Box::new(AddConstant::new(1.0))]
}

fn times_two() -> Vec<Box<dyn PostprocessingStep>> {
    vec![Box::new(MultiplyValue::new(2.0))]
}

fn raw_rows(f: impl Fn(i64) -> i64) -> Vec<Vec<Scalar>> {
    [(50.0, 10_i64, 100_i64), (50.1, 0, 0), (50.2, 2, 20)]
        .into_iter()
        .flat_map(|(c, a, b)| [(c, a, b), (-c, a, b)])
        .map(|(c, a, b)| vec![real(c), real(c), int(f(a)), int(f(b))])
        .collect()
}

fn sorted(mut rows: Vec<Vec<Scalar>>) -> Vec<Vec<Scalar>> {
    rows.sort_by(|a, b| a[0].to_string().cmp(&b[0].to_string()));
    rows
}

fn cell_row(cell: &str, values: [i64; 4]) -> Vec<Scalar> {
    let (lat, lng) = centroid(cell);
    let mut row = vec![text(cell)];
    row.extend(values.into_iter().map(int));
    row.push(lat);
    row.push(lng);
    row
}

#[test]
fn test_read_out_only() {
    let dir = TempDir::new().unwrap();
    let pipeline = LoadingPipeline::new(
        reader(&dir),
        vec![],
        vec![],
        vec![],
        output(&dir, OutputTarget::new("read_out_only", WriteMode::Create)),
        Some(1),
    )
    .unwrap();

    let report = pipeline.run().unwrap();
    assert_eq!(report.rows_read, 6);
    assert_eq!(report.rows_written, 6);

    let out = read_dataset(dir.path(), "read_out_only");
    assert_eq!(sorted(out), sorted(raw_rows(|v| v)));
}

#[test]
fn test_read_out_preprocess() {
    let dir = TempDir::new().unwrap();
    let pipeline = LoadingPipeline::new(
        reader(&dir),
        add_one(),
        vec![],
        vec![],
        output(&dir, OutputTarget::new("read_out_only", WriteMode::Create)),
        Some(1),
    )
    .unwrap();
    pipeline.run().unwrap();

    let out = read_dataset(dir.path(), "read_out_only");
    assert_eq!(sorted(out), sorted(raw_rows(|v| v + 1)));
}

#[test]
fn test_read_out_aggregate() {
    let dir = TempDir::new().unwrap();
    let pipeline = LoadingPipeline::new(
        reader(&dir),
        vec![],
        min_max(),
        vec![],
        output(&dir, OutputTarget::new("read_out_only", WriteMode::Create)),
        Some(1),
    )
    .unwrap();
    pipeline.run().unwrap();

    let table = StoreDir::new(dir.path()).read_table("read_out_only").unwrap();
    assert_eq!(
        table.column_names(),
        vec![
            "h3_cell",
            "value1_min",
            "value1_max",
            "value2_min",
            "value2_max",
            "cell_latitude",
            "cell_longitude",
        ]
    );
    assert_eq!(
        table.rows(),
        vec![
            cell_row(CELL1, [0, 10, 0, 100]),
            cell_row(CELL2, [0, 10, 0, 100]),
        ]
    );
}

#[test]
fn test_fail_if_agg_but_no_res() {
    let dir = TempDir::new().unwrap();
    let result = LoadingPipeline::new(
        reader(&dir),
        vec![],
        min_max(),
        vec![],
        output(&dir, OutputTarget::new("read_out_only", WriteMode::Create)),
        None,
    );
    let err = result.err().expect("construction must fail");
    assert!(matches!(err, PipelineError::Config(_)));
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(!StoreDir::new(dir.path()).exists("read_out_only"));
}

#[test]
fn test_read_out_post() {
    let dir = TempDir::new().unwrap();
    let pipeline = LoadingPipeline::new(
        reader(&dir),
        vec![],
        vec![],
        times_two(),
        output(&dir, OutputTarget::new("read_out_only", WriteMode::Create)),
        Some(1),
    )
    .unwrap();
    pipeline.run().unwrap();

    let out = read_dataset(dir.path(), "read_out_only");
    assert_eq!(sorted(out), sorted(raw_rows(|v| v * 2)));
}

#[test]
fn test_full_pipeline() {
    let dir = TempDir::new().unwrap();
    let pipeline = LoadingPipeline::new(
        reader(&dir),
        add_one(),
        min_max(),
        times_two(),
        output(&dir, OutputTarget::new("full_pipeline", WriteMode::Create)),
        Some(1),
    )
    .unwrap();
    let report = pipeline.run().unwrap();
    assert_eq!(report.rows_written, 2);

    let f = |i: i64| (i + 1) * 2;
    assert_eq!(
        read_dataset(dir.path(), "full_pipeline"),
        vec![
            cell_row(CELL1, [f(0), f(10), f(0), f(100)]),
            cell_row(CELL2, [f(0), f(10), f(0), f(100)]),
        ]
    );
}

#[test]
fn test_additional_key_cols() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(dir.path(), "with_company.csv", WITH_COMPANY);
    let reader = CsvFileReader::new(path, vec!["value1".into(), "value2".into()])
        .with_key_columns(vec!["company".into()]);
    let target = OutputTarget::new("read_out_only", WriteMode::Create)
        .with_key_columns(vec!["company".into()]);

    let pipeline = LoadingPipeline::new(
        Box::new(reader),
        vec![],
        min_max(),
        vec![],
        output(&dir, target),
        Some(1),
    )
    .unwrap();
    pipeline.run().unwrap();

    let with_company = |company: &str, cell: &str, values: [i64; 4]| {
        let mut row = vec![text(company)];
        row.extend(cell_row(cell, values));
        row
    };
    assert_eq!(
        read_dataset(dir.path(), "read_out_only"),
        vec![
            with_company("company1", CELL1, [0, 10, 0, 100]),
            with_company("company2", CELL1, [2, 2, 20, 20]),
            with_company("company1", CELL2, [0, 10, 0, 100]),
            with_company("company2", CELL2, [2, 2, 20, 20]),
        ]
    );

    let meta = StoreDir::new(dir.path())
        .read_metadata("read_out_only")
        .unwrap()
        .unwrap();
    assert_eq!(meta.key_schema.pairs(), vec![("company", "text")]);
}

#[test]
fn test_metadata_creation() {
    let dir = TempDir::new().unwrap();
    let target = OutputTarget::new("test_meta_creation", WriteMode::Create)
        .with_description("A Test Dataset")
        .with_dataset_type("point")
        .with_key_columns(vec!["latitude".into(), "longitude".into()]);

    let pipeline = LoadingPipeline::new(
        reader(&dir),
        vec![],
        vec![],
        vec![],
        output(&dir, target),
        Some(1),
    )
    .unwrap();
    pipeline.run().unwrap();

    let meta = StoreDir::new(dir.path())
        .read_metadata("test_meta_creation")
        .unwrap()
        .unwrap();
    assert_eq!(meta.dataset_name, "test_meta_creation");
    assert_eq!(meta.description, "A Test Dataset");
    assert_eq!(
        meta.key_schema.pairs(),
        vec![("latitude", "real"), ("longitude", "real")]
    );
    assert_eq!(
        meta.value_schema.pairs(),
        vec![("value1", "integer"), ("value2", "integer")]
    );
    assert_eq!(meta.dataset_type, "point");
}

#[test]
fn test_append_runs_accumulate_rows() {
    let dir = TempDir::new().unwrap();
    let create = LoadingPipeline::new(
        reader(&dir),
        vec![],
        vec![],
        vec![],
        output(&dir, OutputTarget::new("points", WriteMode::Create)),
        None,
    )
    .unwrap();
    create.run().unwrap();
    let store = StoreDir::new(dir.path());
    let meta_before = store.read_metadata("points").unwrap();

    let append = LoadingPipeline::new(
        reader(&dir),
        vec![],
        vec![],
        vec![],
        output(
            &dir,
            OutputTarget::new("points", WriteMode::Append).with_description("ignored"),
        ),
        None,
    )
    .unwrap();
    append.run().unwrap();

    assert_eq!(read_dataset(dir.path(), "points").len(), 12);
    assert_eq!(store.read_metadata("points").unwrap(), meta_before);
}

#[test]
fn test_append_with_different_schema_fails() {
    let dir = TempDir::new().unwrap();
    LoadingPipeline::new(
        reader(&dir),
        vec![],
        vec![],
        vec![],
        output(&dir, OutputTarget::new("points", WriteMode::Create)),
        None,
    )
    .unwrap()
    .run()
    .unwrap();

    // Aggregated output has a different shape than the raw rows.
    let err = LoadingPipeline::new(
        reader(&dir),
        vec![],
        min_max(),
        vec![],
        output(&dir, OutputTarget::new("points", WriteMode::Append)),
        Some(1),
    )
    .unwrap()
    .run()
    .unwrap_err();

    assert!(matches!(err, PipelineError::Output { .. }));
    assert_eq!(err.kind(), ErrorKind::Data);
    assert_eq!(read_dataset(dir.path(), "points").len(), 6);
}

#[test]
fn test_missing_input_is_a_read_error() {
    let dir = TempDir::new().unwrap();
    let pipeline = LoadingPipeline::new(
        Box::new(CsvFileReader::new(
            dir.path().join("nope.csv").to_string_lossy(),
            vec!["value1".into()],
        )),
        vec![],
        vec![],
        vec![],
        output(&dir, OutputTarget::new("points", WriteMode::Create)),
        None,
    )
    .unwrap();

    let err = pipeline.run().unwrap_err();
    assert!(matches!(err, PipelineError::Read { reader: "csv", .. }));
    assert_eq!(err.kind(), ErrorKind::Store);
    assert!(!StoreDir::new(dir.path()).exists("points"));
}
