//! Durable local dataset store.
//!
//! Layout under the database directory:
//!
//! ```text
//! <dir>/<dataset>.schema.json             stored columns (name, role, type)
//! <dir>/<dataset>.jsonl                   rows, see `jsonl`
//! <dir>/dataset_metadata/<dataset>.json   catalog record
//! ```
//!
//! Each dataset and each catalog record is its own file, so runs writing
//! different datasets never contend. Create-mode writes stage temp files and
//! rename them into place; appends encode every row before opening the file.
//! Every file handle is scoped to a single call.

pub mod jsonl;

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use h3load_core::metadata::DatasetMetadata;
use h3load_core::schema::{DataType, Field, Schema};
use h3load_core::types::{Column, ColumnRole, Table};

use crate::error::{Error, Result};
use crate::sink::{OutputSink, OutputTarget, WriteMode};

use self::jsonl::{read_columns, JsonlWriter};

/// Directory of the metadata catalog, relative to the database directory.
pub const CATALOG_DIR: &str = "dataset_metadata";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StoredColumn {
    name: String,
    role: ColumnRole,
    data_type: DataType,
}

/// Read side of the store plus path helpers shared with `LocalStore`.
#[derive(Debug, Clone)]
pub struct StoreDir {
    root: PathBuf,
}

impl StoreDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_path(&self, dataset: &str) -> PathBuf {
        self.root.join(format!("{dataset}.jsonl"))
    }

    pub fn schema_path(&self, dataset: &str) -> PathBuf {
        self.root.join(format!("{dataset}.schema.json"))
    }

    pub fn metadata_path(&self, dataset: &str) -> PathBuf {
        self.root.join(CATALOG_DIR).join(format!("{dataset}.json"))
    }

    pub fn exists(&self, dataset: &str) -> bool {
        self.schema_path(dataset).is_file()
    }

    fn stored_columns(&self, dataset: &str) -> Result<Vec<StoredColumn>> {
        let file = File::open(self.schema_path(dataset))?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Schema the dataset was created with.
    pub fn stored_schema(&self, dataset: &str) -> Result<Schema> {
        Ok(Schema::new(
            self.stored_columns(dataset)?
                .into_iter()
                .map(|c| Field::new(c.name, c.data_type))
                .collect(),
        ))
    }

    /// Load a whole dataset back into a table.
    pub fn read_table(&self, dataset: &str) -> Result<Table> {
        let stored = self.stored_columns(dataset)?;
        let schema = Schema::new(
            stored
                .iter()
                .map(|c| Field::new(c.name.clone(), c.data_type))
                .collect(),
        );
        let file = File::open(self.data_path(dataset))?;
        let values = read_columns(BufReader::new(file), &schema)?;
        let columns = stored
            .into_iter()
            .zip(values)
            .map(|(c, v)| Column::new(c.name, c.role, c.data_type, v))
            .collect();
        Ok(Table::try_new(columns)?)
    }

    /// Catalog record for `dataset`, if one was written.
    pub fn read_metadata(&self, dataset: &str) -> Result<Option<DatasetMetadata>> {
        let path = self.metadata_path(dataset);
        if !path.is_file() {
            return Ok(None);
        }
        let file = File::open(path)?;
        Ok(Some(serde_json::from_reader(BufReader::new(file))?))
    }

    /// Names of all datasets with a catalog record, sorted.
    pub fn list_datasets(&self) -> Result<Vec<String>> {
        let dir = self.root.join(CATALOG_DIR);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

/// `OutputSink` backed by a `StoreDir`.
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: StoreDir,
    target: OutputTarget,
}

impl LocalStore {
    /// Validates the target; touches no files.
    pub fn new(database_dir: impl Into<PathBuf>, target: OutputTarget) -> Result<Self> {
        target.validate()?;
        Ok(Self {
            dir: StoreDir::new(database_dir),
            target,
        })
    }

    pub fn dir(&self) -> &StoreDir {
        &self.dir
    }

    fn create(&self, table: &Table) -> Result<()> {
        let name = &self.target.dataset_name;
        fs::create_dir_all(self.dir.root())?;

        let stored: Vec<StoredColumn> = table
            .columns()
            .iter()
            .map(|c| StoredColumn {
                name: c.name.clone(),
                role: c.role,
                data_type: c.data_type,
            })
            .collect();

        let (rows, bytes) = encode_rows(table)?;
        let schema_bytes = serde_json::to_vec_pretty(&stored)?;

        // Stage both files before either rename; rows land before the schema
        // that describes them.
        let data_path = self.dir.data_path(name);
        let schema_path = self.dir.schema_path(name);
        let data_tmp = stage(&data_path, &bytes)?;
        let schema_tmp = match stage(&schema_path, &schema_bytes) {
            Ok(tmp) => tmp,
            Err(e) => {
                let _ = fs::remove_file(&data_tmp);
                return Err(e);
            }
        };
        if let Err(e) = fs::rename(&data_tmp, &data_path) {
            let _ = fs::remove_file(&data_tmp);
            let _ = fs::remove_file(&schema_tmp);
            return Err(e.into());
        }
        fs::rename(&schema_tmp, &schema_path)?;

        info!(dataset = %name, rows, "created dataset");
        Ok(())
    }

    fn append(&self, table: &Table) -> Result<()> {
        let name = &self.target.dataset_name;
        if !self.dir.exists(name) {
            debug!(dataset = %name, "append target missing; creating it");
            return self.create(table);
        }

        let stored = self.dir.stored_schema(name)?;
        if let Some(diff) = stored.diff(&table.schema()) {
            return Err(Error::Data(format!(
                "cannot append to '{name}': schema mismatch: {diff}"
            )));
        }

        // Encode everything first so a bad value leaves the file untouched.
        let (rows, bytes) = encode_rows(table)?;
        let mut file = OpenOptions::new()
            .append(true)
            .open(self.dir.data_path(name))?;
        file.write_all(&bytes)?;
        file.sync_all()?;

        info!(dataset = %name, rows, "appended to dataset");
        Ok(())
    }
}

impl OutputSink for LocalStore {
    fn target(&self) -> &OutputTarget {
        &self.target
    }

    fn write(&self, table: &Table, mode: WriteMode) -> Result<()> {
        match mode {
            WriteMode::Create => self.create(table),
            WriteMode::Append => self.append(table),
        }
    }

    fn write_metadata(&self, record: &DatasetMetadata) -> Result<()> {
        let path = self.dir.metadata_path(&record.dataset_name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        write_atomic(&path, &serde_json::to_vec_pretty(record)?)?;
        debug!(dataset = %record.dataset_name, "wrote catalog record");
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(".tmp");
    PathBuf::from(s)
}

/// Rows of `table` as JSONL bytes, with the row count.
fn encode_rows(table: &Table) -> Result<(usize, Vec<u8>)> {
    let mut writer = JsonlWriter::to_writer(Vec::new());
    let rows = writer.write_table(table)?;
    Ok((rows, writer.finish()?))
}

/// Write `bytes` to the temp sibling of `path` and sync it.
fn stage(path: &Path, bytes: &[u8]) -> Result<PathBuf> {
    let tmp = tmp_path(path);
    let result = File::create(&tmp).and_then(|mut f| {
        f.write_all(bytes)?;
        f.sync_all()
    });
    match result {
        Ok(()) => Ok(tmp),
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            Err(e.into())
        }
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = stage(path, bytes)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use h3load_core::error::ErrorKind;
    use h3load_core::types::Scalar;

    fn table(values: &[i64]) -> Table {
        Table::try_new(vec![
            Column::key(
                "latitude",
                DataType::Real,
                values.iter().map(|_| Scalar::Real(50.0)).collect(),
            ),
            Column::key(
                "longitude",
                DataType::Real,
                values.iter().map(|_| Scalar::Real(-50.0)).collect(),
            ),
            Column::data(
                "value1",
                DataType::Integer,
                values.iter().map(|v| Scalar::Integer(*v)).collect(),
            ),
        ])
        .unwrap()
    }

    fn store(dir: &Path, mode: WriteMode) -> LocalStore {
        LocalStore::new(
            dir,
            OutputTarget::new("points", mode)
                .with_description("A Test Dataset")
                .with_dataset_type("point"),
        )
        .unwrap()
    }

    #[test]
    fn create_round_trips_table_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let sink = store(dir.path(), WriteMode::Create);
        sink.store(&table(&[10, 0, 2])).unwrap();

        let read = sink.dir().read_table("points").unwrap();
        assert_eq!(read, table(&[10, 0, 2]));

        let meta = sink.dir().read_metadata("points").unwrap().unwrap();
        assert_eq!(meta.dataset_type, "point");
        assert_eq!(
            meta.key_schema.pairs(),
            vec![("latitude", "real"), ("longitude", "real")]
        );
        assert_eq!(meta.value_schema.pairs(), vec![("value1", "integer")]);
        assert_eq!(sink.dir().list_datasets().unwrap(), vec!["points"]);
        assert!(!tmp_path(&sink.dir().data_path("points")).exists());
    }

    #[test]
    fn create_replaces_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let sink = store(dir.path(), WriteMode::Create);
        sink.store(&table(&[1, 2, 3])).unwrap();
        sink.store(&table(&[4])).unwrap();
        assert_eq!(sink.dir().read_table("points").unwrap(), table(&[4]));
    }

    #[test]
    fn append_adds_rows_without_touching_metadata() {
        let dir = tempfile::tempdir().unwrap();
        store(dir.path(), WriteMode::Create)
            .store(&table(&[1]))
            .unwrap();
        let before = fs::read(StoreDir::new(dir.path()).metadata_path("points")).unwrap();

        let appender = LocalStore::new(
            dir.path(),
            OutputTarget::new("points", WriteMode::Append).with_description("changed"),
        )
        .unwrap();
        appender.store(&table(&[2, 3])).unwrap();

        assert_eq!(
            appender.dir().read_table("points").unwrap(),
            table(&[1, 2, 3])
        );
        let after = fs::read(appender.dir().metadata_path("points")).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn append_with_other_schema_is_rejected_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        store(dir.path(), WriteMode::Create)
            .store(&table(&[1]))
            .unwrap();

        let other = Table::try_new(vec![Column::data(
            "value1",
            DataType::Real,
            vec![Scalar::Real(1.5)],
        )])
        .unwrap();
        let err = store(dir.path(), WriteMode::Append)
            .store(&other)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);
        assert_eq!(
            StoreDir::new(dir.path()).read_table("points").unwrap(),
            table(&[1])
        );
    }

    fn real_table(values: &[f64]) -> Table {
        Table::try_new(vec![Column::data(
            "v",
            DataType::Real,
            values.iter().map(|v| Scalar::Real(*v)).collect(),
        )])
        .unwrap()
    }

    #[test]
    fn append_with_unencodable_row_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        store(dir.path(), WriteMode::Create)
            .store(&real_table(&[1.0]))
            .unwrap();

        let err = store(dir.path(), WriteMode::Append)
            .store(&real_table(&[2.0, 3.0, f64::NAN]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);
        assert_eq!(
            StoreDir::new(dir.path()).read_table("points").unwrap(),
            real_table(&[1.0])
        );
    }

    #[test]
    fn failed_create_keeps_previous_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let sink = store(dir.path(), WriteMode::Create);
        sink.store(&table(&[1, 2])).unwrap();

        assert!(sink.store(&real_table(&[f64::INFINITY])).is_err());
        assert_eq!(sink.dir().read_table("points").unwrap(), table(&[1, 2]));
        assert!(!tmp_path(&sink.dir().data_path("points")).exists());
        assert!(!tmp_path(&sink.dir().schema_path("points")).exists());
    }

    #[test]
    fn append_to_missing_dataset_creates_it() {
        let dir = tempfile::tempdir().unwrap();
        let sink = store(dir.path(), WriteMode::Append);
        sink.store(&table(&[7])).unwrap();
        assert_eq!(sink.dir().read_table("points").unwrap(), table(&[7]));
        assert!(sink.dir().read_metadata("points").unwrap().is_none());
    }

    #[test]
    fn unreadable_store_surfaces_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = StoreDir::new(dir.path()).read_table("nope").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Store);
    }
}
