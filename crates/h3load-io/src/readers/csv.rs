//! CSV file reader with column projection and type inference.
//!
//! Inference rules:
//! - coordinates are always parsed as `real`;
//! - data columns are `integer` when every cell parses as `i64`, otherwise
//!   `real` (finite only), otherwise the read fails;
//! - extra key columns fall back further to `text`.
//!
//! Empty cells are rejected; there is no null in the table model.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::info;

use h3load_core::schema::DataType;
use h3load_core::types::{Column, ColumnRole, Scalar, Table};
use h3load_core::{LATITUDE, LONGITUDE};

use crate::error::{Error, Result};
use crate::readers::Reader;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvFileReader {
    pub file_path: String,
    pub data_columns: Vec<String>,
    #[serde(default)]
    pub key_columns: Vec<String>,
}

impl CsvFileReader {
    pub fn new(file_path: impl Into<String>, data_columns: Vec<String>) -> Self {
        Self {
            file_path: file_path.into(),
            data_columns,
            key_columns: Vec::new(),
        }
    }

    pub fn with_key_columns(mut self, key_columns: Vec<String>) -> Self {
        self.key_columns = key_columns;
        self
    }

    /// Requested columns in output order, tagged with their role.
    fn projection(&self) -> Result<Vec<(&str, ColumnRole)>> {
        let mut out: Vec<(&str, ColumnRole)> =
            vec![(LATITUDE, ColumnRole::Key), (LONGITUDE, ColumnRole::Key)];
        out.extend(self.key_columns.iter().map(|k| (k.as_str(), ColumnRole::Key)));
        out.extend(
            self.data_columns
                .iter()
                .map(|d| (d.as_str(), ColumnRole::Data)),
        );

        let mut seen = HashSet::new();
        for (name, _) in &out {
            if !seen.insert(*name) {
                return Err(Error::Config(format!(
                    "column '{name}' is requested more than once"
                )));
            }
        }
        Ok(out)
    }
}

impl Reader for CsvFileReader {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn read(&self) -> Result<Table> {
        let projection = self.projection()?;

        let mut rdr = ::csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(::csv::Trim::All)
            .from_path(&self.file_path)?;

        let headers = rdr.headers()?.clone();
        let indices = projection
            .iter()
            .map(|(name, _)| {
                headers.iter().position(|h| h == *name).ok_or_else(|| {
                    Error::Data(format!(
                        "column '{name}' not found in '{}'",
                        self.file_path
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut raw: Vec<Vec<String>> = vec![Vec::new(); projection.len()];
        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            for (slot, &idx) in indices.iter().enumerate() {
                let cell = record.get(idx).unwrap_or("");
                if cell.is_empty() {
                    return Err(Error::Data(format!(
                        "row {row}: column '{}' is empty",
                        projection[slot].0
                    )));
                }
                raw[slot].push(cell.to_string());
            }
        }

        let columns = projection
            .iter()
            .zip(raw)
            .map(|(&(name, role), cells)| build_column(name, role, cells))
            .collect::<Result<Vec<_>>>()?;

        let table = Table::try_new(columns)?;
        info!(
            path = %self.file_path,
            rows = table.num_rows(),
            columns = table.num_columns(),
            "read csv input"
        );
        Ok(table)
    }
}

fn build_column(name: &str, role: ColumnRole, cells: Vec<String>) -> Result<Column> {
    let coordinate = name == LATITUDE || name == LONGITUDE;

    if !coordinate {
        if let Some(values) = parse_all(&cells, |s| s.parse::<i64>().ok().map(Scalar::Integer)) {
            return Ok(Column::new(name, role, DataType::Integer, values));
        }
    }
    if let Some(values) = parse_all(&cells, |s| parse_real(s).map(Scalar::Real)) {
        return Ok(Column::new(name, role, DataType::Real, values));
    }
    if role == ColumnRole::Key && !coordinate {
        let values = cells.into_iter().map(Scalar::Text).collect();
        return Ok(Column::new(name, role, DataType::Text, values));
    }

    let bad = cells
        .iter()
        .position(|s| parse_real(s).is_none())
        .unwrap_or(0);
    Err(Error::Data(format!(
        "row {bad}: column '{name}' holds non-numeric or non-finite value '{}'",
        cells.get(bad).map(String::as_str).unwrap_or("")
    )))
}

/// `f64::from_str` accepts `NaN` and `inf`; the table model does not.
fn parse_real(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|f| f.is_finite())
}

fn parse_all(cells: &[String], parse: impl Fn(&str) -> Option<Scalar>) -> Option<Vec<Scalar>> {
    cells.iter().map(|s| parse(s)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_csv(dir: &tempfile::TempDir, body: &str) -> String {
        let path = dir.path().join("input.csv");
        fs::write(&path, body).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn projects_and_infers_types() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "company,value2,longitude,latitude,value1,ignored\n\
             company1,100,50,50,10,x\n\
             company2,20.5,50.2,50.2,2,y\n",
        );
        let reader = CsvFileReader::new(path, vec!["value1".into(), "value2".into()])
            .with_key_columns(vec!["company".into()]);
        let table = reader.read().unwrap();

        assert_eq!(
            table.column_names(),
            vec!["latitude", "longitude", "company", "value1", "value2"]
        );
        let schema = table.schema();
        assert_eq!(
            schema.pairs(),
            vec![
                ("latitude", "real"),
                ("longitude", "real"),
                ("company", "text"),
                ("value1", "integer"),
                ("value2", "real"),
            ]
        );
        assert_eq!(
            table.key_columns().count(),
            3,
            "coordinates and company are keys"
        );
        assert_eq!(table.row(0).unwrap()[0], &Scalar::Real(50.0));
    }

    #[test]
    fn missing_column_is_a_data_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "latitude,longitude\n1,2\n");
        let err = CsvFileReader::new(path, vec!["value1".into()])
            .read()
            .unwrap_err();
        assert!(matches!(err, Error::Data(ref m) if m.contains("value1")));
    }

    #[test]
    fn empty_and_non_numeric_cells_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "latitude,longitude,v\n1,2,\n");
        assert!(CsvFileReader::new(path, vec!["v".into()]).read().is_err());

        let path = write_csv(&dir, "latitude,longitude,v\n1,2,abc\n");
        let err = CsvFileReader::new(path, vec!["v".into()])
            .read()
            .unwrap_err();
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn non_finite_cells_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "latitude,longitude,v\n1,2,3\nNaN,inf,NaN\n");
        let err = CsvFileReader::new(path, vec!["v".into()])
            .read()
            .unwrap_err();
        assert!(matches!(err, Error::Data(ref m) if m.contains("row 1") && m.contains("NaN")));

        let path = write_csv(&dir, "latitude,longitude,v\n1,2,infinity\n");
        let err = CsvFileReader::new(path, vec!["v".into()])
            .read()
            .unwrap_err();
        assert_eq!(err.kind(), h3load_core::error::ErrorKind::Data);
    }

    #[test]
    fn duplicate_request_is_a_config_error() {
        let reader = CsvFileReader::new("unused.csv", vec!["latitude".into()]);
        assert!(matches!(reader.read(), Err(Error::Config(_))));
    }

    #[test]
    fn missing_file_is_a_store_error() {
        let err = CsvFileReader::new("/definitely/not/here.csv", vec![])
            .read()
            .unwrap_err();
        assert_eq!(err.kind(), h3load_core::error::ErrorKind::Store);
    }
}
