//! Row codec for dataset files: one JSON array per line, in column order.
//!
//! Types are not repeated per row; the dataset's stored schema tells the
//! reader how to interpret each position.

use std::io::{BufRead, BufWriter, Write};

use h3load_core::schema::{DataType, Schema};
use h3load_core::types::{Scalar, Table};

use crate::error::{Error, Result};

pub struct JsonlWriter<W: Write> {
    writer: BufWriter<W>,
}

impl<W: Write> JsonlWriter<W> {
    pub fn to_writer(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    /// Write every row of `table`; returns the number of rows written.
    pub fn write_table(&mut self, table: &Table) -> Result<usize> {
        let nrows = table.num_rows();
        for r in 0..nrows {
            let line = table
                .columns()
                .iter()
                .map(|col| scalar_to_json(&col.name, &col.values[r]))
                .collect::<Result<Vec<_>>>()?;
            serde_json::to_writer(&mut self.writer, &line)?;
            self.writer.write_all(b"\n")?;
        }
        Ok(nrows)
    }

    /// Flush and hand back the inner writer.
    pub fn finish(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| Error::Io(e.into_error()))
    }
}

fn scalar_to_json(column: &str, v: &Scalar) -> Result<serde_json::Value> {
    Ok(match v {
        Scalar::Integer(i) => serde_json::Value::from(*i),
        Scalar::Real(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .ok_or_else(|| {
                Error::Data(format!("column '{column}': cannot store non-finite value {f}"))
            })?,
        Scalar::Text(s) => serde_json::Value::String(s.clone()),
    })
}

fn json_to_scalar(v: &serde_json::Value, data_type: DataType) -> Option<Scalar> {
    match data_type {
        DataType::Integer => v.as_i64().map(Scalar::Integer),
        DataType::Real => v.as_f64().map(Scalar::Real),
        DataType::Text => v.as_str().map(|s| Scalar::Text(s.to_string())),
    }
}

/// Decode every line of `reader` against `schema`, column by column.
pub fn read_columns<R: BufRead>(reader: R, schema: &Schema) -> Result<Vec<Vec<Scalar>>> {
    let mut columns: Vec<Vec<Scalar>> = vec![Vec::new(); schema.len()];
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let values: Vec<serde_json::Value> = serde_json::from_str(&line)?;
        if values.len() != schema.len() {
            return Err(Error::Data(format!(
                "line {}: expected {} values, found {}",
                lineno + 1,
                schema.len(),
                values.len()
            )));
        }
        for ((out, field), v) in columns.iter_mut().zip(&schema.fields).zip(&values) {
            let scalar = json_to_scalar(v, field.data_type).ok_or_else(|| {
                Error::Data(format!(
                    "line {}: '{}' expected {}, found {v}",
                    lineno + 1,
                    field.name,
                    field.data_type
                ))
            })?;
            out.push(scalar);
        }
    }
    Ok(columns)
}
