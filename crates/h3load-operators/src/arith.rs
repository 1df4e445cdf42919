//! Shared element-wise arithmetic for the pre/post transform steps.

use h3load_core::schema::DataType;
use h3load_core::types::{Column, ColumnRole, Scalar, Table};

use crate::traits::OpError;

#[derive(Debug, Clone, Copy)]
pub(crate) enum ArithOp {
    Add(f64),
    Mul(f64),
}

impl ArithOp {
    fn apply_real(self, x: f64) -> f64 {
        match self {
            ArithOp::Add(k) => x + k,
            ArithOp::Mul(k) => x * k,
        }
    }

    /// Integer result, or `None` when the operand is fractional or the
    /// result overflows; the caller then falls back to reals.
    fn apply_integer(self, x: i64) -> Option<i64> {
        let k = match self {
            ArithOp::Add(k) | ArithOp::Mul(k) => k,
        };
        if k.fract() != 0.0 || k.abs() >= i64::MAX as f64 {
            return None;
        }
        let k = k as i64;
        match self {
            ArithOp::Add(_) => x.checked_add(k),
            ArithOp::Mul(_) => x.checked_mul(k),
        }
    }
}

/// Apply `op` to the data columns of `input`, or to `only` when given.
///
/// Key columns are never touched and naming one in `only` is an error, as is
/// naming a column that does not exist. Column order and names are kept.
pub(crate) fn apply_to_data_columns(
    input: Table,
    only: Option<&[String]>,
    op: ArithOp,
) -> Result<Table, OpError> {
    if let Some(names) = only {
        for name in names {
            let col = input.require(name)?;
            if col.role != ColumnRole::Data {
                return Err(OpError::Data(format!(
                    "'{name}' is a key column and cannot be transformed"
                )));
            }
        }
    }

    let selected = |col: &Column| match only {
        Some(names) => names.iter().any(|n| *n == col.name),
        None => col.role == ColumnRole::Data,
    };

    let columns = input
        .into_columns()
        .into_iter()
        .map(|col| {
            if selected(&col) {
                apply_column(col, op)
            } else {
                Ok(col)
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    Table::try_new(columns).map_err(OpError::from)
}

fn apply_column(col: Column, op: ArithOp) -> Result<Column, OpError> {
    match col.data_type {
        DataType::Text => Err(OpError::Data(format!(
            "column '{}' is text and cannot be used in arithmetic",
            col.name
        ))),
        DataType::Integer => {
            let ints = col
                .values
                .iter()
                .map(|v| v.as_i64().and_then(|x| op.apply_integer(x)).map(Scalar::Integer))
                .collect::<Option<Vec<_>>>();
            match ints {
                Some(values) => Ok(Column { values, ..col }),
                None => to_real(col, op),
            }
        }
        DataType::Real => to_real(col, op),
    }
}

fn to_real(col: Column, op: ArithOp) -> Result<Column, OpError> {
    let values = col
        .values
        .iter()
        .map(|v| v.as_f64().map(|x| Scalar::Real(op.apply_real(x))))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| OpError::Data(format!("column '{}' holds non-numeric values", col.name)))?;
    Ok(Column {
        data_type: DataType::Real,
        values,
        ..col
    })
}
