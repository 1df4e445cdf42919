//! Spatial aggregation: group rows by (extra keys, grid cell) and reduce every
//! data column with every declared reduction in a single pass.
//!
//! Groups live in an arena (`Vec<GroupState>`) indexed by a hash map from the
//! group key to the arena slot, so output order is first-seen order and is
//! stable for a fixed input.
//!
//! Output layout:
//! `extra keys.. | h3_cell | <col>_<reduction>.. | cell_latitude | cell_longitude`
//! where reduced columns iterate data columns (table order) and, within each,
//! reductions (declared order).

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use h3o::CellIndex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use h3load_core::schema::DataType;
use h3load_core::types::{Column, Scalar, Table};
use h3load_core::{LATITUDE, LONGITUDE};

use crate::grid::{centroid, Grid};
use crate::traits::{AggregationStep, OpError};

/// Name of the cell id column emitted by the pass.
pub const H3_CELL: &str = "h3_cell";
pub const CELL_LATITUDE: &str = "cell_latitude";
pub const CELL_LONGITUDE: &str = "cell_longitude";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reduction {
    Min,
    Max,
    Sum,
    Mean,
    Count,
}

impl Reduction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reduction::Min => "min",
            Reduction::Max => "max",
            Reduction::Sum => "sum",
            Reduction::Mean => "mean",
            Reduction::Count => "count",
        }
    }

    pub fn output_type(&self, input: DataType) -> DataType {
        match self {
            Reduction::Min | Reduction::Max | Reduction::Sum => input,
            Reduction::Mean => DataType::Real,
            Reduction::Count => DataType::Integer,
        }
    }

    /// Name of the output column for `column` reduced by `self`.
    pub fn output_name(&self, column: &str) -> String {
        format!("{column}_{}", self.as_str())
    }
}

/// Running state for one (group, data column, reduction).
#[derive(Debug, Clone)]
enum Accumulator {
    MinInt(i64),
    MaxInt(i64),
    MinReal(f64),
    MaxReal(f64),
    SumInt(i64),
    SumReal(f64),
    Mean { sum: f64, n: u64 },
    Count(i64),
}

impl Accumulator {
    fn start(reduction: Reduction, first: &Scalar) -> Result<Self, OpError> {
        Ok(match (reduction, first) {
            (Reduction::Min, Scalar::Integer(v)) => Accumulator::MinInt(*v),
            (Reduction::Max, Scalar::Integer(v)) => Accumulator::MaxInt(*v),
            (Reduction::Sum, Scalar::Integer(v)) => Accumulator::SumInt(*v),
            (Reduction::Min, Scalar::Real(v)) => Accumulator::MinReal(*v),
            (Reduction::Max, Scalar::Real(v)) => Accumulator::MaxReal(*v),
            (Reduction::Sum, Scalar::Real(v)) => Accumulator::SumReal(*v),
            (Reduction::Mean, v) => Accumulator::Mean {
                sum: numeric(v)?,
                n: 1,
            },
            (Reduction::Count, _) => Accumulator::Count(1),
            (r, v) => {
                return Err(OpError::Data(format!(
                    "cannot apply {} to a {} value",
                    r.as_str(),
                    v.data_type()
                )))
            }
        })
    }

    fn update(&mut self, value: &Scalar) -> Result<(), OpError> {
        match (self, value) {
            (Accumulator::MinInt(acc), Scalar::Integer(v)) => *acc = (*acc).min(*v),
            (Accumulator::MaxInt(acc), Scalar::Integer(v)) => *acc = (*acc).max(*v),
            (Accumulator::MinReal(acc), Scalar::Real(v)) => *acc = acc.min(*v),
            (Accumulator::MaxReal(acc), Scalar::Real(v)) => *acc = acc.max(*v),
            (Accumulator::SumInt(acc), Scalar::Integer(v)) => {
                *acc = acc
                    .checked_add(*v)
                    .ok_or_else(|| OpError::Data("integer overflow in sum".into()))?;
            }
            (Accumulator::SumReal(acc), Scalar::Real(v)) => *acc += *v,
            (Accumulator::Mean { sum, n }, v) => {
                *sum += numeric(v)?;
                *n += 1;
            }
            (Accumulator::Count(acc), _) => *acc += 1,
            (_, v) => {
                return Err(OpError::Data(format!(
                    "value of type {} does not match its column",
                    v.data_type()
                )))
            }
        }
        Ok(())
    }

    fn finish(&self) -> Scalar {
        match self {
            Accumulator::MinInt(v) | Accumulator::MaxInt(v) | Accumulator::SumInt(v) => {
                Scalar::Integer(*v)
            }
            Accumulator::MinReal(v) | Accumulator::MaxReal(v) | Accumulator::SumReal(v) => {
                Scalar::Real(*v)
            }
            Accumulator::Mean { sum, n } => Scalar::Real(*sum / *n as f64),
            Accumulator::Count(v) => Scalar::Integer(*v),
        }
    }
}

fn numeric(v: &Scalar) -> Result<f64, OpError> {
    v.as_f64()
        .ok_or_else(|| OpError::Data(format!("expected a numeric value, found {}", v.data_type())))
}

/// Hashable view of an extra key value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum KeyPart {
    Integer(i64),
    Real(u64),
    Text(String),
}

impl From<&Scalar> for KeyPart {
    fn from(v: &Scalar) -> Self {
        match v {
            Scalar::Integer(i) => KeyPart::Integer(*i),
            Scalar::Real(f) => {
                // -0.0 and 0.0 must land in the same group.
                let f = if *f == 0.0 { 0.0f64 } else { *f };
                KeyPart::Real(f.to_bits())
            }
            Scalar::Text(s) => KeyPart::Text(s.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GroupKey {
    keys: Vec<KeyPart>,
    cell: u64,
}

#[derive(Debug)]
struct GroupState {
    key_values: Vec<Scalar>,
    cell: CellIndex,
    /// Indexed `data_column * reductions.len() + reduction`.
    accs: Vec<Accumulator>,
}

/// Everything the combined aggregation pass needs besides the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationPlan {
    pub resolution: u8,
    /// Extra grouping columns, in output order. Never the coordinate columns.
    pub key_columns: Vec<String>,
    pub reductions: Vec<Reduction>,
}

impl AggregationPlan {
    pub fn new(resolution: u8, key_columns: Vec<String>, reductions: Vec<Reduction>) -> Self {
        Self {
            resolution,
            key_columns,
            reductions,
        }
    }

    pub fn from_steps(
        resolution: u8,
        key_columns: Vec<String>,
        steps: &[Box<dyn AggregationStep>],
    ) -> Self {
        Self::new(
            resolution,
            key_columns,
            steps.iter().map(|s| s.reduction()).collect(),
        )
    }

    /// Checks that need no data: resolution, reduction set, key names.
    pub fn validate(&self) -> Result<(), OpError> {
        Grid::new(self.resolution)?;
        if self.reductions.is_empty() {
            return Err(OpError::Config(
                "aggregation requires at least one reduction".into(),
            ));
        }
        let mut seen = HashSet::new();
        for r in &self.reductions {
            if !seen.insert(*r) {
                return Err(OpError::Config(format!(
                    "reduction '{}' is declared more than once",
                    r.as_str()
                )));
            }
        }
        for k in &self.key_columns {
            if k == LATITUDE || k == LONGITUDE {
                return Err(OpError::Config(format!(
                    "'{k}' is a coordinate column and cannot be an extra key"
                )));
            }
        }
        Ok(())
    }
}

/// Run the combined aggregation pass over `table`.
pub fn aggregate(table: Table, plan: &AggregationPlan) -> Result<Table, OpError> {
    plan.validate()?;
    let grid = Grid::new(plan.resolution)?;

    let lats = coordinates(&table, LATITUDE)?;
    let lngs = coordinates(&table, LONGITUDE)?;

    let key_cols = plan
        .key_columns
        .iter()
        .map(|name| table.require(name).map_err(OpError::from))
        .collect::<Result<Vec<_>, _>>()?;

    let data_cols: Vec<&Column> = table.data_columns().collect();
    if let Some(col) = data_cols.iter().find(|c| !c.data_type.is_numeric()) {
        return Err(OpError::Data(format!(
            "data column '{}' is {}; only numeric columns can be aggregated",
            col.name, col.data_type
        )));
    }

    let n_red = plan.reductions.len();
    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut groups: Vec<GroupState> = Vec::new();

    for row in 0..table.num_rows() {
        let cell = grid
            .cell(lats[row], lngs[row])
            .map_err(|e| OpError::Data(format!("row {row}: {e}")))?;
        let key = GroupKey {
            keys: key_cols
                .iter()
                .map(|c| KeyPart::from(&c.values[row]))
                .collect(),
            cell: u64::from(cell),
        };

        match index.entry(key) {
            Entry::Occupied(slot) => {
                let group = &mut groups[*slot.get()];
                for (ci, col) in data_cols.iter().enumerate() {
                    for ri in 0..n_red {
                        group.accs[ci * n_red + ri].update(&col.values[row])?;
                    }
                }
            }
            Entry::Vacant(slot) => {
                let mut accs = Vec::with_capacity(data_cols.len() * n_red);
                for col in &data_cols {
                    for r in &plan.reductions {
                        accs.push(Accumulator::start(*r, &col.values[row])?);
                    }
                }
                slot.insert(groups.len());
                groups.push(GroupState {
                    key_values: key_cols.iter().map(|c| c.values[row].clone()).collect(),
                    cell,
                    accs,
                });
            }
        }
    }

    debug!(
        rows = table.num_rows(),
        groups = groups.len(),
        resolution = plan.resolution,
        "aggregated rows into grid cells"
    );

    let mut out = Vec::with_capacity(key_cols.len() + 3 + data_cols.len() * n_red);
    for (ki, col) in key_cols.iter().enumerate() {
        out.push(Column::key(
            col.name.clone(),
            col.data_type,
            groups.iter().map(|g| g.key_values[ki].clone()).collect(),
        ));
    }
    out.push(Column::key(
        H3_CELL,
        DataType::Text,
        groups.iter().map(|g| Scalar::Text(g.cell.to_string())).collect(),
    ));
    for (ci, col) in data_cols.iter().enumerate() {
        for (ri, r) in plan.reductions.iter().enumerate() {
            out.push(Column::data(
                r.output_name(&col.name),
                r.output_type(col.data_type),
                groups.iter().map(|g| g.accs[ci * n_red + ri].finish()).collect(),
            ));
        }
    }
    let centroids: Vec<(f64, f64)> = groups.iter().map(|g| centroid(g.cell)).collect();
    out.push(Column::key(
        CELL_LATITUDE,
        DataType::Real,
        centroids.iter().map(|(lat, _)| Scalar::Real(*lat)).collect(),
    ));
    out.push(Column::key(
        CELL_LONGITUDE,
        DataType::Real,
        centroids.iter().map(|(_, lng)| Scalar::Real(*lng)).collect(),
    ));

    Table::try_new(out).map_err(OpError::from)
}

fn coordinates(table: &Table, name: &str) -> Result<Vec<f64>, OpError> {
    let col = table.require(name)?;
    col.values
        .iter()
        .enumerate()
        .map(|(row, v)| {
            v.as_f64().ok_or_else(|| {
                OpError::Data(format!("row {row}: '{name}' holds non-numeric value '{v}'"))
            })
        })
        .collect()
}

macro_rules! reduction_step {
    ($(#[$doc:meta])* $ty:ident, $reduction:expr, $name:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
        pub struct $ty;

        impl AggregationStep for $ty {
            fn name(&self) -> &'static str {
                $name
            }

            fn reduction(&self) -> Reduction {
                $reduction
            }
        }
    };
}

reduction_step!(
    /// Per-cell minimum of every data column.
    MinAggregation,
    Reduction::Min,
    "min_aggregation"
);
reduction_step!(
    /// Per-cell maximum of every data column.
    MaxAggregation,
    Reduction::Max,
    "max_aggregation"
);
reduction_step!(SumAggregation, Reduction::Sum, "sum_aggregation");
reduction_step!(MeanAggregation, Reduction::Mean, "mean_aggregation");
reduction_step!(
    /// Number of source rows per group, once per data column.
    CountAggregation,
    Reduction::Count,
    "count_aggregation"
);
