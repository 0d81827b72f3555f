// Pivot builder: reshapes grouped aggregates into row × column tables.
//
// Rounding to two decimals happens here, once. Consumers (console preview,
// chart series, xlsx export) take cell values verbatim.
use crate::aggregate::{AggValue, GroupKey, GroupedAggregate, Metric};
use crate::types::{DimValue, Dimension};
use crate::util::round2;
use log::{debug, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Consumer of a pivot. Decides how unobserved combinations are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Destination {
    /// Missing cells become `0` so stacked bars render without gaps.
    Chart,
    /// Missing cells stay empty; `0` always means an observed zero.
    Table,
    /// Same fill policy as `Table`.
    Export,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Cell {
    Value(f64),
    Empty,
}

impl Cell {
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Cell::Value(v) => Some(v),
            Cell::Empty => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum ColumnLabel {
    Value(DimValue),
    /// Sample size companion of a mean column, shown as `<label>_count`.
    Count(DimValue),
    /// Per-row total, e.g. `Total_Estaciones`.
    Total(String),
}

impl fmt::Display for ColumnLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnLabel::Value(v) => write!(f, "{}", v),
            ColumnLabel::Count(v) => write!(f, "{}_count", v),
            ColumnLabel::Total(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotTable {
    pub row_dim: Dimension,
    pub col_dim: Dimension,
    pub destination: Destination,
    pub row_labels: Vec<DimValue>,
    pub column_labels: Vec<ColumnLabel>,
    cells: Vec<Vec<Cell>>,
}

impl PivotTable {
    pub fn is_empty(&self) -> bool {
        self.row_labels.is_empty() || self.column_labels.is_empty()
    }

    /// Cells in row-major order, one `Vec` per row label.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.cells
    }

    pub fn cell(&self, row: &DimValue, col: &ColumnLabel) -> Option<Cell> {
        let r = self.row_labels.iter().position(|l| l == row)?;
        let c = self.column_labels.iter().position(|l| l == col)?;
        Some(self.cells[r][c])
    }

    /// Stacked height per row: the sum of every numeric cell.
    pub fn row_sums(&self) -> Vec<f64> {
        self.cells
            .iter()
            .map(|row| round2(row.iter().filter_map(Cell::as_f64).sum()))
            .collect()
    }

    /// Append a total column looked up from `totals`, which must be grouped
    /// by this pivot's row dimension alone.
    pub fn with_row_totals(mut self, label: &str, totals: &GroupedAggregate) -> Self {
        let counts = totals.metric != Metric::MeanKpi;
        for (row, cells) in self.row_labels.iter().zip(self.cells.iter_mut()) {
            let v = totals.get(&GroupKey::Single(row.clone()));
            cells.push(materialize(v, counts, self.destination));
        }
        self.column_labels.push(ColumnLabel::Total(label.to_string()));
        self
    }
}

pub fn pivot(
    grouped: &GroupedAggregate,
    row_dim: Dimension,
    col_dim: Dimension,
    destination: Destination,
) -> PivotTable {
    if row_dim == col_dim
        || !grouped.group_by.contains(row_dim)
        || !grouped.group_by.contains(col_dim)
    {
        warn!(
            "pivot {:?} x {:?} requested over grouping {:?}",
            row_dim, col_dim, grouped.group_by
        );
    }
    let row_labels = distinct_labels(grouped, row_dim);
    let col_values = distinct_labels(grouped, col_dim);
    let counts = grouped.metric != Metric::MeanKpi;

    let cells = row_labels
        .iter()
        .map(|r| {
            col_values
                .iter()
                .map(|c| {
                    let v = grouped.lookup(&[(row_dim, r.clone()), (col_dim, c.clone())]);
                    materialize(v, counts, destination)
                })
                .collect()
        })
        .collect();

    debug!(
        "pivot {:?} x {:?} ({:?}): {} rows, {} columns",
        row_dim,
        col_dim,
        destination,
        row_labels.len(),
        col_values.len()
    );
    PivotTable {
        row_dim,
        col_dim,
        destination,
        row_labels,
        column_labels: col_values.into_iter().map(ColumnLabel::Value).collect(),
        cells,
    }
}

/// Mean pivot followed by one `<label>_count` column per column label of
/// `sizes`. Count cells are real observations, so an unobserved
/// combination counts as `0` in every destination.
pub fn pivot_with_counts(
    means: &GroupedAggregate,
    sizes: &GroupedAggregate,
    row_dim: Dimension,
    col_dim: Dimension,
    destination: Destination,
) -> PivotTable {
    let mut table = pivot(means, row_dim, col_dim, destination);
    let count_cols = distinct_labels(sizes, col_dim);
    for (row, cells) in table.row_labels.iter().zip(table.cells.iter_mut()) {
        for c in &count_cols {
            let v = sizes.lookup(&[(row_dim, row.clone()), (col_dim, c.clone())]);
            cells.push(materialize(v, true, destination));
        }
    }
    table
        .column_labels
        .extend(count_cols.into_iter().map(ColumnLabel::Count));
    table
}

fn materialize(v: Option<AggValue>, counts: bool, destination: Destination) -> Cell {
    match v.and_then(|v| v.as_f64()) {
        Some(x) => Cell::Value(round2(x)),
        None if counts => Cell::Value(0.0),
        None => match destination {
            Destination::Chart => Cell::Value(0.0),
            Destination::Table | Destination::Export => Cell::Empty,
        },
    }
}

/// Distinct values of `dim` among the grouped keys: ascending for years,
/// first-seen order for categories.
fn distinct_labels(grouped: &GroupedAggregate, dim: Dimension) -> Vec<DimValue> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for (key, _) in grouped.entries() {
        if let Some(v) = key.value(grouped.group_by, dim) {
            if seen.insert(v) {
                out.push(v.clone());
            }
        }
    }
    if dim == Dimension::Year {
        out.sort();
    }
    out
}
