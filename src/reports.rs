// Report assembly: one explicit `render(dataset, filters, page)` call per
// interaction, recomputing everything from the session dataset.
use crate::aggregate::{aggregate, aggregate_group, AggValue, GroupBy, GroupKey, Metric};
use crate::error::ReportError;
use crate::export::ExportFile;
use crate::filter::{filter_records, FilterSpec};
use crate::pivot::{pivot, pivot_with_counts, Destination, PivotTable};
use crate::types::{CountryMeanRow, DimValue, Dimension, ProductivityRow, Record, SummaryStats};
use crate::util::{format_opt, round2};
use log::info;
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use Destination::{Chart, Export, Table};
use Dimension::{Country, Station, Year};

pub const TOTAL_STATIONS_LABEL: &str = "Total_Estaciones";

/// The two dashboard pages. They share the whole pipeline and differ only in
/// which pivots they request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    General,
    Efficiency,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PivotRequest {
    pub title: &'static str,
    pub row_dim: Dimension,
    pub col_dim: Dimension,
    pub destination: Destination,
    /// Append `<label>_count` sample-size columns.
    pub with_counts: bool,
    /// Append a `Total_Estaciones` row-count column.
    pub with_row_totals: bool,
}

impl PivotRequest {
    const fn new(
        title: &'static str,
        row_dim: Dimension,
        col_dim: Dimension,
        destination: Destination,
    ) -> Self {
        PivotRequest {
            title,
            row_dim,
            col_dim,
            destination,
            with_counts: false,
            with_row_totals: false,
        }
    }

    const fn counts(mut self) -> Self {
        self.with_counts = true;
        self
    }

    const fn totals(mut self) -> Self {
        self.with_row_totals = true;
        self
    }
}

static GENERAL: [PivotRequest; 6] = [
    PivotRequest::new("Tiempo Promedio por Año y Estaciones", Year, Station, Chart),
    PivotRequest::new("KPI Promedio por País y Año", Country, Year, Export),
    PivotRequest::new("KPI Promedio por País", Country, Year, Chart),
    PivotRequest::new("KPI Promedio por Estación y País", Station, Country, Export),
    PivotRequest::new("KPI Promedio por País y Estación", Country, Station, Chart),
    PivotRequest::new("KPI Promedio por Estación y Año", Station, Year, Export),
];

static EFFICIENCY: [PivotRequest; 6] = [
    PivotRequest::new("Tiempo Promedio por Año y Estaciones", Year, Station, Chart),
    PivotRequest::new("KPI Promedio por País y Año", Country, Year, Export),
    PivotRequest::new("KPI Promedio por País y Estación", Country, Station, Chart),
    PivotRequest::new("KPI Promedio por Estación y País", Station, Country, Export).totals(),
    PivotRequest::new("Datos Resumidos", Country, Year, Table).counts(),
    PivotRequest::new("KPI Promedio por Estación y Año", Station, Year, Export).counts(),
];

impl Page {
    pub fn layout(self) -> &'static [PivotRequest] {
        match self {
            Page::General => &GENERAL,
            Page::Efficiency => &EFFICIENCY,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderedPivot {
    pub request: PivotRequest,
    pub table: PivotTable,
}

/// Everything one page shows for one filter state.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub filtered_rows: usize,
    pub summary: SummaryStats,
    pub country_means: Vec<CountryMeanRow>,
    pub productivity: Vec<ProductivityRow>,
    pub pivots: Vec<RenderedPivot>,
    pub exports: Vec<ExportFile>,
}

pub fn render(
    dataset: &[Record],
    filters: &FilterSpec,
    page: Page,
) -> Result<Dashboard, ReportError> {
    let filtered = filter_records(dataset, filters);
    info!("{} of {} records match the filters", filtered.len(), dataset.len());

    let mut pivots = Vec::new();
    let mut exports = Vec::new();
    for request in page.layout() {
        let table = build_pivot(&filtered, request);
        if request.destination == Export {
            exports.push(ExportFile::from_pivot(&table)?);
        }
        pivots.push(RenderedPivot { request: request.clone(), table });
    }

    Ok(Dashboard {
        filtered_rows: filtered.len(),
        summary: generate_summary(&filtered),
        country_means: country_means_ranked(&filtered)
            .into_iter()
            .map(|(country, avg)| CountryMeanRow { country, avg_kpi: format_opt(avg, 2) })
            .collect(),
        productivity: productivity_counts(&filtered)
            .into_iter()
            .map(|(productivity, count)| ProductivityRow { productivity, count })
            .collect(),
        pivots,
        exports,
    })
}

pub fn build_pivot(records: &[Record], request: &PivotRequest) -> PivotTable {
    let group_by = GroupBy::pair(request.row_dim, request.col_dim);
    let means = aggregate(records, group_by, Metric::MeanKpi);
    let mut table = if request.with_counts {
        let sizes = aggregate(records, group_by, Metric::SampleSize);
        pivot_with_counts(&means, &sizes, request.row_dim, request.col_dim, request.destination)
    } else {
        pivot(&means, request.row_dim, request.col_dim, request.destination)
    };
    if request.with_row_totals {
        let totals = aggregate(records, GroupBy::One(request.row_dim), Metric::Count);
        table = table.with_row_totals(TOTAL_STATIONS_LABEL, &totals);
    }
    table
}

pub fn generate_summary(records: &[Record]) -> SummaryStats {
    let count = |m| match aggregate_group(records, m) {
        AggValue::Count(n) => n,
        AggValue::Mean(_) => 0,
    };
    SummaryStats {
        avg_kpi: aggregate_group(records, Metric::MeanKpi).as_f64(),
        total_projects: count(Metric::DistinctProjects),
        total_stations: count(Metric::Count),
    }
}

/// Mean KPI per country, ascending; countries without any value go last.
pub fn country_means_ranked(records: &[Record]) -> Vec<(String, Option<f64>)> {
    let means = aggregate(records, GroupBy::One(Country), Metric::MeanKpi);
    let mut rows: Vec<(String, Option<f64>)> = means
        .entries()
        .iter()
        .filter_map(|(key, v)| match key {
            GroupKey::Single(DimValue::Text(c)) => Some((c.clone(), v.as_f64().map(round2))),
            _ => None,
        })
        .collect();
    rows.sort_by(|a, b| match (a.1, b.1) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    rows
}

/// Frequency of each productivity category, ascending; ties keep first-seen
/// order. Rows without a category are not counted.
pub fn productivity_counts(records: &[Record]) -> Vec<(String, usize)> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for p in records.iter().filter_map(|r| r.productivity.as_deref()) {
        let e = counts.entry(p).or_insert(0);
        if *e == 0 {
            order.push(p.to_string());
        }
        *e += 1;
    }
    let mut rows: Vec<(String, usize)> = order
        .into_iter()
        .map(|p| {
            let n = counts[p.as_str()];
            (p, n)
        })
        .collect();
    rows.sort_by_key(|(_, n)| *n);
    rows
}
