use serde::{Deserialize, Serialize};
use std::fmt;
use tabled::Tabled;

pub const COL_COUNTRY: &str = "Pais";
pub const COL_YEAR: &str = "AÑO";
pub const COL_STATION: &str = "Tipo_KPI";
pub const COL_KPI: &str = "KPI";
pub const COL_PRODUCTIVITY: &str = "Productividad";
pub const COL_STAGE_ID: &str = "IDEtapa";

pub const REQUIRED_COLUMNS: [&str; 6] = [
    COL_COUNTRY,
    COL_YEAR,
    COL_STATION,
    COL_KPI,
    COL_PRODUCTIVITY,
    COL_STAGE_ID,
];

/// One CSV row exactly as the source sheet publishes it. Every field is kept
/// as text so coercion failures can be counted instead of aborting the load.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Pais")]
    pub country: Option<String>,
    #[serde(rename = "AÑO")]
    pub year: Option<String>,
    #[serde(rename = "Tipo_KPI")]
    pub station: Option<String>,
    #[serde(rename = "KPI")]
    pub kpi: Option<String>,
    #[serde(rename = "Productividad")]
    pub productivity: Option<String>,
    #[serde(rename = "IDEtapa")]
    pub stage_id: Option<String>,
}

/// A milestone observation after ingestion. Immutable for the session.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub country: String,
    pub year: i32,
    pub station: String,
    /// Elapsed months. `None` is "no value", never zero.
    pub kpi: Option<f64>,
    pub productivity: Option<String>,
    /// Equal ids always denote the same project.
    pub stage_id: Option<String>,
}

impl Record {
    pub fn value(&self, dim: Dimension) -> DimValue {
        match dim {
            Dimension::Country => DimValue::Text(self.country.clone()),
            Dimension::Station => DimValue::Text(self.station.clone()),
            Dimension::Year => DimValue::Year(self.year),
        }
    }
}

/// Grouping dimensions. The declaration order is the canonical order used
/// for composite keys: country, then station, then year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Dimension {
    Country,
    Station,
    Year,
}

impl Dimension {
    /// Column name of the dimension in the source sheet, reused as the index
    /// header of exported pivots.
    pub fn header(self) -> &'static str {
        match self {
            Dimension::Country => COL_COUNTRY,
            Dimension::Station => COL_STATION,
            Dimension::Year => COL_YEAR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum DimValue {
    Text(String),
    Year(i32),
}

impl fmt::Display for DimValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimValue::Text(s) => f.write_str(s),
            DimValue::Year(y) => write!(f, "{}", y),
        }
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CountryMeanRow {
    #[serde(rename = "Pais")]
    #[tabled(rename = "Pais")]
    pub country: String,
    #[serde(rename = "AvgKPI")]
    #[tabled(rename = "AvgKPI")]
    pub avg_kpi: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ProductivityRow {
    #[serde(rename = "Productividad")]
    #[tabled(rename = "Productividad")]
    pub productivity: String,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: usize,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SummaryStats {
    /// Mean KPI over the filtered set; `None` when no row carries a value.
    pub avg_kpi: Option<f64>,
    pub total_projects: usize,
    pub total_stations: usize,
}
