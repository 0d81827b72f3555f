use crate::error::ReportError;
use crate::types::{RawRow, Record, REQUIRED_COLUMNS};
use crate::util::{parse_f64_safe, parse_year};
use csv::{ReaderBuilder, Trim};
use log::{info, warn};
use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
    pub missing_year: usize,
}

pub fn load_and_clean<P: AsRef<Path>>(path: P) -> Result<(Vec<Record>, LoadReport), ReportError> {
    let path = path.as_ref();
    info!("loading dataset from {}", path.display());
    load_from_reader(File::open(path)?)
}

/// Parse the published sheet into records. Rows whose year is not numeric
/// are dropped here so every record downstream carries a usable year.
pub fn load_from_reader<R: Read>(reader: R) -> Result<(Vec<Record>, LoadReport), ReportError> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    for col in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == col) {
            return Err(ReportError::MissingColumn(col.to_string()));
        }
    }

    let mut report = LoadReport::default();
    let mut records = Vec::new();

    for result in rdr.deserialize::<RawRow>() {
        report.total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("row {}: {}", report.total_rows, e);
                report.parse_errors += 1;
                continue;
            }
        };

        let year = match parse_year(row.year.as_deref()) {
            Some(y) => y,
            None => {
                report.missing_year += 1;
                continue;
            }
        };

        records.push(Record {
            country: category_or_unknown(row.country),
            year,
            station: category_or_unknown(row.station),
            kpi: parse_f64_safe(row.kpi.as_deref()),
            productivity: non_empty(row.productivity),
            stage_id: non_empty(row.stage_id),
        });
    }

    report.loaded_rows = records.len();
    if report.missing_year > 0 {
        warn!("{} rows dropped without a numeric year", report.missing_year);
    }
    info!(
        "loaded {} of {} rows ({} parse errors)",
        report.loaded_rows, report.total_rows, report.parse_errors
    );
    Ok((records, report))
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn category_or_unknown(v: Option<String>) -> String {
    non_empty(v).unwrap_or_else(|| "Unknown".to_string())
}
