use crate::error::ReportError;
use crate::export::ExportFile;
use crate::pivot::{Cell, PivotTable};
use crate::reports::Dashboard;
use crate::types::{CountryMeanRow, ProductivityRow, SummaryStats};
use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{builder::Builder, settings::Style, Table, Tabled};

#[derive(Debug, Serialize)]
struct SummaryFile<'a> {
    generated_at: DateTime<Utc>,
    filtered_rows: usize,
    summary: &'a SummaryStats,
    country_means: &'a [CountryMeanRow],
    productivity: &'a [ProductivityRow],
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ReportError> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn write_summary(path: &Path, dashboard: &Dashboard) -> Result<(), ReportError> {
    let file = SummaryFile {
        generated_at: Utc::now(),
        filtered_rows: dashboard.filtered_rows,
        summary: &dashboard.summary,
        country_means: &dashboard.country_means,
        productivity: &dashboard.productivity,
    };
    write_json(path, &file)
}

/// Deliver export buffers into `dir`, one file per export.
pub fn write_exports(dir: &Path, exports: &[ExportFile]) -> Result<Vec<PathBuf>, ReportError> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::new();
    for e in exports {
        let path = dir.join(&e.file_name);
        std::fs::write(&path, &e.bytes)?;
        info!("wrote {} ({} bytes)", path.display(), e.bytes.len());
        written.push(path);
    }
    Ok(written)
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

/// Markdown rendering of a pivot; empty cells print blank.
pub fn pivot_markdown(table: &PivotTable) -> String {
    let mut builder = Builder::default();
    let mut header = vec![table.row_dim.header().to_string()];
    header.extend(table.column_labels.iter().map(|c| c.to_string()));
    builder.push_record(header);
    for (label, cells) in table.row_labels.iter().zip(table.rows()) {
        let mut record = vec![label.to_string()];
        record.extend(cells.iter().map(|c| match c {
            Cell::Value(v) => format!("{:.2}", v),
            Cell::Empty => String::new(),
        }));
        builder.push_record(record);
    }
    let mut t = builder.build();
    t.with(Style::markdown());
    t.to_string()
}

pub fn preview_pivot(title: &str, table: &PivotTable) {
    println!("{}\n", title);
    if table.is_empty() {
        println!("(no rows)\n");
        return;
    }
    println!("{}\n", pivot_markdown(table));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{aggregate, GroupBy, Metric};
    use crate::filter::{FilterSpec, ALL_COUNTRIES, ALL_STATIONS};
    use crate::pivot::{pivot, Destination};
    use crate::reports::{render, Page};
    use crate::types::{Dimension, Record};

    #[test]
    fn markdown_leaves_missing_cells_blank() {
        let rs = vec![
            Record {
                country: "Argentina".into(),
                year: 2020,
                station: "Vigencia".into(),
                kpi: Some(0.0),
                productivity: None,
                stage_id: None,
            },
            Record {
                country: "Bolivia".into(),
                year: 2021,
                station: "Vigencia".into(),
                kpi: Some(1.5),
                productivity: None,
                stage_id: None,
            },
        ];
        let by = GroupBy::pair(Dimension::Country, Dimension::Year);
        let g = aggregate(&rs, by, Metric::MeanKpi);
        let table = pivot(&g, Dimension::Country, Dimension::Year, Destination::Table);
        let md = pivot_markdown(&table);
        let lines: Vec<&str> = md.lines().collect();
        let header = lines[0];
        assert!(header.contains("Pais") && header.contains("2020") && header.contains("2021"));
        let argentina = lines.iter().find(|l| l.contains("Argentina")).unwrap();
        assert!(argentina.contains("0.00"));
        assert!(!argentina.contains("NaN"));
        let bolivia = lines.iter().find(|l| l.contains("Bolivia")).unwrap();
        assert!(bolivia.contains("1.50"));
        assert!(!bolivia.contains("0.00"));
    }

    #[test]
    fn exports_are_written_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let exports = vec![ExportFile {
            file_name: "kpi_promedio_por_pais_y_año.xlsx".into(),
            mime: crate::export::XLSX_MIME,
            bytes: vec![1, 2, 3],
        }];
        let written = write_exports(dir.path(), &exports).unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(std::fs::read(&written[0]).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn summary_json_carries_dashboard_metrics() {
        let rs = vec![
            Record {
                country: "Paraguay".into(),
                year: 2022,
                station: "Vigencia".into(),
                kpi: Some(2.0),
                productivity: Some("Eficiente".into()),
                stage_id: Some("PY-1".into()),
            },
            Record {
                country: "Paraguay".into(),
                year: 2022,
                station: "Aprobación".into(),
                kpi: Some(4.0),
                productivity: Some("Lento".into()),
                stage_id: Some("PY-1".into()),
            },
        ];
        let spec =
            FilterSpec::from_selection((2022, 2022), ALL_STATIONS, &[ALL_COUNTRIES]).unwrap();
        let dashboard = render(&rs, &spec, Page::General).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        write_summary(&path, &dashboard).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["filtered_rows"], 2);
        assert_eq!(json["summary"]["avg_kpi"], 3.0);
        assert_eq!(json["summary"]["total_projects"], 1);
        assert_eq!(json["summary"]["total_stations"], 2);
        assert_eq!(json["country_means"][0]["Pais"], "Paraguay");
        assert_eq!(json["productivity"].as_array().map(|a| a.len()), Some(2));
        assert!(json["generated_at"].is_string());
    }
}
