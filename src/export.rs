// Export serializer: writes a finished pivot as a one-sheet xlsx workbook.
use crate::error::ReportError;
use crate::pivot::{Cell, ColumnLabel, PivotTable};
use crate::types::{DimValue, Dimension};
use rust_xlsxwriter::{Format, Workbook, Worksheet};

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const SHEET_NAME: &str = "Sheet1";

/// A finished download: file name, MIME type and workbook bytes.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl ExportFile {
    pub fn from_pivot(table: &PivotTable) -> Result<Self, ReportError> {
        Ok(ExportFile {
            file_name: export_file_name(table.row_dim, table.col_dim),
            mime: XLSX_MIME,
            bytes: serialize(table)?,
        })
    }
}

/// Fixed download name for a dimension pairing, e.g.
/// `kpi_promedio_por_estacion_y_pais.xlsx`.
pub fn export_file_name(row_dim: Dimension, col_dim: Dimension) -> String {
    format!("kpi_promedio_por_{}_y_{}.xlsx", slug(row_dim), slug(col_dim))
}

fn slug(dim: Dimension) -> &'static str {
    match dim {
        Dimension::Country => "pais",
        Dimension::Station => "estacion",
        Dimension::Year => "año",
    }
}

/// Serialize `table` verbatim: the index column holds the row labels, the
/// header row holds the column labels, empty cells stay blank. Year labels
/// are written as integer-formatted numbers.
pub fn serialize(table: &PivotTable) -> Result<Vec<u8>, ReportError> {
    let mut xlsx = Workbook::new();
    let header = Format::new().set_bold();
    let year_header = Format::new().set_bold().set_num_format("0");
    let year_label = Format::new().set_num_format("0");

    let worksheet = xlsx.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;
    worksheet.write_string_with_format(0, 0, table.row_dim.header(), &header)?;

    for (c, label) in table.column_labels.iter().enumerate() {
        let col = (c + 1) as u16;
        match label {
            ColumnLabel::Value(DimValue::Year(y)) => {
                worksheet.write_number_with_format(0, col, *y as f64, &year_header)?;
            }
            other => {
                worksheet.write_string_with_format(0, col, other.to_string(), &header)?;
            }
        }
    }

    for (r, (label, cells)) in table.row_labels.iter().zip(table.rows()).enumerate() {
        let row = (r + 1) as u32;
        write_label(worksheet, row, label, &year_label)?;
        for (c, cell) in cells.iter().enumerate() {
            if let Cell::Value(v) = cell {
                worksheet.write_number(row, (c + 1) as u16, *v)?;
            }
        }
    }

    Ok(xlsx.save_to_buffer()?)
}

fn write_label(
    worksheet: &mut Worksheet,
    row: u32,
    label: &DimValue,
    year_format: &Format,
) -> Result<(), ReportError> {
    match label {
        DimValue::Year(y) => worksheet.write_number_with_format(row, 0, *y as f64, year_format)?,
        DimValue::Text(s) => worksheet.write_string(row, 0, s)?,
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_reflect_dimension_pairing() {
        assert_eq!(
            export_file_name(Dimension::Station, Dimension::Country),
            "kpi_promedio_por_estacion_y_pais.xlsx"
        );
        assert_eq!(
            export_file_name(Dimension::Country, Dimension::Year),
            "kpi_promedio_por_pais_y_año.xlsx"
        );
        assert_eq!(
            export_file_name(Dimension::Station, Dimension::Year),
            "kpi_promedio_por_estacion_y_año.xlsx"
        );
    }
}
