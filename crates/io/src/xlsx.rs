// Spreadsheet import (xlsx, xlsm, xls, xlsb, ods) and XLSX export

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use chrono::{Days, Duration, NaiveDate};
use rust_xlsxwriter::{Format, Workbook};
use shipcost_recon::RawTable;

use crate::error::IoError;

/// Import the first worksheet. Its first row is taken as the header row.
pub fn import(path: &Path, name: &str) -> Result<RawTable, IoError> {
    let mut workbook: Sheets<_> = open_workbook_auto(path).map_err(|e| IoError::Spreadsheet {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| IoError::EmptySheet {
            path: path.to_path_buf(),
        })?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| IoError::Spreadsheet {
            path: path.to_path_buf(),
            message: format!("failed to read sheet '{sheet_name}': {e}"),
        })?;

    let mut rows = range.rows();
    let header_row = rows.next().ok_or_else(|| IoError::EmptySheet {
        path: path.to_path_buf(),
    })?;
    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| cell_text(cell).map(|s| s.trim().to_string()).unwrap_or_default())
        .collect();

    let mut table = RawTable::new(name, headers);
    for (row_idx, row) in rows.enumerate() {
        let cells: Vec<Option<String>> = row
            .iter()
            .enumerate()
            .map(|(col_idx, cell)| {
                if let Data::Error(e) = cell {
                    // +2: one for the header row, one for 1-based numbering
                    log::warn!(
                        "{}: error cell {e:?} at row {} column {}, treating as null",
                        path.display(),
                        row_idx + 2,
                        col_idx + 1
                    );
                }
                cell_text(cell)
            })
            .collect();
        if cells.iter().all(Option::is_none) {
            continue;
        }
        table.push_row(cells);
    }

    log::debug!(
        "{}: sheet '{sheet_name}', {} column(s), {} row(s)",
        path.display(),
        table.headers.len(),
        table.len()
    );
    Ok(table)
}

/// Text form of a cell as the normalizer expects it.
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Data::Float(n) => {
            // Integers without decimals so numeric tracking numbers survive
            if n.fract() == 0.0 && n.abs() < 1e15 {
                Some(format!("{}", *n as i64))
            } else {
                Some(format!("{}", n))
            }
        }
        Data::Int(n) => Some(n.to_string()),
        Data::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        // Assumes the 1900 date system
        Data::DateTime(dt) => Some(serial_to_text(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
    }
}

/// Render a spreadsheet serial as `YYYY-MM-DD`, or `YYYY-MM-DD HH:MM:SS`
/// when it carries a time part.
fn serial_to_text(serial: f64) -> String {
    let days = serial.floor();
    let seconds = ((serial - days) * 86_400.0).round() as i64;
    let date = NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|epoch| epoch.checked_add_days(Days::new(days.max(0.0) as u64)));

    match date {
        Some(date) if seconds == 0 => date.format("%Y-%m-%d").to_string(),
        Some(date) => {
            let dt = date.and_time(chrono::NaiveTime::MIN) + Duration::seconds(seconds);
            dt.format("%Y-%m-%d %H:%M:%S").to_string()
        }
        None => format!("{}", serial),
    }
}

/// A typed cell for XLSX export.
#[derive(Debug, Clone, PartialEq)]
pub enum XlsxCell {
    Empty,
    Text(String),
    Number(f64),
}

/// Write one worksheet: a bold, frozen header row followed by the data rows.
pub fn export(
    path: &Path,
    sheet_name: &str,
    headers: &[&str],
    rows: &[Vec<XlsxCell>],
) -> Result<(), IoError> {
    let xlsx_err = |source| IoError::Xlsx {
        path: path.to_path_buf(),
        source,
    };

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet().set_name(sheet_name).map_err(xlsx_err)?;

    let header_format = Format::new().set_bold();
    for (col, header) in headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *header, &header_format)
            .map_err(xlsx_err)?;
        worksheet
            .set_column_width(col as u16, (header.chars().count() + 2).max(10) as f64)
            .map_err(xlsx_err)?;
    }
    worksheet.set_freeze_panes(1, 0).map_err(xlsx_err)?;

    for (row_idx, row) in rows.iter().enumerate() {
        let row32 = (row_idx + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let col16 = col as u16;
            match cell {
                XlsxCell::Empty => {}
                XlsxCell::Text(s) => {
                    worksheet.write_string(row32, col16, s).map_err(xlsx_err)?;
                }
                XlsxCell::Number(n) => {
                    worksheet.write_number(row32, col16, *n).map_err(xlsx_err)?;
                }
            }
        }
    }

    workbook.save(path).map_err(xlsx_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_to_text() {
        assert_eq!(serial_to_text(46037.0), "2026-01-15");
        assert_eq!(serial_to_text(46037.5), "2026-01-15 12:00:00");
        assert_eq!(serial_to_text(1.0), "1899-12-31");
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Data::Empty), None);
        assert_eq!(cell_text(&Data::String("  ".into())), None);
        assert_eq!(cell_text(&Data::String("4PX001".into())), Some("4PX001".into()));
        assert_eq!(cell_text(&Data::String(" 美国 ".into())), Some("美国".into()));
        assert_eq!(cell_text(&Data::Float(100.0)), Some("100".into()));
        assert_eq!(cell_text(&Data::Float(13.9)), Some("13.9".into()));
        assert_eq!(cell_text(&Data::Int(7)), Some("7".into()));
        assert_eq!(cell_text(&Data::Bool(true)), Some("TRUE".into()));
    }

    #[test]
    fn test_export_then_import() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("orders.xlsx");

        let rows = vec![
            vec![
                XlsxCell::Text("O1".into()),
                XlsxCell::Text("4PX001".into()),
                XlsxCell::Number(50.0),
            ],
            vec![XlsxCell::Text("O2".into()), XlsxCell::Empty, XlsxCell::Number(12.5)],
        ];
        export(&path, "Orders", &["Order", "Tracking number", "Net payout"], &rows).unwrap();
        assert!(path.exists());

        let table = import(&path, "orders").unwrap();
        assert_eq!(table.name, "orders");
        assert_eq!(table.headers, vec!["Order", "Tracking number", "Net payout"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, 1), Some("4PX001"));
        assert_eq!(table.cell(0, 2), Some("50"));
        assert_eq!(table.cell(1, 1), None);
        assert_eq!(table.cell(1, 2), Some("12.5"));
    }

    #[test]
    fn test_import_missing_file() {
        let err = import(Path::new("/nonexistent/book.xlsx"), "orders").unwrap_err();
        assert!(matches!(err, IoError::Spreadsheet { .. }));
    }
}
