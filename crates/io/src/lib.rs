// File I/O operations

pub mod csv;
pub mod error;
pub mod export;
pub mod xlsx;

use std::path::Path;

use shipcost_recon::RawTable;

pub use error::IoError;
pub use export::{export_rows, EXPORT_COLUMNS};

/// File layout chosen from the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    /// Delimited text. The byte is the delimiter used when writing;
    /// reading sniffs it.
    Delimited(u8),
    Spreadsheet,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Result<Self, IoError> {
        match extension_of(path).as_str() {
            "csv" | "txt" => Ok(Self::Delimited(b',')),
            "tsv" => Ok(Self::Delimited(b'\t')),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(Self::Spreadsheet),
            other => Err(IoError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension: other.to_string(),
            }),
        }
    }
}

pub(crate) fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Read a shipment or order export into a raw table named `name`.
pub fn read_table(path: &Path, name: &str) -> Result<RawTable, IoError> {
    let table = match TableFormat::from_path(path)? {
        TableFormat::Delimited(_) => self::csv::import(path, name)?,
        TableFormat::Spreadsheet => self::xlsx::import(path, name)?,
    };
    log::info!(
        "read {} row(s) from {} ({name})",
        table.len(),
        path.display()
    );
    Ok(table)
}
