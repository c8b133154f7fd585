use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error in {}: {source}", .path.display())]
    Csv { path: PathBuf, source: csv::Error },

    #[error("failed to open spreadsheet {}: {message}", .path.display())]
    Spreadsheet { path: PathBuf, message: String },

    #[error("{} has no header row", .path.display())]
    EmptySheet { path: PathBuf },

    #[error("unsupported file type '{extension}' for {} (expected csv, tsv, txt, xlsx, xlsm, xls, xlsb or ods)", .path.display())]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("cannot write {}: {message}", .path.display())]
    Write { path: PathBuf, message: String },

    #[error("XLSX export to {} failed: {source}", .path.display())]
    Xlsx {
        path: PathBuf,
        source: rust_xlsxwriter::XlsxError,
    },
}
