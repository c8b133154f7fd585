//! Joined-row export in the column layout the finance team reads.

use std::path::Path;

use bigdecimal::{BigDecimal, ToPrimitive};
use shipcost_recon::JoinedRecord;

use crate::error::IoError;
use crate::xlsx::XlsxCell;
use crate::{extension_of, TableFormat};

pub const EXPORT_COLUMNS: [&str; 11] = [
    "Order",
    "Tracking",
    "Order Date",
    "Country",
    "Net Payout (USD)",
    "Product Cost (USD)",
    "Shipping Cost (USD)",
    "Shipping Cost (RMB)",
    "Shipping %",
    "Profit (USD)",
    "Weight (kg)",
];

enum Value<'a> {
    Text(Option<String>),
    Decimal(Option<&'a BigDecimal>),
}

fn values(r: &JoinedRecord) -> [Value<'_>; 11] {
    [
        Value::Text(r.order_id.clone()),
        Value::Text(r.tracking_key.clone()),
        Value::Text(r.order_date.map(|d| d.format("%Y-%m-%d").to_string())),
        Value::Text(r.destination_country.clone()),
        Value::Decimal(r.net_payout_usd.as_ref()),
        Value::Decimal(r.product_cost_usd.as_ref()),
        Value::Decimal(r.cost_usd.as_ref()),
        Value::Decimal(r.cost_origin_currency.as_ref()),
        Value::Decimal(r.shipping_pct.as_ref()),
        Value::Decimal(r.profit.as_ref()),
        Value::Decimal(r.weight_kg.as_ref()),
    ]
}

/// Export rows to `path`; the format follows the extension
/// (`csv`, `tsv`, `txt`, `xlsx`). Returns the number of rows written.
pub fn export_rows(rows: &[&JoinedRecord], path: &Path) -> Result<usize, IoError> {
    match TableFormat::from_path(path)? {
        TableFormat::Delimited(delimiter) => export_csv(rows, path, delimiter)?,
        TableFormat::Spreadsheet if extension_of(path) == "xlsx" => export_xlsx(rows, path)?,
        TableFormat::Spreadsheet => {
            return Err(IoError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension: extension_of(path),
            })
        }
    }
    log::info!("exported {} row(s) to {}", rows.len(), path.display());
    Ok(rows.len())
}

pub fn export_csv(rows: &[&JoinedRecord], path: &Path, delimiter: u8) -> Result<(), IoError> {
    let records: Vec<Vec<Option<String>>> = rows
        .iter()
        .map(|r| {
            values(r)
                .into_iter()
                .map(|v| match v {
                    Value::Text(t) => t,
                    Value::Decimal(d) => d.map(plain_decimal),
                })
                .collect()
        })
        .collect();
    crate::csv::export(path, &EXPORT_COLUMNS, &records, delimiter)
}

/// Positional decimal text without trailing fractional zeros
/// (`13.900` -> `13.9`). Never uses exponent notation.
fn plain_decimal(d: &BigDecimal) -> String {
    d.normalized().to_plain_string()
}

pub fn export_xlsx(rows: &[&JoinedRecord], path: &Path) -> Result<(), IoError> {
    let cells: Vec<Vec<XlsxCell>> = rows
        .iter()
        .map(|r| {
            values(r)
                .into_iter()
                .map(|v| match v {
                    Value::Text(Some(t)) => XlsxCell::Text(t),
                    Value::Decimal(Some(d)) => match d.to_f64() {
                        Some(n) => XlsxCell::Number(n),
                        None => XlsxCell::Text(d.to_string()),
                    },
                    Value::Text(None) | Value::Decimal(None) => XlsxCell::Empty,
                })
                .collect()
        })
        .collect();
    crate::xlsx::export(path, "Shipping Costs", &EXPORT_COLUMNS, &cells)
}
