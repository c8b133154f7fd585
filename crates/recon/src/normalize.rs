//! Raw tables → canonical shipment and order records.
//!
//! Column names are resolved through the configured alias lists. Only a
//! missing *required* column is an error; every cell-level problem becomes a
//! null in the canonical record.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Days, NaiveDate, NaiveDateTime};

use crate::config::{ColumnConfig, ReconConfig};
use crate::country::CountryTable;
use crate::error::ReconError;
use crate::model::{OrderRecord, RawTable, ShipmentRecord};

/// Converts raw input tables into canonical records.
///
/// The exchange rate and country table are fixed at construction and never
/// change during a run.
#[derive(Debug, Clone)]
pub struct Normalizer {
    exchange_rate: BigDecimal,
    countries: CountryTable,
    columns: ColumnConfig,
}

impl Normalizer {
    pub fn new(exchange_rate: BigDecimal, countries: CountryTable) -> Self {
        Self {
            exchange_rate,
            countries,
            columns: ColumnConfig::default(),
        }
    }

    pub fn from_config(config: &ReconConfig) -> Self {
        Self {
            exchange_rate: config.exchange_rate.clone(),
            countries: config.country_table(),
            columns: config.columns.clone(),
        }
    }

    pub fn exchange_rate(&self) -> &BigDecimal {
        &self.exchange_rate
    }

    /// Normalize both inputs. Fails on the first input with a missing
    /// required column (shipments are checked first).
    pub fn normalize(
        &self,
        shipments: &RawTable,
        orders: &RawTable,
    ) -> Result<(Vec<ShipmentRecord>, Vec<OrderRecord>), ReconError> {
        Ok((self.normalize_shipments(shipments)?, self.normalize_orders(orders)?))
    }

    pub fn normalize_shipments(&self, raw: &RawTable) -> Result<Vec<ShipmentRecord>, ReconError> {
        let cols = &self.columns.shipment;

        let tracking_idx = required_column(raw, "tracking_key", &cols.tracking_key)?;
        let cost_idx = required_column(raw, "cost_origin_currency", &cols.cost_origin_currency)?;
        let date_idx = optional_column(raw, "ship_date", &cols.ship_date);
        let country_idx = optional_column(raw, "origin_country_label", &cols.origin_country_label);
        let weight_idx = optional_column(raw, "weight_kg", &cols.weight_kg);
        let ref_idx = optional_column(raw, "external_order_ref", &cols.external_order_ref);

        let mut records = Vec::with_capacity(raw.len());
        for row in 0..raw.len() {
            let cost_origin_currency = decimal_cell(raw, row, Some(cost_idx), "cost_origin_currency");
            let cost_usd = cost_origin_currency
                .as_ref()
                .map(|cost| cost * &self.exchange_rate);
            let origin_country_label = text_cell(raw, row, country_idx);
            let country_canonical = origin_country_label
                .as_deref()
                .map(|label| self.countries.translate(label));

            records.push(ShipmentRecord {
                tracking_key: text_cell(raw, row, Some(tracking_idx)),
                cost_origin_currency,
                cost_usd,
                weight_kg: decimal_cell(raw, row, weight_idx, "weight_kg"),
                ship_date: date_cell(raw, row, date_idx, "ship_date"),
                origin_country_label,
                country_canonical,
                external_order_ref: text_cell(raw, row, ref_idx),
            });
        }

        log::debug!("normalized {} shipment row(s)", records.len());
        Ok(records)
    }

    pub fn normalize_orders(&self, raw: &RawTable) -> Result<Vec<OrderRecord>, ReconError> {
        let cols = &self.columns.order;

        let tracking_idx = required_column(raw, "tracking_key", &cols.tracking_key)?;
        let payout_idx = required_column(raw, "net_payout_usd", &cols.net_payout_usd)?;
        let order_idx = optional_column(raw, "order_id", &cols.order_id);
        let date_idx = optional_column(raw, "order_date", &cols.order_date);
        let country_idx = optional_column(raw, "destination_country", &cols.destination_country);
        let cost_idx = optional_column(raw, "product_cost_usd", &cols.product_cost_usd);

        let mut records = Vec::with_capacity(raw.len());
        for row in 0..raw.len() {
            records.push(OrderRecord {
                order_id: text_cell(raw, row, order_idx),
                tracking_key: text_cell(raw, row, Some(tracking_idx)),
                order_date: date_cell(raw, row, date_idx, "order_date"),
                net_payout_usd: decimal_cell(raw, row, Some(payout_idx), "net_payout_usd"),
                product_cost_usd: decimal_cell(raw, row, cost_idx, "product_cost_usd"),
                destination_country: text_cell(raw, row, country_idx),
            });
        }

        log::debug!("normalized {} order row(s)", records.len());
        Ok(records)
    }
}

// ---------------------------------------------------------------------------
// Column resolution
// ---------------------------------------------------------------------------

fn optional_column(raw: &RawTable, field: &str, aliases: &[String]) -> Option<usize> {
    let found = aliases
        .iter()
        .find_map(|alias| raw.column_index(alias).map(|idx| (alias, idx)));
    match found {
        Some((alias, idx)) => {
            log::debug!("{}: {field} <- '{alias}'", raw.name);
            Some(idx)
        }
        None => None,
    }
}

fn required_column(raw: &RawTable, field: &str, aliases: &[String]) -> Result<usize, ReconError> {
    optional_column(raw, field, aliases).ok_or_else(|| ReconError::MissingColumn {
        input: raw.name.clone(),
        field: field.into(),
        candidates: aliases.to_vec(),
    })
}

// ---------------------------------------------------------------------------
// Cell parsing
// ---------------------------------------------------------------------------

fn text_cell(raw: &RawTable, row: usize, col: Option<usize>) -> Option<String> {
    let value = raw.cell(row, col?)?.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn decimal_cell(raw: &RawTable, row: usize, col: Option<usize>, field: &str) -> Option<BigDecimal> {
    let value = raw.cell(row, col?)?;
    if value.trim().is_empty() {
        return None;
    }
    let parsed = parse_decimal(value);
    if parsed.is_none() {
        log::warn!("{} row {}: cannot parse {field} '{value}', treating as null", raw.name, row + 1);
    }
    parsed
}

fn date_cell(raw: &RawTable, row: usize, col: Option<usize>, field: &str) -> Option<NaiveDate> {
    let value = raw.cell(row, col?)?;
    if value.trim().is_empty() {
        return None;
    }
    let parsed = parse_date(value);
    if parsed.is_none() {
        log::debug!("{} row {}: cannot parse {field} '{value}', treating as null", raw.name, row + 1);
    }
    parsed
}

/// Parse a decimal amount, tolerating a currency sign and thousands separators.
pub fn parse_decimal(text: &str) -> Option<BigDecimal> {
    let trimmed = text.trim();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, trimmed),
    };
    let rest = rest.trim_start_matches(&['$', '¥', '￥'][..]).trim();
    let cleaned: String = rest.chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() || cleaned.starts_with('-') {
        return None;
    }
    let value = BigDecimal::from_str(&cleaned).ok()?;
    Some(if negative { -value } else { value })
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Largest serial Excel accepts (9999-12-31).
const MAX_SERIAL: f64 = 2_958_465.0;

/// Parse a calendar date from the formats the two ledgers use, including
/// bare spreadsheet serial numbers (1900 date system).
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let t = text.trim();

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(t, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(t, fmt) {
            return Some(dt.date());
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(t) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_str(t, "%Y-%m-%d %H:%M:%S %z") {
        return Some(dt.date_naive());
    }

    let serial: f64 = t.parse().ok()?;
    if !(1.0..=MAX_SERIAL).contains(&serial) {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(serial.floor() as u64))
}
