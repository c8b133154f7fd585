use std::collections::BTreeMap;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One input batch as delivered by an adapter: ordered headers plus ordered
/// rows of nullable cells aligned with the headers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// Which input this is (`shipments` / `orders`), used in error messages.
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows: Vec::new(),
        }
    }

    /// Append a row, padding short rows with nulls and dropping cells beyond
    /// the header width.
    pub fn push_row(&mut self, mut cells: Vec<Option<String>>) {
        cells.resize(self.headers.len(), None);
        self.rows.push(cells);
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col)?.as_deref()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Canonical records
// ---------------------------------------------------------------------------

/// One line of carrier billing after normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShipmentRecord {
    pub tracking_key: Option<String>,
    pub cost_origin_currency: Option<BigDecimal>,
    /// `cost_origin_currency * exchange_rate`, exact.
    pub cost_usd: Option<BigDecimal>,
    pub weight_kg: Option<BigDecimal>,
    pub ship_date: Option<NaiveDate>,
    pub origin_country_label: Option<String>,
    pub country_canonical: Option<String>,
    pub external_order_ref: Option<String>,
}

/// One line of the sales-channel export after normalization.
/// `order_id` is not unique: split shipments repeat it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRecord {
    pub order_id: Option<String>,
    pub tracking_key: Option<String>,
    pub order_date: Option<NaiveDate>,
    pub net_payout_usd: Option<BigDecimal>,
    pub product_cost_usd: Option<BigDecimal>,
    pub destination_country: Option<String>,
}

// ---------------------------------------------------------------------------
// Join output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Matched,
    ShipmentOnly,
    OrderOnly,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Matched => write!(f, "matched"),
            Self::ShipmentOnly => write!(f, "shipment_only"),
            Self::OrderOnly => write!(f, "order_only"),
        }
    }
}

/// One row of the full outer join of orders and shipments on tracking key.
/// Fields from the side that did not contribute are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinedRecord {
    pub tracking_key: Option<String>,
    pub match_status: MatchStatus,

    // Order side
    pub order_id: Option<String>,
    pub order_date: Option<NaiveDate>,
    pub net_payout_usd: Option<BigDecimal>,
    pub product_cost_usd: Option<BigDecimal>,
    pub destination_country: Option<String>,

    // Shipment side
    pub cost_origin_currency: Option<BigDecimal>,
    pub cost_usd: Option<BigDecimal>,
    pub weight_kg: Option<BigDecimal>,
    pub ship_date: Option<NaiveDate>,
    pub origin_country_label: Option<String>,
    pub country_canonical: Option<String>,
    pub external_order_ref: Option<String>,

    // Derived
    pub shipping_pct: Option<BigDecimal>,
    pub profit: Option<BigDecimal>,
}

/// Which joined rows a caller wants to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowScope {
    #[default]
    Matched,
    Unmatched,
    All,
}

impl RowScope {
    pub fn includes(&self, status: MatchStatus) -> bool {
        match self {
            Self::Matched => status == MatchStatus::Matched,
            Self::Unmatched => status != MatchStatus::Matched,
            Self::All => true,
        }
    }
}

impl std::str::FromStr for RowScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "matched" => Ok(Self::Matched),
            "unmatched" => Ok(Self::Unmatched),
            "all" => Ok(Self::All),
            other => Err(format!("unknown row scope '{other}' (expected matched, unmatched or all)")),
        }
    }
}

// ---------------------------------------------------------------------------
// Issues
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    UnmatchedShipments,
    UnmatchedOrders,
    MultiTracking,
    CountryMismatch,
}

impl IssueCategory {
    pub const ALL: [IssueCategory; 4] = [
        Self::UnmatchedShipments,
        Self::UnmatchedOrders,
        Self::MultiTracking,
        Self::CountryMismatch,
    ];
}

impl std::fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnmatchedShipments => write!(f, "unmatched_shipments"),
            Self::UnmatchedOrders => write!(f, "unmatched_orders"),
            Self::MultiTracking => write!(f, "multi_tracking"),
            Self::CountryMismatch => write!(f, "country_mismatch"),
        }
    }
}

/// An order id that appears on more than one order row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiTrackingGroup {
    pub order_id: String,
    /// Number of order rows carrying this id.
    pub count: usize,
    /// Distinct non-null tracking keys, in source order.
    pub trackings: Vec<String>,
    /// Payout of the first row in source order (not summed).
    pub net_payout_usd: Option<BigDecimal>,
}

/// Four independent views over the join result. A row may appear in more
/// than one category and is counted once per category.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IssueReport {
    pub unmatched_shipments: Vec<JoinedRecord>,
    pub unmatched_orders: Vec<JoinedRecord>,
    pub multi_tracking: Vec<MultiTrackingGroup>,
    pub country_mismatch: Vec<JoinedRecord>,
}

impl IssueReport {
    pub fn count(&self, category: IssueCategory) -> usize {
        match category {
            IssueCategory::UnmatchedShipments => self.unmatched_shipments.len(),
            IssueCategory::UnmatchedOrders => self.unmatched_orders.len(),
            IssueCategory::MultiTracking => self.multi_tracking.len(),
            IssueCategory::CountryMismatch => self.country_mismatch.len(),
        }
    }

    pub fn total(&self) -> usize {
        IssueCategory::ALL.iter().map(|c| self.count(*c)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn counts(&self) -> BTreeMap<String, usize> {
        IssueCategory::ALL
            .iter()
            .map(|c| (c.to_string(), self.count(*c)))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryStats {
    pub country: String,
    pub order_count: usize,
    pub avg_cost_usd: Option<BigDecimal>,
    pub total_cost_usd: BigDecimal,
    pub avg_shipping_pct: Option<BigDecimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconSummary {
    pub shipment_count: usize,
    pub order_count: usize,
    pub total_rows: usize,
    pub matched: usize,
    pub shipment_only: usize,
    pub order_only: usize,
    /// Matched rows as a percentage of order rows.
    pub match_rate_pct: Option<BigDecimal>,
    pub avg_shipping_cost_usd: Option<BigDecimal>,
    pub avg_shipping_pct: Option<BigDecimal>,
    pub total_shipping_cost_usd: BigDecimal,
    pub total_issues: usize,
    pub issue_counts: BTreeMap<String, usize>,
    pub by_country: Vec<CountryStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub rows: Vec<JoinedRecord>,
    pub issues: IssueReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub engine_version: String,
    pub exchange_rate: BigDecimal,
    pub carrier_pattern: String,
    pub run_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_scope_filters_by_status() {
        assert!(RowScope::Matched.includes(MatchStatus::Matched));
        assert!(!RowScope::Matched.includes(MatchStatus::OrderOnly));
        assert!(RowScope::Unmatched.includes(MatchStatus::ShipmentOnly));
        assert!(!RowScope::Unmatched.includes(MatchStatus::Matched));
        assert!(RowScope::All.includes(MatchStatus::OrderOnly));
    }

    #[test]
    fn row_scope_parses() {
        assert_eq!("all".parse::<RowScope>(), Ok(RowScope::All));
        assert_eq!("unmatched".parse::<RowScope>(), Ok(RowScope::Unmatched));
        assert!("some".parse::<RowScope>().is_err());
    }

    #[test]
    fn empty_issue_report() {
        let report = IssueReport::default();
        assert!(report.is_empty());
        assert_eq!(report.total(), 0);
        assert_eq!(report.counts().len(), 4);
    }
}
