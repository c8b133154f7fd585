use std::collections::BTreeMap;

use bigdecimal::{BigDecimal, Zero};

use crate::derived::{mean, percentage};
use crate::model::{
    CountryStats, IssueReport, JoinedRecord, MatchStatus, ReconSummary, RowScope,
};

/// Compute summary statistics from the joined rows and issue report.
/// Cost and percentage figures cover matched rows only.
pub fn compute_summary(
    rows: &[JoinedRecord],
    shipment_count: usize,
    order_count: usize,
    issues: &IssueReport,
) -> ReconSummary {
    let mut matched = 0;
    let mut shipment_only = 0;
    let mut order_only = 0;

    for r in rows {
        match r.match_status {
            MatchStatus::Matched => matched += 1,
            MatchStatus::ShipmentOnly => shipment_only += 1,
            MatchStatus::OrderOnly => order_only += 1,
        }
    }

    let matched_rows: Vec<&JoinedRecord> = rows
        .iter()
        .filter(|r| r.match_status == MatchStatus::Matched)
        .collect();

    let match_rate_pct = percentage(
        &BigDecimal::from(matched as u64),
        &BigDecimal::from(order_count as u64),
    );

    ReconSummary {
        shipment_count,
        order_count,
        total_rows: rows.len(),
        matched,
        shipment_only,
        order_only,
        match_rate_pct,
        avg_shipping_cost_usd: mean(matched_rows.iter().filter_map(|r| r.cost_usd.as_ref())),
        avg_shipping_pct: mean(matched_rows.iter().filter_map(|r| r.shipping_pct.as_ref())),
        total_shipping_cost_usd: sum(matched_rows.iter().filter_map(|r| r.cost_usd.as_ref())),
        total_issues: issues.total(),
        issue_counts: issues.counts(),
        by_country: by_country(&matched_rows),
    }
}

fn sum<'a>(values: impl IntoIterator<Item = &'a BigDecimal>) -> BigDecimal {
    values
        .into_iter()
        .fold(BigDecimal::zero(), |acc, v| acc + v)
}

/// Per-destination breakdown, order count descending then country name.
fn by_country(matched_rows: &[&JoinedRecord]) -> Vec<CountryStats> {
    let mut groups: BTreeMap<&str, Vec<&JoinedRecord>> = BTreeMap::new();
    for r in matched_rows {
        if let Some(country) = r.destination_country.as_deref() {
            groups.entry(country).or_default().push(r);
        }
    }

    let mut stats: Vec<CountryStats> = groups
        .into_iter()
        .map(|(country, rows)| CountryStats {
            country: country.to_string(),
            order_count: rows.len(),
            avg_cost_usd: mean(rows.iter().filter_map(|r| r.cost_usd.as_ref())),
            total_cost_usd: sum(rows.iter().filter_map(|r| r.cost_usd.as_ref())),
            avg_shipping_pct: mean(rows.iter().filter_map(|r| r.shipping_pct.as_ref())),
        })
        .collect();

    // BTreeMap already yields names ascending; stable sort keeps that for ties.
    stats.sort_by(|a, b| b.order_count.cmp(&a.order_count));
    stats
}

/// The `n` matched rows with the highest shipping cost, optionally limited to
/// one destination country. Rows without a cost are skipped; ties keep join
/// order.
pub fn top_shipping_costs<'a>(
    rows: &'a [JoinedRecord],
    n: usize,
    country: Option<&str>,
) -> Vec<&'a JoinedRecord> {
    let mut candidates: Vec<&JoinedRecord> = rows
        .iter()
        .filter(|r| r.match_status == MatchStatus::Matched && r.cost_usd.is_some())
        .filter(|r| match country {
            Some(c) => r.destination_country.as_deref() == Some(c),
            None => true,
        })
        .collect();

    candidates.sort_by(|a, b| b.cost_usd.cmp(&a.cost_usd));
    candidates.truncate(n);
    candidates
}

pub fn select_rows(rows: &[JoinedRecord], scope: RowScope) -> Vec<&JoinedRecord> {
    rows.iter().filter(|r| scope.includes(r.match_status)).collect()
}
