use std::collections::HashMap;

use crate::model::{IssueReport, JoinedRecord, MatchStatus, MultiTrackingGroup, OrderRecord};

/// Run all four detectors. Each is independent; a row may land in several.
pub fn classify_issues(
    rows: &[JoinedRecord],
    orders: &[OrderRecord],
    carrier_pattern: &str,
) -> IssueReport {
    IssueReport {
        unmatched_shipments: unmatched_shipments(rows),
        unmatched_orders: unmatched_orders(rows, carrier_pattern),
        multi_tracking: multi_tracking(orders),
        country_mismatch: country_mismatch(rows),
    }
}

/// Shipments billed by the carrier with no order carrying their tracking key.
pub fn unmatched_shipments(rows: &[JoinedRecord]) -> Vec<JoinedRecord> {
    rows.iter()
        .filter(|r| r.match_status == MatchStatus::ShipmentOnly)
        .cloned()
        .collect()
}

/// Orders handed to the audited carrier (tracking key contains the carrier
/// pattern) that never showed up on its bill. Orders shipped with other
/// carriers are expected to be unmatched and are not reported.
pub fn unmatched_orders(rows: &[JoinedRecord], carrier_pattern: &str) -> Vec<JoinedRecord> {
    rows.iter()
        .filter(|r| r.match_status == MatchStatus::OrderOnly)
        .filter(|r| {
            r.tracking_key
                .as_deref()
                .is_some_and(|key| key.contains(carrier_pattern))
        })
        .cloned()
        .collect()
}

/// Order ids appearing on two or more order rows, regardless of match status.
///
/// Groups are ordered by row count descending, ties broken by first
/// appearance of the order id.
pub fn multi_tracking(orders: &[OrderRecord]) -> Vec<MultiTrackingGroup> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<MultiTrackingGroup> = Vec::new();

    for order in orders {
        let Some(order_id) = order.order_id.as_deref() else {
            continue;
        };
        let slot = *index.entry(order_id).or_insert_with(|| {
            groups.push(MultiTrackingGroup {
                order_id: order_id.to_string(),
                count: 0,
                trackings: Vec::new(),
                net_payout_usd: order.net_payout_usd.clone(),
            });
            groups.len() - 1
        });

        let group = &mut groups[slot];
        group.count += 1;
        if let Some(key) = order.tracking_key.as_deref() {
            if !group.trackings.iter().any(|t| t == key) {
                group.trackings.push(key.to_string());
            }
        }
    }

    groups.retain(|g| g.count > 1);
    // Stable sort keeps first-appearance order among equal counts.
    groups.sort_by(|a, b| b.count.cmp(&a.count));
    groups
}

/// Matched rows whose sales-channel destination differs from the carrier's
/// translated country. A null on either side is never a mismatch.
pub fn country_mismatch(rows: &[JoinedRecord]) -> Vec<JoinedRecord> {
    rows.iter()
        .filter(|r| r.match_status == MatchStatus::Matched)
        .filter(|r| match (r.destination_country.as_deref(), r.country_canonical.as_deref()) {
            (Some(dest), Some(origin)) => dest != origin,
            _ => false,
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IssueCategory;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn row(status: MatchStatus, key: Option<&str>) -> JoinedRecord {
        JoinedRecord {
            tracking_key: key.map(str::to_string),
            match_status: status,
            order_id: None,
            order_date: None,
            net_payout_usd: None,
            product_cost_usd: None,
            destination_country: None,
            cost_origin_currency: None,
            cost_usd: None,
            weight_kg: None,
            ship_date: None,
            origin_country_label: None,
            country_canonical: None,
            external_order_ref: None,
            shipping_pct: None,
            profit: None,
        }
    }

    fn with_countries(mut r: JoinedRecord, dest: Option<&str>, origin: Option<&str>) -> JoinedRecord {
        r.destination_country = dest.map(str::to_string);
        r.country_canonical = origin.map(str::to_string);
        r
    }

    fn order(id: Option<&str>, key: Option<&str>, payout: &str) -> OrderRecord {
        OrderRecord {
            order_id: id.map(str::to_string),
            tracking_key: key.map(str::to_string),
            order_date: None,
            net_payout_usd: Some(dec(payout)),
            product_cost_usd: None,
            destination_country: None,
        }
    }

    #[test]
    fn unmatched_shipments_only_shipment_only_rows() {
        let rows = vec![
            row(MatchStatus::Matched, Some("A")),
            row(MatchStatus::ShipmentOnly, Some("B")),
            row(MatchStatus::OrderOnly, Some("C")),
            row(MatchStatus::ShipmentOnly, None),
        ];
        let out = unmatched_shipments(&rows);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].tracking_key.as_deref(), Some("B"));
        assert_eq!(out[1].tracking_key, None);
    }

    #[test]
    fn unmatched_orders_require_carrier_pattern() {
        let rows = vec![
            row(MatchStatus::OrderOnly, Some("4PX12345")),
            row(MatchStatus::OrderOnly, Some("DHL999")),
            row(MatchStatus::OrderOnly, None),
            row(MatchStatus::Matched, Some("4PX777")),
            row(MatchStatus::OrderOnly, Some("XX4PXYY")),
            row(MatchStatus::OrderOnly, Some("4px-lower")),
        ];
        let out = unmatched_orders(&rows, "4PX");
        let keys: Vec<_> = out.iter().map(|r| r.tracking_key.as_deref().unwrap()).collect();
        assert_eq!(keys, vec!["4PX12345", "XX4PXYY"]);
    }

    #[test]
    fn unmatched_orders_custom_pattern() {
        let rows = vec![
            row(MatchStatus::OrderOnly, Some("4PX12345")),
            row(MatchStatus::OrderOnly, Some("YT2400")),
        ];
        let out = unmatched_orders(&rows, "YT");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].tracking_key.as_deref(), Some("YT2400"));
    }

    #[test]
    fn multi_tracking_groups() {
        let orders = vec![
            order(Some("O1"), Some("T1"), "10"),
            order(Some("O2"), Some("T2"), "20"),
            order(Some("O2"), Some("T3"), "25"),
        ];
        let out = multi_tracking(&orders);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].order_id, "O2");
        assert_eq!(out[0].count, 2);
        assert_eq!(out[0].trackings, vec!["T2", "T3"]);
        // First row's payout, not a sum
        assert_eq!(out[0].net_payout_usd, Some(dec("20")));
    }

    #[test]
    fn multi_tracking_counts_rows_lists_distinct_keys() {
        let orders = vec![
            order(Some("O9"), Some("T1"), "5"),
            order(Some("O9"), Some("T1"), "5"),
            order(Some("O9"), None, "5"),
        ];
        let out = multi_tracking(&orders);
        assert_eq!(out[0].count, 3);
        assert_eq!(out[0].trackings, vec!["T1"]);
    }

    #[test]
    fn multi_tracking_order_and_null_ids() {
        let orders = vec![
            order(Some("A"), Some("1"), "1"),
            order(None, Some("2"), "1"),
            order(Some("B"), Some("3"), "1"),
            order(Some("A"), Some("4"), "1"),
            order(None, Some("5"), "1"),
            order(Some("B"), Some("6"), "1"),
            order(Some("B"), Some("7"), "1"),
            order(Some("C"), Some("8"), "1"),
            order(Some("C"), Some("9"), "1"),
        ];
        let out = multi_tracking(&orders);
        let ids: Vec<_> = out.iter().map(|g| (g.order_id.as_str(), g.count)).collect();
        // B has 3 rows; A and C tie at 2 and keep first-appearance order
        assert_eq!(ids, vec![("B", 3), ("A", 2), ("C", 2)]);
    }

    #[test]
    fn country_mismatch_rules() {
        let rows = vec![
            with_countries(row(MatchStatus::Matched, Some("1")), Some("Canada"), Some("United States")),
            with_countries(row(MatchStatus::Matched, Some("2")), Some("Canada"), Some("Canada")),
            with_countries(row(MatchStatus::Matched, Some("3")), None, Some("Canada")),
            with_countries(row(MatchStatus::Matched, Some("4")), Some("Canada"), None),
            with_countries(row(MatchStatus::OrderOnly, Some("5")), Some("Canada"), Some("France")),
        ];
        let out = country_mismatch(&rows);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].tracking_key.as_deref(), Some("1"));
    }

    #[test]
    fn totals_count_overlaps_twice() {
        let rows = vec![row(MatchStatus::OrderOnly, Some("4PX1"))];
        let orders = vec![
            order(Some("O"), Some("4PX1"), "1"),
            order(Some("O"), Some("4PX2"), "1"),
        ];
        let report = classify_issues(&rows, &orders, "4PX");
        assert_eq!(report.count(IssueCategory::UnmatchedOrders), 1);
        assert_eq!(report.count(IssueCategory::MultiTracking), 1);
        assert_eq!(report.total(), 2);
        assert_eq!(report.counts()["unmatched_orders"], 1);
        assert_eq!(report.counts()["unmatched_shipments"], 0);
    }

    #[test]
    fn empty_inputs_yield_empty_report() {
        let report = classify_issues(&[], &[], "4PX");
        assert!(report.is_empty());
        assert_eq!(report.counts().len(), 4);
    }
}
