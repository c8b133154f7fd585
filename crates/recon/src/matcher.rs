use std::collections::BTreeMap;

use crate::derived::{profit, shipping_pct};
use crate::model::{JoinedRecord, MatchStatus, OrderRecord, ShipmentRecord};

/// Row indices sharing one tracking key, per side, in source order.
#[derive(Default)]
struct KeyGroup {
    orders: Vec<usize>,
    shipments: Vec<usize>,
}

/// Full outer join of orders and shipments on exact tracking-key equality.
///
/// Every (order, shipment) pair sharing a key yields one `matched` row, so a
/// key with `m` orders and `n` shipments yields `m * n` rows. Keys present on
/// one side only yield one row per record. Records without a key never match.
///
/// Output order: keys ascending; within a key, orders in source order crossed
/// with shipments in source order; then keyless orders; then keyless shipments.
pub fn join_on_tracking(shipments: &[ShipmentRecord], orders: &[OrderRecord]) -> Vec<JoinedRecord> {
    let mut groups: BTreeMap<&str, KeyGroup> = BTreeMap::new();
    let mut keyless_orders = Vec::new();
    let mut keyless_shipments = Vec::new();

    for (i, order) in orders.iter().enumerate() {
        match order.tracking_key.as_deref() {
            Some(key) => groups.entry(key).or_default().orders.push(i),
            None => keyless_orders.push(i),
        }
    }
    for (i, shipment) in shipments.iter().enumerate() {
        match shipment.tracking_key.as_deref() {
            Some(key) => groups.entry(key).or_default().shipments.push(i),
            None => keyless_shipments.push(i),
        }
    }

    let mut rows = Vec::with_capacity(orders.len().max(shipments.len()));

    for group in groups.values() {
        if group.shipments.is_empty() {
            for &oi in &group.orders {
                rows.push(build_row(Some(&orders[oi]), None));
            }
        } else if group.orders.is_empty() {
            for &si in &group.shipments {
                rows.push(build_row(None, Some(&shipments[si])));
            }
        } else {
            for &oi in &group.orders {
                for &si in &group.shipments {
                    rows.push(build_row(Some(&orders[oi]), Some(&shipments[si])));
                }
            }
        }
    }

    for oi in keyless_orders {
        rows.push(build_row(Some(&orders[oi]), None));
    }
    for si in keyless_shipments {
        rows.push(build_row(None, Some(&shipments[si])));
    }

    rows
}

fn build_row(order: Option<&OrderRecord>, shipment: Option<&ShipmentRecord>) -> JoinedRecord {
    let match_status = match (order, shipment) {
        (Some(_), Some(_)) => MatchStatus::Matched,
        (None, Some(_)) => MatchStatus::ShipmentOnly,
        _ => MatchStatus::OrderOnly,
    };

    let tracking_key = order
        .and_then(|o| o.tracking_key.clone())
        .or_else(|| shipment.and_then(|s| s.tracking_key.clone()));

    let net_payout_usd = order.and_then(|o| o.net_payout_usd.clone());
    let product_cost_usd = order.and_then(|o| o.product_cost_usd.clone());
    let cost_usd = shipment.and_then(|s| s.cost_usd.clone());

    JoinedRecord {
        tracking_key,
        match_status,
        order_id: order.and_then(|o| o.order_id.clone()),
        order_date: order.and_then(|o| o.order_date),
        destination_country: order.and_then(|o| o.destination_country.clone()),
        cost_origin_currency: shipment.and_then(|s| s.cost_origin_currency.clone()),
        weight_kg: shipment.and_then(|s| s.weight_kg.clone()),
        ship_date: shipment.and_then(|s| s.ship_date),
        origin_country_label: shipment.and_then(|s| s.origin_country_label.clone()),
        country_canonical: shipment.and_then(|s| s.country_canonical.clone()),
        external_order_ref: shipment.and_then(|s| s.external_order_ref.clone()),
        shipping_pct: shipping_pct(cost_usd.as_ref(), net_payout_usd.as_ref()),
        profit: profit(net_payout_usd.as_ref(), product_cost_usd.as_ref(), cost_usd.as_ref()),
        net_payout_usd,
        product_cost_usd,
        cost_usd,
    }
}
