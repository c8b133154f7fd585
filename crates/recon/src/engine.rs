use crate::classify::classify_issues;
use crate::config::ReconConfig;
use crate::error::ReconError;
use crate::evidence::compute_summary;
use crate::matcher::join_on_tracking;
use crate::model::{IssueReport, JoinedRecord, OrderRecord, RawTable, ReconMeta, ReconResult, ShipmentRecord};
use crate::normalize::Normalizer;

/// Run reconciliation per config. Returns joined rows, issues and summary.
pub fn run(
    config: &ReconConfig,
    shipments: &RawTable,
    orders: &RawTable,
) -> Result<ReconResult, ReconError> {
    Reconciliation::from_config(config)?.run(&config.name, shipments, orders)
}

/// One configured reconciliation. Exposes each stage for callers that want
/// the intermediate collections.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    normalizer: Normalizer,
    carrier_pattern: String,
}

impl Reconciliation {
    /// The carrier pattern must be non-empty: an empty substring matches
    /// every tracking key.
    pub fn new(normalizer: Normalizer, carrier_pattern: impl Into<String>) -> Result<Self, ReconError> {
        let carrier_pattern = carrier_pattern.into();
        if carrier_pattern.trim().is_empty() {
            return Err(ReconError::ConfigValidation(
                "carrier_pattern must not be empty".into(),
            ));
        }
        Ok(Self {
            normalizer,
            carrier_pattern,
        })
    }

    /// Validates the config, then builds the stages from it.
    pub fn from_config(config: &ReconConfig) -> Result<Self, ReconError> {
        config.validate()?;
        Self::new(Normalizer::from_config(config), config.carrier_pattern.clone())
    }

    pub fn carrier_pattern(&self) -> &str {
        &self.carrier_pattern
    }

    pub fn normalize(
        &self,
        shipments: &RawTable,
        orders: &RawTable,
    ) -> Result<(Vec<ShipmentRecord>, Vec<OrderRecord>), ReconError> {
        self.normalizer.normalize(shipments, orders)
    }

    pub fn join(&self, shipments: &[ShipmentRecord], orders: &[OrderRecord]) -> Vec<JoinedRecord> {
        join_on_tracking(shipments, orders)
    }

    pub fn classify(&self, rows: &[JoinedRecord], orders: &[OrderRecord]) -> IssueReport {
        classify_issues(rows, orders, &self.carrier_pattern)
    }

    pub fn run(
        &self,
        name: &str,
        shipments: &RawTable,
        orders: &RawTable,
    ) -> Result<ReconResult, ReconError> {
        let (shipment_records, order_records) = self.normalize(shipments, orders)?;
        let rows = self.join(&shipment_records, &order_records);
        let issues = self.classify(&rows, &order_records);
        let summary = compute_summary(&rows, shipment_records.len(), order_records.len(), &issues);

        log::info!(
            "recon '{name}': {} shipments, {} orders, {} matched, {} issues",
            summary.shipment_count,
            summary.order_count,
            summary.matched,
            summary.total_issues
        );

        Ok(ReconResult {
            meta: ReconMeta {
                config_name: name.to_string(),
                engine_version: env!("CARGO_PKG_VERSION").to_string(),
                exchange_rate: self.normalizer.exchange_rate().clone(),
                carrier_pattern: self.carrier_pattern.clone(),
                run_at: chrono::Utc::now().to_rfc3339(),
            },
            summary,
            rows,
            issues,
        })
    }
}
