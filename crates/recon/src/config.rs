use std::collections::BTreeMap;
use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Deserializer};

use crate::country::CountryTable;
use crate::error::ReconError;

pub const DEFAULT_EXCHANGE_RATE: &str = "0.139";
pub const DEFAULT_CARRIER_PATTERN: &str = "4PX";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// Source currency → USD multiplier applied to every shipment cost.
    #[serde(default = "default_rate", deserialize_with = "deserialize_rate")]
    pub exchange_rate: BigDecimal,
    /// Literal substring identifying tracking keys handed to the audited carrier.
    #[serde(default = "default_carrier_pattern")]
    pub carrier_pattern: String,
    #[serde(default)]
    pub columns: ColumnConfig,
    /// Extra or overriding country translations, layered over the built-in table.
    #[serde(default)]
    pub countries: BTreeMap<String, String>,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            exchange_rate: default_rate(),
            carrier_pattern: default_carrier_pattern(),
            columns: ColumnConfig::default(),
            countries: BTreeMap::new(),
        }
    }
}

fn default_name() -> String {
    "shipping-cost-recon".into()
}

fn default_rate() -> BigDecimal {
    BigDecimal::from_str(DEFAULT_EXCHANGE_RATE).unwrap_or_default()
}

fn default_carrier_pattern() -> String {
    DEFAULT_CARRIER_PATTERN.into()
}

/// Accept `0.139`, `1` or `"0.139"`. Floats go through their shortest decimal
/// text so the rate is exact.
fn deserialize_rate<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RateValue {
        Int(i64),
        Float(f64),
        Text(String),
    }

    let text = match RateValue::deserialize(deserializer)? {
        RateValue::Int(n) => n.to_string(),
        RateValue::Float(f) => f.to_string(),
        RateValue::Text(s) => s,
    };
    BigDecimal::from_str(text.trim())
        .map_err(|_| serde::de::Error::custom(format!("invalid exchange_rate '{text}'")))
}

/// Parse a user-supplied exchange rate (e.g. from a command-line flag).
pub fn parse_rate(text: &str) -> Result<BigDecimal, ReconError> {
    let rate =
        BigDecimal::from_str(text.trim()).map_err(|_| ReconError::InvalidRate(text.into()))?;
    if rate <= BigDecimal::zero() {
        return Err(ReconError::InvalidRate(text.into()));
    }
    Ok(rate)
}

// ---------------------------------------------------------------------------
// Column aliases
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ColumnConfig {
    #[serde(default)]
    pub shipment: ShipmentColumns,
    #[serde(default)]
    pub order: OrderColumns,
}

/// Accepted source column names for each canonical shipment field.
/// The first alias present in the input wins.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShipmentColumns {
    pub tracking_key: Vec<String>,
    pub ship_date: Vec<String>,
    pub cost_origin_currency: Vec<String>,
    pub origin_country_label: Vec<String>,
    pub weight_kg: Vec<String>,
    pub external_order_ref: Vec<String>,
}

impl Default for ShipmentColumns {
    fn default() -> Self {
        Self {
            tracking_key: aliases(&["物流单号", "tracking_number", "Tracking number"]),
            ship_date: aliases(&["收货时间", "ship_date"]),
            cost_origin_currency: aliases(&["总金额", "shipping_cost_rmb"]),
            origin_country_label: aliases(&["国家/计费分区", "country_chinese"]),
            weight_kg: aliases(&["计费重", "weight_kg"]),
            external_order_ref: aliases(&["客户单号", "internal_order_id"]),
        }
    }
}

impl ShipmentColumns {
    fn lists(&self) -> [(&'static str, &Vec<String>); 6] {
        [
            ("tracking_key", &self.tracking_key),
            ("ship_date", &self.ship_date),
            ("cost_origin_currency", &self.cost_origin_currency),
            ("origin_country_label", &self.origin_country_label),
            ("weight_kg", &self.weight_kg),
            ("external_order_ref", &self.external_order_ref),
        ]
    }
}

/// Accepted source column names for each canonical order field.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrderColumns {
    pub order_id: Vec<String>,
    pub order_date: Vec<String>,
    pub tracking_key: Vec<String>,
    pub net_payout_usd: Vec<String>,
    pub destination_country: Vec<String>,
    pub product_cost_usd: Vec<String>,
}

impl Default for OrderColumns {
    fn default() -> Self {
        Self {
            order_id: aliases(&["Order", "order_number"]),
            order_date: aliases(&["Order created at date", "order_date"]),
            tracking_key: aliases(&["Tracking number", "tracking_number"]),
            net_payout_usd: aliases(&["Net payout", "net_payout"]),
            destination_country: aliases(&["Shipping country", "country"]),
            product_cost_usd: aliases(&["Cost", "product_cost"]),
        }
    }
}

impl OrderColumns {
    fn lists(&self) -> [(&'static str, &Vec<String>); 6] {
        [
            ("order_id", &self.order_id),
            ("order_date", &self.order_date),
            ("tracking_key", &self.tracking_key),
            ("net_payout_usd", &self.net_payout_usd),
            ("destination_country", &self.destination_country),
            ("product_cost_usd", &self.product_cost_usd),
        ]
    }
}

fn aliases(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.exchange_rate <= BigDecimal::zero() {
            return Err(ReconError::InvalidRate(self.exchange_rate.to_string()));
        }

        if self.carrier_pattern.trim().is_empty() {
            return Err(ReconError::ConfigValidation(
                "carrier_pattern must not be empty".into(),
            ));
        }

        for (field, list) in self.columns.shipment.lists() {
            if list.is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "columns.shipment.{field}: at least one column name is required"
                )));
            }
        }
        for (field, list) in self.columns.order.lists() {
            if list.is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "columns.order.{field}: at least one column name is required"
                )));
            }
        }

        for (label, name) in &self.countries {
            if label.trim().is_empty() || name.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "countries: empty label or name in entry '{label}' = '{name}'"
                )));
            }
        }

        Ok(())
    }

    /// Built-in country table with this config's entries layered on top.
    pub fn country_table(&self) -> CountryTable {
        let mut table = CountryTable::builtin();
        table.extend(self.countries.iter().map(|(k, v)| (k.clone(), v.clone())));
        table
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = ReconConfig::from_toml("").unwrap();
        assert_eq!(config.name, "shipping-cost-recon");
        assert_eq!(config.exchange_rate, dec("0.139"));
        assert_eq!(config.carrier_pattern, "4PX");
        assert_eq!(config.columns.shipment.tracking_key[0], "物流单号");
        assert_eq!(config.columns.order.net_payout_usd[0], "Net payout");
        assert!(config.countries.is_empty());
    }

    #[test]
    fn parse_full_config() {
        let input = r#"
name = "Spring close"
exchange_rate = 0.14
carrier_pattern = "YT"

[columns.shipment]
tracking_key = ["Waybill"]
cost_origin_currency = ["Amount CNY"]

[columns.order]
order_id = ["Name"]

[countries]
"美國" = "United States"
"#;
        let config = ReconConfig::from_toml(input).unwrap();
        assert_eq!(config.name, "Spring close");
        assert_eq!(config.exchange_rate, dec("0.14"));
        assert_eq!(config.carrier_pattern, "YT");
        assert_eq!(config.columns.shipment.tracking_key, vec!["Waybill"]);
        assert_eq!(config.columns.shipment.cost_origin_currency, vec!["Amount CNY"]);
        // Untouched fields keep their defaults
        assert_eq!(config.columns.shipment.ship_date[0], "收货时间");
        assert_eq!(config.columns.order.order_id, vec!["Name"]);
        assert_eq!(config.columns.order.tracking_key[0], "Tracking number");

        let table = config.country_table();
        assert_eq!(table.translate("美國"), "United States");
        assert_eq!(table.translate("美国"), "United States");
    }

    #[test]
    fn rate_as_string_is_exact() {
        let config = ReconConfig::from_toml(r#"exchange_rate = "0.1389""#).unwrap();
        assert_eq!(config.exchange_rate, dec("0.1389"));
    }

    #[test]
    fn rate_as_integer() {
        let config = ReconConfig::from_toml("exchange_rate = 1").unwrap();
        assert_eq!(config.exchange_rate, dec("1"));
    }

    #[test]
    fn reject_non_positive_rate() {
        let err = ReconConfig::from_toml("exchange_rate = 0").unwrap_err();
        assert!(matches!(err, ReconError::InvalidRate(_)));
        let err = ReconConfig::from_toml("exchange_rate = -0.5").unwrap_err();
        assert!(matches!(err, ReconError::InvalidRate(_)));
    }

    #[test]
    fn reject_unparseable_rate() {
        let err = ReconConfig::from_toml(r#"exchange_rate = "abc""#).unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn reject_empty_carrier_pattern() {
        let err = ReconConfig::from_toml(r#"carrier_pattern = "  ""#).unwrap_err();
        assert!(err.to_string().contains("carrier_pattern"));
    }

    #[test]
    fn reject_empty_alias_list() {
        let input = r#"
[columns.order]
net_payout_usd = []
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("columns.order.net_payout_usd"));
    }

    #[test]
    fn parse_rate_flag() {
        assert_eq!(parse_rate(" 0.139 ").unwrap(), dec("0.139"));
        assert!(parse_rate("0").is_err());
        assert!(parse_rate("seven").is_err());
    }
}
