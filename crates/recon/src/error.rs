use thiserror::Error;

/// Errors that abort a reconciliation run.
///
/// Data-quality problems (unparseable cells, unknown countries, missing
/// counterparts) are never errors; they surface as nulls or issue entries.
#[derive(Debug, Error)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// Config validation error (empty alias list, bad carrier pattern, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),

    /// Exchange rate is not a positive decimal.
    #[error("invalid exchange rate '{0}': must be a positive decimal")]
    InvalidRate(String),

    /// A required canonical field has no matching source column.
    #[error("{input} input: missing required field '{field}' (looked for columns: {})", .candidates.join(", "))]
    MissingColumn {
        input: String,
        field: String,
        candidates: Vec<String>,
    },
}

impl ReconError {
    /// True for schema failures (a required field could not be resolved).
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::MissingColumn { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_column_names_input_and_field() {
        let err = ReconError::MissingColumn {
            input: "orders".into(),
            field: "net_payout_usd".into(),
            candidates: vec!["Net payout".into(), "net_payout".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("orders input"));
        assert!(msg.contains("'net_payout_usd'"));
        assert!(msg.contains("Net payout, net_payout"));
        assert!(err.is_schema());
    }
}
