//! `shipcost run` / `validate` / `countries`.

use std::path::{Path, PathBuf};

use shipcost_io::IoError;
use shipcost_recon::evidence::{select_rows, top_shipping_costs};
use shipcost_recon::{ReconConfig, ReconError, ReconResult, RowScope};

use crate::exit_codes::{
    EXIT_ISSUES, EXIT_RECON_INPUT, EXIT_RECON_INVALID_CONFIG, EXIT_RECON_OUTPUT, EXIT_RECON_SCHEMA,
};
use crate::CliError;

pub struct RunArgs {
    pub shipments: PathBuf,
    pub orders: PathBuf,
    pub config: Option<PathBuf>,
    pub rate: Option<String>,
    pub carrier: Option<String>,
    pub json: bool,
    pub output: Option<PathBuf>,
    pub export: Option<PathBuf>,
    pub export_scope: RowScope,
    pub top: usize,
    pub strict: bool,
}

fn recon_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

fn engine_err(e: ReconError) -> CliError {
    match e {
        ReconError::MissingColumn { ref input, .. } => {
            let hint = format!("map the column under [columns.{}] in a --config file", singular(input));
            recon_err(EXIT_RECON_SCHEMA, e.to_string()).with_hint(hint)
        }
        ReconError::InvalidRate(_) => recon_err(EXIT_RECON_INVALID_CONFIG, e.to_string())
            .with_hint("exchange_rate must be a positive decimal, e.g. 0.139"),
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => {
            recon_err(EXIT_RECON_INVALID_CONFIG, e.to_string())
        }
    }
}

fn input_err(e: IoError) -> CliError {
    let err = recon_err(EXIT_RECON_INPUT, e.to_string());
    match e {
        IoError::UnsupportedFormat { .. } => err.with_hint("save the file as .csv or .xlsx"),
        _ => err,
    }
}

fn singular(input: &str) -> &str {
    match input {
        "shipments" => "shipment",
        "orders" => "order",
        other => other,
    }
}

fn load_config(path: Option<&Path>) -> Result<ReconConfig, CliError> {
    let Some(path) = path else {
        return Ok(ReconConfig::default());
    };
    let config_str = std::fs::read_to_string(path).map_err(|e| {
        recon_err(
            EXIT_RECON_INVALID_CONFIG,
            format!("cannot read config {}: {e}", path.display()),
        )
    })?;
    ReconConfig::from_toml(&config_str).map_err(engine_err)
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let mut config = load_config(args.config.as_deref())?;

    if let Some(ref rate) = args.rate {
        config.exchange_rate = shipcost_recon::config::parse_rate(rate).map_err(|e| {
            CliError::args(e.to_string()).with_hint("pass a positive decimal, e.g. --rate 0.139")
        })?;
    }
    if let Some(carrier) = args.carrier {
        if carrier.trim().is_empty() {
            return Err(CliError::args("--carrier must not be empty")
                .with_hint("pass the tracking-number prefix, e.g. --carrier 4PX"));
        }
        config.carrier_pattern = carrier;
    }

    log::info!(
        "run '{}': rate {}, carrier pattern \"{}\"",
        config.name,
        config.exchange_rate,
        config.carrier_pattern
    );
    let shipments = shipcost_io::read_table(&args.shipments, "shipments").map_err(input_err)?;
    let orders = shipcost_io::read_table(&args.orders, "orders").map_err(input_err)?;

    log::debug!("read {} shipment row(s), {} order row(s)", shipments.len(), orders.len());

    let result = shipcost_recon::run(&config, &shipments, &orders).map_err(engine_err)?;

    let json_str = serde_json::to_string_pretty(&result)
        .map_err(|e| recon_err(EXIT_RECON_OUTPUT, format!("JSON serialization error: {e}")))?;

    if let Some(ref path) = args.output {
        std::fs::write(path, &json_str)
            .map_err(|e| recon_err(EXIT_RECON_OUTPUT, format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if let Some(ref path) = args.export {
        let rows = select_rows(&result.rows, args.export_scope);
        let written = shipcost_io::export_rows(&rows, path)
            .map_err(|e| recon_err(EXIT_RECON_OUTPUT, e.to_string()))?;
        eprintln!("exported {written} row(s) to {}", path.display());
    }

    if args.json {
        println!("{json_str}");
    } else {
        print_summary(&result, args.top);
    }

    if args.strict && !result.issues.is_empty() {
        return Err(recon_err(
            EXIT_ISSUES,
            format!("{} issue(s) found", result.issues.total()),
        ));
    }

    Ok(())
}

fn opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".into())
}

/// Human summary to stderr
fn print_summary(result: &ReconResult, top: usize) {
    let s = &result.summary;
    eprintln!(
        "recon '{}': {} shipments, {} orders -> {} rows ({} matched, {} shipment only, {} order only)",
        result.meta.config_name,
        s.shipment_count,
        s.order_count,
        s.total_rows,
        s.matched,
        s.shipment_only,
        s.order_only,
    );
    eprintln!(
        "match rate {}%, avg shipping ${} ({}% of payout), total shipping ${}",
        opt(s.match_rate_pct.as_ref()),
        opt(s.avg_shipping_cost_usd.as_ref()),
        opt(s.avg_shipping_pct.as_ref()),
        s.total_shipping_cost_usd,
    );

    if !s.by_country.is_empty() {
        eprintln!("by country:");
        for c in &s.by_country {
            eprintln!(
                "  {:<20} {:>5} orders  avg ${:>10}  total ${:>12}  avg {}%",
                c.country,
                c.order_count,
                opt(c.avg_cost_usd.as_ref()),
                c.total_cost_usd.round(2),
                opt(c.avg_shipping_pct.as_ref()),
            );
        }
    }

    let costly = top_shipping_costs(&result.rows, top, None);
    if !costly.is_empty() {
        eprintln!("top {} shipping costs:", costly.len());
        for r in costly {
            eprintln!(
                "  {:<12} {:<24} ${:>10}  {}%",
                opt(r.order_id.as_deref()),
                opt(r.tracking_key.as_deref()),
                opt(r.cost_usd.as_ref().map(|c| c.round(2))),
                opt(r.shipping_pct.as_ref()),
            );
        }
    }

    let i = &result.issues;
    eprintln!(
        "issues: {} total ({} unmatched shipments, {} unmatched {} orders, {} multi-tracking orders, {} country mismatches)",
        i.total(),
        i.unmatched_shipments.len(),
        i.unmatched_orders.len(),
        result.meta.carrier_pattern,
        i.multi_tracking.len(),
        i.country_mismatch.len(),
    );
    for g in &i.multi_tracking {
        eprintln!("  order {} has {} rows: {}", g.order_id, g.count, g.trackings.join(", "));
    }
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(Some(&config_path))?;
    eprintln!(
        "config valid: \"{}\" (rate {}, carrier pattern \"{}\", {} extra country entries)",
        config.name,
        config.exchange_rate,
        config.carrier_pattern,
        config.countries.len(),
    );
    Ok(())
}

pub fn cmd_countries(config_path: Option<PathBuf>, json: bool) -> Result<(), CliError> {
    let config = load_config(config_path.as_deref())?;
    let table = config.country_table();
    let entries = table.sorted();

    if json {
        let json_str = serde_json::to_string_pretty(&entries)
            .map_err(|e| recon_err(EXIT_RECON_OUTPUT, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    } else {
        for (label, name) in &entries {
            println!("{label}\t{name}");
        }
    }
    Ok(())
}
