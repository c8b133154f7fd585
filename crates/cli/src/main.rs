// shipcost CLI - reconcile carrier shipment bills against sales-channel orders

mod exit_codes;
mod recon;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use exit_codes::{EXIT_SUCCESS, EXIT_USAGE};
use shipcost_recon::RowScope;

#[derive(Parser)]
#[command(name = "shipcost")]
#[command(about = "Reconcile carrier shipping bills against sales-channel orders")]
#[command(version)]
#[command(long_version = long_version())]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Join a shipment ledger with an order export and report issues
    #[command(after_help = "\
Examples:
  shipcost run --shipments 4px-january.xlsx --orders shopify-orders.csv
  shipcost run --shipments bill.csv --orders orders.csv --json > result.json
  shipcost run --shipments bill.csv --orders orders.csv --export matched.xlsx
  shipcost run --shipments bill.csv --orders orders.csv --rate 0.1385 --strict
  shipcost run --shipments bill.csv --orders orders.csv --config yunexpress.recon.toml")]
    Run {
        /// Carrier shipment ledger (csv, tsv, txt, xlsx, xlsm, xls, xlsb, ods)
        #[arg(long, value_name = "FILE")]
        shipments: PathBuf,

        /// Sales-channel order export (same formats)
        #[arg(long, value_name = "FILE")]
        orders: PathBuf,

        /// Recon config (.recon.toml); defaults apply when omitted
        #[arg(long, short = 'c', value_name = "FILE")]
        config: Option<PathBuf>,

        /// Override the exchange rate (source currency -> USD)
        #[arg(long, env = "SHIPCOST_RATE", value_name = "RATE")]
        rate: Option<String>,

        /// Override the carrier tracking-number pattern
        #[arg(long, value_name = "PATTERN")]
        carrier: Option<String>,

        /// Output JSON to stdout instead of human summary
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long, short = 'o', value_name = "FILE")]
        output: Option<PathBuf>,

        /// Export joined rows to a csv/tsv/xlsx file
        #[arg(long, value_name = "FILE")]
        export: Option<PathBuf>,

        /// Which rows to export
        #[arg(long, value_enum, default_value_t = ScopeArg::Matched)]
        export_scope: ScopeArg,

        /// Number of most expensive shipments listed in the human summary
        #[arg(long, default_value_t = 5, value_name = "N")]
        top: usize,

        /// Exit 1 when any issue is found
        #[arg(long)]
        strict: bool,
    },

    /// Validate a recon config without running
    #[command(after_help = "\
Examples:
  shipcost validate yunexpress.recon.toml")]
    Validate {
        /// Path to the .recon.toml config file
        config: PathBuf,
    },

    /// Print the effective country translation table
    Countries {
        /// Include entries from this config's [countries] table
        #[arg(long, short = 'c', value_name = "FILE")]
        config: Option<PathBuf>,

        /// Output JSON object instead of lines
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScopeArg {
    Matched,
    Unmatched,
    All,
}

impl From<ScopeArg> for RowScope {
    fn from(scope: ScopeArg) -> Self {
        match scope {
            ScopeArg::Matched => RowScope::Matched,
            ScopeArg::Unmatched => RowScope::Unmatched,
            ScopeArg::All => RowScope::All,
        }
    }
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("SHIPCOST_GIT_HASH"), ")",
        "\nengine:  shipcost-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("SHIPCOST_TARGET"),
    )
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            shipments,
            orders,
            config,
            rate,
            carrier,
            json,
            output,
            export,
            export_scope,
            top,
            strict,
        } => recon::cmd_run(recon::RunArgs {
            shipments,
            orders,
            config,
            rate,
            carrier,
            json,
            output,
            export,
            export_scope: export_scope.into(),
            top,
            strict,
        }),
        Commands::Validate { config } => recon::cmd_validate(config),
        Commands::Countries { config, json } => recon::cmd_countries(config, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
