use std::fs::File;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use taxreturn_core::TaxYearConfig;
use taxreturn_data::{BracketTableLoader, BrokerCsvLoader, ProfileLoader};

mod display;
mod report;

use display::TextReport;
use report::Report;

// ─── CLI definition ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Federal Form 1040 and Colorado Form 104 calculator.
///
/// Reads a taxpayer profile, computes the return, and prints the result with
/// next year's estimated payment plan and tax-saving recommendations.
#[derive(Debug, Parser)]
#[command(name = "taxreturn", version)]
struct Cli {
    /// Taxpayer profile (TOML).
    #[arg(short, long)]
    profile: PathBuf,

    /// Tax year tables to use. Defaults to the profile's tax year.
    #[arg(long)]
    year: Option<i32>,

    /// IRS rate schedule CSV replacing the built-in bracket tables.
    #[arg(long)]
    brackets: Option<PathBuf>,

    /// Broker realized gain/loss export, added to the profile's 1099-Bs.
    #[arg(long)]
    broker_csv: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Print every computed form line.
    #[arg(long)]
    detail: bool,

    /// Log engine decisions at debug level.
    #[arg(short, long)]
    verbose: bool,
}

// ─── tracing ─────────────────────────────────────────────────────────────────

/// Initialise the tracing subscriber.
///
/// * Honours `RUST_LOG` when set.
/// * Falls back to `info`, or `debug` with `--verbose`.
/// * Strips timestamps and target names to keep CLI output clean.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::from(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

// ─── entry point ─────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut profile = ProfileLoader::load(&cli.profile)
        .with_context(|| format!("Failed to load profile: {}", cli.profile.display()))?;
    let year = cli.year.unwrap_or(profile.tax_year);

    let mut config = TaxYearConfig::for_year(year)?;
    if let Some(path) = &cli.brackets {
        let file =
            File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
        let tables = BracketTableLoader::load(file, year)
            .with_context(|| format!("Failed to load brackets: {}", path.display()))?;
        config = config.with_bracket_tables(tables);
        debug!(path = %path.display(), "Bracket tables replaced");
    }

    if let Some(path) = &cli.broker_csv {
        let forms = BrokerCsvLoader::load(path)
            .with_context(|| format!("Failed to load broker CSV: {}", path.display()))?;
        info!(brokers = forms.len(), "Broker statements added");
        profile.forms_1099_b.extend(forms);
    }

    let report = Report::build(&profile, &config).context("Failed to compute return")?;

    match cli.format {
        OutputFormat::Text => print!("{}", TextReport::new(&report, cli.detail)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(())
}
