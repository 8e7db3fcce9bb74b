//! Command-line entry point: read inventory, check every URL, write report.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use linktriage::{
    BrowserProbe, BrowserSession, CheckConfig, HttpOracle, OracleSettings, dedup_urls, input,
    normalize_url, run_checks, write_report,
};

#[derive(Parser, Debug)]
#[command(
    name = "linktriage",
    about = "Classify the health of every URL in a CSV inventory",
    version
)]
struct Cli {
    /// Inventory CSV with a Domain or URL column
    #[arg(default_value = "input.csv")]
    input: PathBuf,

    /// Report CSV to write
    #[arg(default_value = "output.csv")]
    output: PathBuf,

    /// Maximum checks in flight at once
    #[arg(default_value_t = 4)]
    concurrency: usize,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive("chromiumoxide::handler=off".parse().expect("valid directive"))
        .add_directive("chromiumoxide::conn=off".parse().expect("valid directive"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("linktriage: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = CheckConfig::default().with_concurrency(cli.concurrency);

    let raw_urls = input::read_raw_urls(&cli.input)?;
    let mut normalized = Vec::with_capacity(raw_urls.len());
    for raw in raw_urls {
        match normalize_url(&raw) {
            Ok(url) => normalized.push(url),
            Err(e) => warn!(raw, "skipping unusable inventory row: {e}"),
        }
    }
    let urls = dedup_urls(normalized);

    if urls.is_empty() {
        anyhow::bail!(
            "no usable URLs in {} (need a Domain or URL column with values)",
            cli.input.display()
        );
    }
    info!(count = urls.len(), "inventory loaded");

    let oracle_settings = OracleSettings::from_env();
    if oracle_settings.is_configured() {
        info!("parked-page oracle enabled");
    }

    let session = Arc::new(BrowserSession::launch(&config).await?);
    let probe = Arc::new(BrowserProbe::new(Arc::clone(&session), config.clone()));
    let oracle = Arc::new(HttpOracle::new(oracle_settings));

    let results = run_checks(urls, probe, oracle, &config).await;
    let summary = write_report(&cli.output, &results)?;

    println!(
        "checked {} URLs: {} ok, {} parked, {} broken, {} not found, {} server errors, {} other",
        summary.total(),
        summary.ok,
        summary.parked,
        summary.broken,
        summary.not_found,
        summary.server_error,
        summary.other
    );

    Ok(())
}
