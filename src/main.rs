use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

mod config;
mod fetcher;
mod logging;
mod models;
mod output;
mod query;
mod search;

use config::{DEFAULT_CONFIG_PATH, DEFAULT_CRITERIA_PATH, load_config, load_criteria};
use fetcher::build_http_client;
use output::{print_summary, timestamp_now, write_results};
use query::DEFAULT_SEARCH_ENDPOINT;
use search::run_searches;

const API_URL_ENV: &str = "URLSCAN_API_URL";

#[derive(Debug, Parser)]
#[command(name = "urlscan-search", version, about = "Batch searches against the urlscan.io API")]
struct Cli {
    /// Application settings (API key, output folder, formats)
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Document holding the `search_criteria` list
    #[arg(long, default_value = DEFAULT_CRITERIA_PATH)]
    criteria: PathBuf,

    /// Search endpoint
    #[arg(long, default_value = DEFAULT_SEARCH_ENDPOINT)]
    api_url: String,

    /// Debug-level logging on stderr
    #[arg(long, default_value_t = false)]
    verbose: bool,
}

/// The flag wins when it was changed; otherwise `URLSCAN_API_URL` may
/// redirect requests (tests point it at a mock server).
fn resolve_endpoint(cli_value: &str, env_value: Option<String>) -> String {
    match env_value.filter(|s| !s.trim().is_empty()) {
        Some(env) if cli_value == DEFAULT_SEARCH_ENDPOINT => env,
        _ => cli_value.to_string(),
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = format!("{e:#}");
            eprintln!("{message}");
            tracing::debug!(error = %message, "run aborted");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli.config)?;
    let criteria = load_criteria(&cli.criteria)?;
    if criteria.is_empty() {
        anyhow::bail!(
            "Error: No hay criterios de búsqueda en {}.",
            cli.criteria.display()
        );
    }

    let endpoint = resolve_endpoint(&cli.api_url, std::env::var(API_URL_ENV).ok());
    tracing::debug!(%endpoint, criteria = criteria.len(), "starting searches");

    let client = build_http_client(config.request_timeout())?;
    let run = run_searches(&client, &endpoint, &config, &criteria).await;

    write_results(
        Path::new(&config.output_folder),
        &config.output_title,
        &run.results,
        config.formats(),
        &timestamp_now(),
    )?;
    print_summary(&run.reports);
    Ok(())
}
