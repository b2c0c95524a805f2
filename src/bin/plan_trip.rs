//! Plans a day trip from a JSON request and prints the response as JSON.
//!
//! ```text
//! plan_trip --data-dir data --request request.json
//! plan_trip --catalog oxford.csv --request - --seed 7 < request.json
//! ```

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use trip_planner::enrichment::{LlmEnricher, TemplateEnricher};
use trip_planner::llm::{ChatClient, LlmConfig};
use trip_planner::traits::Enricher;
use trip_planner::{Catalog, PlannerOptions, TripPlanner, TripRequest, TripResponse};

#[derive(Debug, Parser)]
#[command(name = "plan_trip", about = "Themed one-day route planner")]
struct Args {
    /// Request JSON file, or `-` for stdin.
    #[arg(long, default_value = "-")]
    request: String,
    /// Attraction catalog CSV. Overrides `--data-dir`.
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Directory of `<city>.csv` catalogs, resolved from the request's city.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
    /// Seed for theme jitter; omit for a fresh draw each run.
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value_t = 100)]
    max_candidates: usize,
    /// Per-call deadline for route and trip narratives.
    #[arg(long)]
    enrichment_timeout_secs: Option<u64>,
    /// Never call the language model, even when an API key is configured.
    #[arg(long)]
    offline: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn read_request(source: &str) -> anyhow::Result<TripRequest> {
    let raw = if source == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).context("read request from stdin")?;
        buf
    } else {
        fs::read_to_string(source).with_context(|| format!("read request {source}"))?
    };
    serde_json::from_str(&raw).context("parse trip request")
}

fn enricher(offline: bool) -> Arc<dyn Enricher> {
    let config = LlmConfig::from_env();
    if offline || config.api_key.is_none() {
        info!("planning offline with template enrichment");
        return Arc::new(TemplateEnricher);
    }

    match ChatClient::new(config) {
        Ok(client) => {
            info!(model = %client.config().model, "planning with language model enrichment");
            Arc::new(LlmEnricher::new(client))
        }
        Err(err) => {
            warn!(error = %err, "could not build HTTP client, planning offline");
            Arc::new(TemplateEnricher)
        }
    }
}

fn run(args: &Args, request: &TripRequest) -> anyhow::Result<TripResponse> {
    let mut options = PlannerOptions {
        seed: args.seed,
        max_candidates: args.max_candidates,
        ..PlannerOptions::default()
    };
    if let Some(secs) = args.enrichment_timeout_secs {
        options.enrichment_timeout = Duration::from_secs(secs);
    }
    let planner = TripPlanner::from_shared(enricher(args.offline), options);

    let response = match &args.catalog {
        Some(path) => {
            let catalog = Catalog::from_path(path).with_context(|| format!("load catalog {}", path.display()))?;
            planner.plan(&catalog, request)?
        }
        None => planner.plan_for_city(&args.data_dir, request)?,
    };
    Ok(response)
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    let request = read_request(&args.request)?;
    let response = run(&args, &request)?;

    info!(
        request_id = %response.request_id,
        routes = response.routes.len(),
        "trip planned"
    );
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
