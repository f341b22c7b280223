//! Resource aggregator: binary entrypoint.
//! `fetch` runs one ingestion pass, `stats` prints store counters and
//! `serve` boots the HTTP API (with an optional periodic scheduler).

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use resource_aggregator::api::{create_router, AppState};
use resource_aggregator::config::AppConfig;
use resource_aggregator::ingest::config::{load_sources_default, load_sources_from};
use resource_aggregator::ingest::providers::HttpAdapter;
use resource_aggregator::ingest::scheduler::{spawn_periodic, CatalogueSource};
use resource_aggregator::metrics::Metrics;
use resource_aggregator::{Pipeline, Store};

#[derive(Parser, Debug)]
#[command(name = "resource-aggregator", version, about = "Collects, dedups and categorizes learning resources")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one ingestion pass and print the report.
    Fetch,
    /// Print item counts and the checked-items journey.
    Stats,
    /// Serve the HTTP API.
    Serve,
}

/// `RUST_LOG` picks levels (default `resource_aggregator=info,warn`);
/// `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("resource_aggregator=info,warn"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

fn catalogue_source(cfg: &AppConfig) -> Result<CatalogueSource> {
    match &cfg.sources_path {
        Some(p) => Ok(CatalogueSource::Fixed(load_sources_from(p)?)),
        None => Ok(CatalogueSource::Reload),
    }
}

async fn build_pipeline(cfg: &AppConfig) -> Result<Pipeline> {
    let store = Store::open(&cfg.database_path)
        .await
        .with_context(|| format!("opening store at {}", cfg.database_path.display()))?;
    let adapter = HttpAdapter::new(&cfg.user_agent, cfg.fetch_timeout())?;
    Ok(Pipeline::new(store, Arc::new(adapter), cfg.fetch_options()))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let cfg = AppConfig::load()?;

    match cli.command {
        Command::Fetch => {
            let catalogue = match catalogue_source(&cfg)? {
                CatalogueSource::Fixed(c) => c,
                CatalogueSource::Reload => load_sources_default()?,
            };
            let pipeline = build_pipeline(&cfg).await?;
            let report = pipeline.run_ingestion(&catalogue).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            pipeline.store().clone().close().await;
        }
        Command::Stats => {
            let store = Store::open(&cfg.database_path).await?;
            let stats = store.stats().await?;
            let journey = store.journey().await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "stats": stats,
                    "journey": journey,
                }))?
            );
            store.close().await;
        }
        Command::Serve => {
            let metrics = Metrics::init()?;
            let catalogue = catalogue_source(&cfg)?;
            let pipeline = Arc::new(build_pipeline(&cfg).await?);

            if let Some(every) = cfg.fetch_interval() {
                tracing::info!(interval_secs = every.as_secs(), "periodic ingestion enabled");
                spawn_periodic(pipeline.clone(), catalogue.clone(), every);
            }

            let state = AppState::new(pipeline.clone(), catalogue);
            let app = create_router(state).merge(metrics.router());

            let listener = tokio::net::TcpListener::bind(&cfg.bind)
                .await
                .with_context(|| format!("binding {}", cfg.bind))?;
            tracing::info!(bind = %cfg.bind, "listening");
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await?;
            pipeline.store().clone().close().await;
        }
    }
    Ok(())
}
