//! DEGRADIX - engine health scoring service
//!
//! `degradix serve` loads the model bundle and serves the HTTP API.
//! `degradix analyze --csv <file>` runs one analysis and prints JSON.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use degradix::api::{create_app, ApiState, BundleInfo};
use degradix::config::DegradixConfig;
use degradix::models::bundle;
use degradix::{dataset, AnalysisPipeline};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "degradix")]
#[command(about = "DEGRADIX engine health scoring & degradation analytics")]
#[command(version)]
struct CliArgs {
    /// Config file (default: $DEGRADIX_CONFIG, then ./degradix.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Model bundle, overriding `models.bundle_path`
    #[arg(long, global = true, env = "DEGRADIX_BUNDLE")]
    bundle: Option<PathBuf>,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(Subcommand, Debug)]
enum SubCommand {
    /// Serve the HTTP API
    Serve {
        /// Override the server address (default: "0.0.0.0:8000")
        #[arg(short, long, value_name = "HOST:PORT")]
        addr: Option<String>,
    },
    /// Analyze one CSV file and print the result as JSON
    Analyze {
        #[arg(long)]
        csv: PathBuf,

        #[arg(long, value_enum, default_value_t = Endpoint::Analyze)]
        endpoint: Endpoint,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Endpoint {
    Analyze,
    Health,
    Dsi,
    Reliability,
    Clusters,
    Insights,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();

    let config = match &args.config {
        Some(path) => DegradixConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => DegradixConfig::load(),
    };
    let bundle_path = args
        .bundle
        .clone()
        .unwrap_or_else(|| config.models.bundle_path.clone());
    let (pipeline, bundle_info) = load_pipeline(&bundle_path, &config)?;

    match args.command {
        SubCommand::Serve { addr } => {
            let addr = addr.unwrap_or_else(|| config.server.addr.clone());
            serve(pipeline, bundle_info, &config, &addr).await
        }
        SubCommand::Analyze { csv, endpoint } => {
            let json = analyze_file(&pipeline, &config, &csv, endpoint)?;
            println!("{json}");
            Ok(())
        }
    }
}

fn load_pipeline(path: &Path, config: &DegradixConfig) -> Result<(AnalysisPipeline, BundleInfo)> {
    let (bundle, fingerprint) = bundle::load_from_disk(path)
        .with_context(|| format!("Failed to load model bundle {}", path.display()))?;
    let info = BundleInfo::from_bundle(&bundle, fingerprint);
    let pipeline = AnalysisPipeline::new(bundle.into_models(), config);
    info!(
        windowing = %config.pipeline.windowing,
        seq_len = pipeline.seq_len(),
        "Pipeline ready"
    );
    Ok((pipeline, info))
}

async fn serve(
    pipeline: AnalysisPipeline,
    bundle_info: BundleInfo,
    config: &DegradixConfig,
    addr: &str,
) -> Result<()> {
    let app = create_app(ApiState::new(pipeline, bundle_info, config));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("HTTP API listening on http://{addr}/api/v1");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    info!("Received Ctrl+C, shutting down");
}

fn analyze_file(
    pipeline: &AnalysisPipeline,
    config: &DegradixConfig,
    csv: &Path,
    endpoint: Endpoint,
) -> Result<String> {
    let text = std::fs::read_to_string(csv)
        .with_context(|| format!("Failed to read {}", csv.display()))?;
    let table = dataset::parse_csv(&text, &config.pipeline.sensor_prefix)
        .with_context(|| format!("Invalid table {}", csv.display()))?;
    info!(rows = table.len(), channels = table.channels().len(), ?endpoint, "Analyzing");

    let json = match endpoint {
        Endpoint::Analyze => serde_json::to_string_pretty(&pipeline.analyze(&table)?),
        Endpoint::Health => serde_json::to_string_pretty(&pipeline.health(&table)?),
        Endpoint::Dsi => serde_json::to_string_pretty(&pipeline.dsi(&table)?),
        Endpoint::Reliability => serde_json::to_string_pretty(&pipeline.reliability(&table)?),
        Endpoint::Clusters => serde_json::to_string_pretty(&pipeline.clusters(&table)?),
        Endpoint::Insights => serde_json::to_string_pretty(&pipeline.insights(&table)?),
    };
    json.context("Failed to serialize result")
}
