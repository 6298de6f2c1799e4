//! Kubernetes Cost Estimator CLI
//!
//! Estimates the monthly GKE cost of Kubernetes manifests, and the cost
//! difference between two versions of them.

mod client;
mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use estimator_lib::{EstimatorMetrics, PriceCatalog, ResolvedConfig, StaticPriceCatalog};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Where unit prices come from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum PriceSource {
    /// Prices from the `pricing` section of the configuration
    #[default]
    Static,
    /// Prices from the GCP Cloud Billing catalog
    Gcp,
}

/// Kubernetes Cost Estimator CLI
#[derive(Parser)]
#[command(name = "kce")]
#[command(author, version, about = "Kubernetes Cost Estimator: monthly GKE cost of your manifests", long_about = None)]
pub struct Cli {
    /// Configuration file (YAML, TOML or JSON); defaults to ~/.config/kce/config.yaml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short, global = true, default_value = "table")]
    pub format: output::OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(long, short, global = true)]
    pub output: Option<PathBuf>,

    /// Price source
    #[arg(long, global = true, default_value = "static")]
    pub prices: PriceSource,

    /// Cloud Billing API key, required with `--prices gcp`
    #[arg(long, global = true, env = "KCE_BILLING_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Cloud Billing API endpoint
    #[arg(long, global = true, default_value = client::DEFAULT_BILLING_URL)]
    pub billing_url: String,

    /// Write Prometheus metrics of the run to this file
    #[arg(long, global = true)]
    pub metrics_file: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Log as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Estimate the monthly cost of a manifest file or directory
    Estimate {
        /// Manifest file or directory
        #[arg(long)]
        k8s: PathBuf,
    },

    /// Compare the monthly cost of two manifest versions
    Diff {
        /// Current manifest file or directory
        #[arg(long)]
        k8s: PathBuf,

        /// Previous manifest file or directory
        #[arg(long)]
        k8s_prev: PathBuf,
    },
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn price_catalog(cli: &Cli, config: &ResolvedConfig) -> Result<Box<dyn PriceCatalog>> {
    match cli.prices {
        PriceSource::Static => {
            let catalog = StaticPriceCatalog::from_config(&config.pricing).context(
                "Static prices are not configured; set them in the config file or use --prices gcp",
            )?;
            Ok(Box::new(catalog))
        }
        PriceSource::Gcp => {
            let api_key = cli
                .api_key
                .as_deref()
                .context("--api-key (or KCE_BILLING_API_KEY) is required with --prices gcp")?;
            let billing = client::BillingClient::new(&cli.billing_url, api_key)?;
            Ok(Box::new(billing.fetch_catalog(&config.pricing).await?))
        }
    }
}

fn write_metrics(path: &Path) -> Result<()> {
    let text = EstimatorMetrics::new()
        .render()
        .context("Failed to encode metrics")?;
    std::fs::write(path, text)
        .with_context(|| format!("Failed to write metrics to '{}'", path.display()))?;
    debug!(path = %path.display(), "Metrics written");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let config = config::load(cli.config.as_deref())?.resolve();
    info!(
        machine_family = %config.pricing.machine_family,
        region = %config.pricing.region,
        nodes_count = config.cluster.nodes_count,
        "Configuration resolved"
    );

    let catalog = price_catalog(&cli, &config).await?;
    let output = cli.output.as_deref();

    match &cli.command {
        Commands::Estimate { k8s } => {
            commands::estimate::run(k8s, &config, catalog.as_ref(), cli.format, output)?;
        }
        Commands::Diff { k8s, k8s_prev } => {
            commands::diff::run(k8s, k8s_prev, &config, catalog.as_ref(), cli.format, output)?;
        }
    }

    if let Some(path) = &cli.metrics_file {
        write_metrics(path)?;
    }

    Ok(())
}
