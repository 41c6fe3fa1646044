//! coinlake CLI: the invocation framework around the ingestion pipeline.
//!
//! Commands:
//! - `run`: fetch the bitcoin quote once, store it, print the response
//! - `status`: list date partitions and object counts in a local store bucket
//!
//! Logs go to stderr (`RUST_LOG` controls the level, default `info`); stdout
//! carries only the JSON response so schedulers can capture it.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use coinlake_core::config::{IngestConfig, StoreConfig};
use coinlake_core::store::LocalObjectStore;
use coinlake_core::{IngestionPipeline, InvocationResponse, TriggerEvent};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "coinlake",
    about = "coinlake: scheduled bitcoin price ingestion into a partitioned object store"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by every command; they override the config file and environment.
#[derive(clap::Args)]
struct ConfigArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Destination bucket (overrides BUCKET_NAME).
    #[arg(long)]
    bucket: Option<String>,

    /// Write to a local directory store rooted here.
    #[arg(long, conflicts_with = "store_endpoint")]
    store_root: Option<PathBuf>,

    /// Write to an S3-style HTTP endpoint instead of the local store. With an
    /// S3 store configured, this replaces its endpoint instead.
    #[arg(long)]
    store_endpoint: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one ingestion invocation.
    Run {
        #[command(flatten)]
        config: ConfigArgs,

        /// Price API endpoint (overrides COINLAKE_PRICE_URL).
        #[arg(long)]
        price_url: Option<String>,

        /// Trigger event payload as JSON. Passed through to the logs only.
        #[arg(long, default_value = "{}")]
        event: String,
    },
    /// List stored date partitions for a local store bucket.
    Status {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            price_url,
            event,
        } => run_invocation(config, price_url, &event),
        Commands::Status { config } => run_status(config),
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Defaults < config file < environment < flags.
fn resolve_config(args: ConfigArgs) -> Result<IngestConfig> {
    let mut config = match args.config.as_deref() {
        Some(path) => IngestConfig::load(path)?,
        None => IngestConfig::default(),
    };
    config.apply_env()?;

    if let Some(bucket) = args.bucket {
        config.bucket = Some(bucket);
    }
    if let Some(root) = args.store_root {
        config.store = StoreConfig::Local { root };
    }
    if let Some(endpoint) = args.store_endpoint {
        config.store = match config.store {
            StoreConfig::Http { timeout_secs, .. } => StoreConfig::Http {
                endpoint,
                timeout_secs,
            },
            StoreConfig::S3 {
                region,
                access_key_id,
                secret_access_key,
                ..
            } => StoreConfig::S3 {
                region,
                endpoint: Some(endpoint),
                access_key_id,
                secret_access_key,
            },
            StoreConfig::Local { .. } => StoreConfig::http(endpoint),
        };
    }
    Ok(config)
}

fn run_invocation(args: ConfigArgs, price_url: Option<String>, event: &str) -> Result<()> {
    let mut config = resolve_config(args)?;
    if let Some(url) = price_url {
        config.source.url = url;
    }

    let payload: serde_json::Value =
        serde_json::from_str(event).context("--event must be valid JSON")?;
    let pipeline = IngestionPipeline::from_config(&config)?;

    let response = match pipeline.run(&TriggerEvent::new(payload)) {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Invocation failed");
            InvocationResponse::from_error(&e)
        }
    };

    println!("{}", serde_json::to_string(&response)?);

    if !response.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

fn run_status(args: ConfigArgs) -> Result<()> {
    let config = resolve_config(args)?;
    let Some(bucket) = config.destination() else {
        bail!("no bucket configured: pass --bucket or set BUCKET_NAME");
    };
    let root = match &config.store {
        StoreConfig::Local { root } => root.clone(),
        StoreConfig::Http { endpoint, .. } => {
            bail!("status only inspects local stores (configured: {endpoint})")
        }
        StoreConfig::S3 { region, .. } => {
            bail!("status only inspects local stores (configured: S3 in {region})")
        }
    };

    print_partitions(&root, bucket)
}

fn print_partitions(root: &Path, bucket: &str) -> Result<()> {
    let store = LocalObjectStore::new(root);
    let partitions = store.partitions(bucket)?;

    if partitions.is_empty() {
        println!("No objects in {}/{bucket}", root.display());
        return Ok(());
    }

    println!("Store: {}/{bucket}", root.display());
    println!("{:<12} {:>8}", "date", "objects");
    println!("{}", "-".repeat(21));
    let mut total = 0;
    for p in &partitions {
        println!("{:<12} {:>8}", p.date.to_string(), p.object_count);
        total += p.object_count;
    }
    println!("{}", "-".repeat(21));
    println!("{:<12} {:>8}", "total", total);
    Ok(())
}
