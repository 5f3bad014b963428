//! Stowage - one storage facade over many object storage providers

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::TryStreamExt;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use config::Config;
use stowage_api::{AppInfo, AppState, MetricsHandle, create_router};
use stowage_storage::{LoadedObject, ProviderType, Storage};

/// Latency buckets for storage requests, in seconds
const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
];

/// Stowage - storage facade with per-operation metrics
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "STOWAGE_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "STOWAGE_PORT")]
    port: Option<u16>,

    /// Storage provider, overriding `storage.backend`
    #[arg(long, env = "STOWAGE_STORAGE_BACKEND")]
    storage_backend: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Upload a local file
    Put { key: String, file: PathBuf },
    /// Write an object to stdout
    Get {
        key: String,
        /// Stream the object instead of loading it into memory
        #[arg(long)]
        stream: bool,
    },
    /// Download an object to a local path
    Download { key: String, path: PathBuf },
    /// Check whether an object exists
    Exists { key: String },
    /// Delete an object
    Rm { key: String },
    /// List the supported storage providers
    Providers,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load(&args.config)?;
    if let Some(backend) = args.storage_backend.clone() {
        config.storage.backend = backend;
    }

    // Initialize logging
    init_logging(&config.logging.level, &config.logging.format);

    let command = args.command.unwrap_or(Command::Serve);
    if let Command::Providers = command {
        for provider in ProviderType::ALL {
            println!("{}", provider);
        }
        return Ok(());
    }

    let metrics_handle = if config.metrics.enabled {
        Some(Arc::new(init_metrics()?))
    } else {
        None
    };

    // Initialize storage; an unknown provider stops the process here
    let storage = Arc::new(
        Storage::init(&config.storage)
            .await
            .with_context(|| format!("Failed to initialize storage '{}'", config.storage.backend))?,
    );

    match command {
        Command::Serve => serve(config, args.bind, args.port, storage, metrics_handle).await,
        Command::Put { key, file } => {
            let data = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {:?}", file))?;
            storage.save(&key, data).await?;
            info!("Saved {}", key);
            Ok(())
        }
        Command::Get { key, stream } => {
            let mut stdout = tokio::io::stdout();
            match storage.load(&key, stream).await? {
                LoadedObject::Buffered(data) => stdout.write_all(&data).await?,
                LoadedObject::Streamed(mut chunks) => {
                    while let Some(chunk) = chunks.try_next().await? {
                        stdout.write_all(&chunk).await?;
                    }
                }
            }
            stdout.flush().await?;
            Ok(())
        }
        Command::Download { key, path } => {
            storage.download(&key, &path).await?;
            info!("Downloaded {} to {:?}", key, path);
            Ok(())
        }
        Command::Exists { key } => {
            println!("{}", storage.exists(&key).await?);
            Ok(())
        }
        Command::Rm { key } => {
            storage.delete(&key).await?;
            info!("Deleted {}", key);
            Ok(())
        }
        Command::Providers => Ok(()),
    }
}

/// Run the HTTP server until Ctrl-C
async fn serve(
    config: Config,
    bind: Option<String>,
    port: Option<u16>,
    storage: Arc<Storage>,
    metrics_handle: Option<Arc<MetricsHandle>>,
) -> Result<()> {
    info!(
        "Starting Stowage v{} ({})",
        config.app.version, config.app.env
    );

    let state = AppState::new(
        storage.clone(),
        AppInfo {
            version: config.app.version.clone(),
            env: config.app.env.clone(),
        },
    );

    let app = create_router(state, metrics_handle).layer(TraceLayer::new_for_http());

    // Determine bind address
    let bind_addr = bind.unwrap_or(config.server.bind_address);
    let port = port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind_addr, port).parse()?;

    info!("Listening on {}", addr);
    info!("Storage provider: {}", storage.provider());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if format.eq_ignore_ascii_case("json") {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Install the Prometheus recorder and describe the storage metrics
fn init_metrics() -> Result<MetricsHandle> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(stowage_storage::metrics::REQUEST_LATENCY.to_string()),
            LATENCY_BUCKETS,
        )?
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    stowage_storage::metrics::describe_metrics();
    info!("Prometheus metrics exporter initialized");

    Ok(handle)
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
