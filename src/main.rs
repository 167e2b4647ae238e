//! Event ingestion and analytics gateway.
//!
//! Two-headed engine in front of ClickHouse:
//! - ingest: bounded queue plus a size/interval-triggered batch flusher
//! - read: typed analytics queries compiled to parameterised SQL

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

use api::{router, AppState};
use clickhouse_store::{schema, Store, StoreConfig};
use gateway_core::limits::SHUTDOWN_GRACE;
use pipeline::{Batcher, Queue};
use telemetry::init_tracing_from_env;

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    /// API key required on /v1/* routes; unset disables authentication.
    api_key: Option<String>,

    #[serde(default)]
    clickhouse: StoreConfig,

    /// Events per flush.
    #[serde(default = "default_batch_size")]
    batch_size: usize,
    /// Flush interval, e.g. "5s".
    #[serde(default = "default_flush_interval")]
    flush_interval: String,
    /// Queue capacity; overflow drops events.
    #[serde(default = "default_queue_size")]
    queue_size: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_batch_size() -> usize {
    1000
}

fn default_flush_interval() -> String {
    "5s".to_string()
}

fn default_queue_size() -> usize {
    100_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_key: None,
            clickhouse: StoreConfig::default(),
            batch_size: default_batch_size(),
            flush_interval: default_flush_interval(),
            queue_size: default_queue_size(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("starting monitor-gateway v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    if config.api_key.is_none() {
        warn!("API_KEY is not set, authentication is disabled");
    }

    let flush_interval = humantime::parse_duration(&config.flush_interval)
        .context("invalid FLUSH_INTERVAL")?;

    // Connect to ClickHouse; an unreachable store is fatal at startup.
    let store = Arc::new(Store::new(config.clickhouse.clone()));
    store
        .ping()
        .await
        .context("failed to reach ClickHouse")?;

    if let Err(e) = schema::init_schema(&store).await {
        // The table usually exists already; a bootstrap failure is not fatal.
        error!("failed to initialize schema: {e}");
    }

    // Ingest pipeline: queue plus single-consumer batcher.
    let (queue, consumer) = Queue::with_capacity(config.queue_size);
    let queue = Arc::new(queue);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let batcher = Batcher::new(consumer, store.clone(), config.batch_size, flush_interval);
    let batcher_handle = tokio::spawn(batcher.run(shutdown_rx));

    info!(
        batch_size = config.batch_size,
        flush_interval = %config.flush_interval,
        queue_size = config.queue_size,
        "started batcher"
    );

    let state = AppState::new(store.clone(), queue.clone(), config.api_key.clone());
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid server address")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind to address")?;

    info!("listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shutting down...");

    // Stop the batcher; its final flush persists whatever is still queued.
    let _ = shutdown_tx.send(true);
    queue.close();

    if tokio::time::timeout(SHUTDOWN_GRACE, batcher_handle)
        .await
        .is_err()
    {
        error!(
            "batcher did not stop within {}s",
            SHUTDOWN_GRACE.as_secs()
        );
    }

    info!("shutdown complete");
    Ok(())
}

/// Load configuration from defaults, optional file and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        .add_source(config::Config::try_from(&Config::default())?)
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("GATEWAY")
                .try_parsing(true),
        )
        .build()
        .context("failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("failed to deserialize configuration")?;

    // Flat overrides for the documented variable names.
    if let Ok(port) = std::env::var("HTTP_PORT") {
        config.port = port.parse().context("invalid HTTP_PORT")?;
    }
    if let Ok(addr) = std::env::var("CLICKHOUSE_ADDR") {
        config.clickhouse.addr = addr;
    }
    if let Ok(database) = std::env::var("CLICKHOUSE_DATABASE") {
        config.clickhouse.database = database;
    }
    if let Ok(username) = std::env::var("CLICKHOUSE_USERNAME") {
        config.clickhouse.username = Some(username);
    }
    if let Ok(password) = std::env::var("CLICKHOUSE_PASSWORD") {
        config.clickhouse.password = Some(password);
    }
    if let Ok(api_key) = std::env::var("API_KEY") {
        if !api_key.is_empty() {
            config.api_key = Some(api_key);
        }
    }
    if let Ok(batch_size) = std::env::var("BATCH_SIZE") {
        config.batch_size = batch_size.parse().context("invalid BATCH_SIZE")?;
    }
    if let Ok(flush_interval) = std::env::var("FLUSH_INTERVAL") {
        config.flush_interval = flush_interval;
    }
    if let Ok(queue_size) = std::env::var("QUEUE_SIZE") {
        config.queue_size = queue_size.parse().context("invalid QUEUE_SIZE")?;
    }

    Ok(config)
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("received Ctrl+C signal");
        }
        _ = terminate => {
            info!("received terminate signal");
        }
    }
}
