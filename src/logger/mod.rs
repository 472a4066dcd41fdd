//! Logger module
//!
//! Thin facade over `tracing`:
//! - subscriber setup (text or JSON, level from config or `RUST_LOG`)
//! - server lifecycle logging
//! - access logging in combined, common or JSON format
//! - upload outcome logging

mod format;

pub use format::AccessLogEntry;

use crate::config::{Config, LoggingConfig};
use std::net::SocketAddr;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Target used for access log lines so they can be filtered separately
pub const ACCESS_TARGET: &str = "picdrop::access";

/// Install the global subscriber
///
/// Should be called once at application startup. `RUST_LOG` takes precedence
/// over `logging.level`.
pub fn init(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))?;

    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .try_init()?;
    } else {
        registry.with(fmt::layer().with_target(false)).try_init()?;
    }
    Ok(())
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    tracing::info!(
        listen = %format!("http://{addr}"),
        upload_dir = %config.storage.upload_dir,
        serve_path = %config.storage.serve_path,
        max_file_size = config.upload.max_file_size,
        workers = ?config.server.workers,
        "server started"
    );
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    tracing::debug!(peer = %peer_addr, "connection accepted");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    tracing::error!(error = ?err, "failed to serve connection");
}

pub fn log_error(message: &str) {
    tracing::error!("{message}");
}

pub fn log_warning(message: &str) {
    tracing::warn!("{message}");
}

/// Log a successfully stored upload
pub fn log_stored(name: &str, size: u64, content_type: &str, source: &str) {
    tracing::info!(%name, size, %content_type, %source, "file stored");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    tracing::info!(target: ACCESS_TARGET, "{}", entry.format(format));
}

pub fn log_shutdown_started(open_connections: usize, grace_secs: u64) {
    tracing::info!(
        open_connections,
        grace_secs,
        "shutdown signal received, draining connections"
    );
}

pub fn log_shutdown_finished(drained: bool) {
    if drained {
        tracing::info!("all connections closed, shutting down");
    } else {
        tracing::warn!("grace period elapsed with connections still open, shutting down");
    }
}
