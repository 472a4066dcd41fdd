// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub upload: UploadConfig,
    pub performance: PerformanceConfig,
    pub logging: LoggingConfig,
    pub http: HttpConfig,
    #[serde(default)]
    pub health: HealthConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Where uploads live on disk and under which URL prefixes they are served
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub upload_dir: String,
    /// URL prefix for stored files, e.g. `/i/`
    pub serve_path: String,
    pub static_dir: String,
    pub static_prefix: String,
    /// Length of the random part of generated names
    pub name_length: usize,
    /// How many fresh names to try before giving up on a collision
    pub max_name_attempts: u32,
}

/// Upload acceptance policy
#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    pub max_file_size: u64,
    pub max_request_size: u64,
    pub max_remote_size: u64,
    pub sniff_content: bool,
    /// Accepted MIME type prefixes (`image/`, `video/`)
    pub allowed_types: Vec<String>,
    /// Remote fetch timeout in seconds
    pub fetch_timeout: u64,
    /// Let `POST /url` fetch from loopback, private and link-local hosts
    pub allow_private_hosts: bool,
}

/// Performance configuration (all durations in seconds)
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    /// Deadline for each request's headers, including the wait between
    /// keep-alive requests
    pub read_timeout: u64,
    /// Hard cap on a connection's total lifetime
    pub connection_timeout: u64,
    pub shutdown_timeout: u64,
    pub max_connections: Option<u64>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    /// `text` or `json`
    pub format: String,
    pub access_log: bool,
    /// Access log format (combined, common or json)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
}

/// Health check configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HealthConfig {
    #[serde(default = "default_health_enabled")]
    pub enabled: bool,
    #[serde(default = "default_health_path")]
    pub path: String,
}

#[allow(clippy::missing_const_for_fn)]
fn default_health_enabled() -> bool {
    true
}

#[allow(clippy::missing_const_for_fn)]
fn default_health_path() -> String {
    "/healthz".to_string()
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: default_health_enabled(),
            path: default_health_path(),
        }
    }
}
