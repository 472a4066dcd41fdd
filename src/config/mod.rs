// Configuration module entry point
// Loads the layered configuration once and exposes the shared application state

mod state;
mod types;

use std::net::SocketAddr;

pub use state::AppState;
pub use types::{
    Config, HealthConfig, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig,
    StorageConfig, UploadConfig,
};

/// Environment variable prefix, e.g. `PICDROP__SERVER__PORT=9000`
const ENV_PREFIX: &str = "PICDROP";

impl Config {
    /// Load configuration from the given file path (extension optional).
    ///
    /// A missing file is fine and leaves the defaults in place; a file that
    /// exists but fails to parse is an error.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("storage.upload_dir", "./uploads")?
            .set_default("storage.serve_path", "/i/")?
            .set_default("storage.static_dir", "./static")?
            .set_default("storage.static_prefix", "/static/")?
            .set_default("storage.name_length", 6)?
            .set_default("storage.max_name_attempts", 8)?
            .set_default("upload.max_file_size", 5_242_880)? // 5MB
            .set_default("upload.max_request_size", 10_485_760)? // 10MB
            .set_default("upload.max_remote_size", 5_242_880)?
            .set_default("upload.sniff_content", true)?
            .set_default("upload.allowed_types", vec!["image/", "video/"])?
            .set_default("upload.fetch_timeout", 30)?
            .set_default("upload.allow_private_hosts", false)?
            .set_default("performance.read_timeout", 15)?
            .set_default("performance.connection_timeout", 600)?
            .set_default("performance.shutdown_timeout", 15)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "text")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("http.server_name", "picdrop")?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let mut cfg: Self = settings.try_deserialize()?;
        cfg.storage.serve_path = normalize_prefix(&cfg.storage.serve_path);
        cfg.storage.static_prefix = normalize_prefix(&cfg.storage.static_prefix);
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// URL at which a stored file with the given name is served
    pub fn serve_url(&self, name: &str) -> String {
        format!("{}{name}", self.storage.serve_path)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.server.workers == Some(0) {
            return Err(config::ConfigError::Message(
                "server.workers must be at least 1".to_string(),
            ));
        }
        if self.storage.name_length == 0 {
            return Err(config::ConfigError::Message(
                "storage.name_length must be at least 1".to_string(),
            ));
        }
        if self.storage.max_name_attempts == 0 {
            return Err(config::ConfigError::Message(
                "storage.max_name_attempts must be at least 1".to_string(),
            ));
        }
        if self.storage.serve_path == "/" {
            return Err(config::ConfigError::Message(
                "storage.serve_path must not be the root path".to_string(),
            ));
        }
        if !matches!(self.logging.format.as_str(), "text" | "json") {
            return Err(config::ConfigError::Message(format!(
                "logging.format must be 'text' or 'json', got '{}'",
                self.logging.format
            )));
        }
        Ok(())
    }
}

/// Force a URL prefix into `/segment/` shape
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}
