// Application state module
// Holds the immutable configuration and the handles every request needs

use std::sync::Arc;
use std::time::Duration;

use super::types::Config;
use crate::handler::remote;
use crate::storage::UploadStore;

/// Application state, shared by `Arc` between all connections
pub struct AppState {
    pub config: Config,
    pub store: UploadStore,
    /// HTTP client used by `POST /url`
    pub client: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(format!(
                "{}/{}",
                config.http.server_name,
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(Duration::from_secs(config.upload.fetch_timeout))
            .redirect(remote::redirect_policy(config.upload.allow_private_hosts))
            .build()?;

        let store = UploadStore::new(
            &config.storage.upload_dir,
            config.storage.name_length,
            config.storage.max_name_attempts,
        );

        Ok(Self {
            config,
            store,
            client,
        })
    }

    pub fn shared(config: Config) -> Result<Arc<Self>, reqwest::Error> {
        Self::new(config).map(Arc::new)
    }
}
