//! Command line interface
//!
//! Flags override the configuration file and environment.

use clap::Parser;

use crate::config::Config;

#[derive(Debug, Parser)]
#[command(name = "picdrop", version, about = "Minimal image and video hosting server")]
pub struct Cli {
    /// Configuration file (TOML); a missing file leaves the defaults in place
    #[arg(short, long, default_value = "config.toml", env = "PICDROP_CONFIG")]
    pub config: String,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Seconds to wait for open connections on shutdown
    #[arg(long, value_name = "SECS")]
    pub graceful_timeout: Option<u64>,
}

impl Cli {
    /// Apply command line overrides on top of the loaded configuration
    pub fn apply(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(secs) = self.graceful_timeout {
            config.performance.shutdown_timeout = secs;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["picdrop"]).unwrap();
        assert_eq!(cli.config, "config.toml");
        assert!(cli.port.is_none());
        assert!(cli.graceful_timeout.is_none());
    }

    #[test]
    fn test_overrides_apply() {
        let cli = Cli::try_parse_from([
            "picdrop",
            "--config",
            "/etc/picdrop.toml",
            "-p",
            "9000",
            "--graceful-timeout",
            "3",
        ])
        .unwrap();
        assert_eq!(cli.config, "/etc/picdrop.toml");

        let mut config = Config::load_from("/nonexistent/picdrop-config").unwrap();
        cli.apply(&mut config);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.performance.shutdown_timeout, 3);
    }

    #[test]
    fn test_rejects_bad_port() {
        assert!(Cli::try_parse_from(["picdrop", "--port", "70000"]).is_err());
    }
}
