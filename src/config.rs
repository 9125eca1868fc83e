//! Configuration parsing and validation for the shim
//!
//! This module handles command-line argument parsing and validation using clap.
//! Credentials can also be supplied through the environment.
use aishim::client::PoolSettings;
use anyhow::anyhow;
use clap::{ArgAction, Parser};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// The port on which the shim will listen.
    #[arg(short = 'p', long, default_value_t = 3000)]
    pub port: u16,

    /// The port on which the metrics server will listen.
    #[arg(long, default_value_t = 9090)]
    pub metrics_port: u16,

    /// Whether to enable the metrics endpoint.
    #[arg(short = 'm', long, default_value_t = true, action = ArgAction::Set)]
    pub metrics: bool,

    /// The prefix to use for metrics.
    #[arg(long, default_value = "aishim")]
    pub metrics_prefix: String,

    /// Account that owns the Workers AI deployment.
    #[arg(long, env = "CLOUDFLARE_ACCOUNT_ID")]
    pub account_id: String,

    /// API token used as the bearer credential for inference calls.
    #[arg(long, env = "CLOUDFLARE_API_TOKEN", hide_env_values = true)]
    pub api_token: String,

    /// Base URL of the inference REST API.
    #[arg(long, default_value = "https://api.cloudflare.com/client/v4/")]
    pub base_url: Url,

    /// Maximum number of idle HTTP connections to keep alive per upstream host.
    #[arg(long, default_value_t = 100)]
    pub pool_max_idle_per_host: usize,

    /// How long (in seconds) to keep idle HTTP connections alive.
    #[arg(long, default_value_t = 90)]
    pub pool_idle_timeout_secs: u64,
}

impl Config {
    pub fn validate(self) -> Result<Self, anyhow::Error> {
        if self.account_id.trim().is_empty() {
            return Err(anyhow!("An account id is required"));
        }
        if self.api_token.trim().is_empty() {
            return Err(anyhow!("An API token is required"));
        }
        if !matches!(self.base_url.scheme(), "http" | "https") {
            return Err(anyhow!(
                "Base URL '{}' must use http or https",
                self.base_url
            ));
        }
        Ok(self)
    }

    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            idle_timeout: Duration::from_secs(self.pool_idle_timeout_secs),
            max_idle_per_host: self.pool_max_idle_per_host,
        }
    }
}
