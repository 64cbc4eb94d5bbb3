//! Client configuration loading.
//!
//! Settings come from an optional TOML file plus `HINATURE`-prefixed
//! environment variables, the latter taking precedence. Credentials are
//! immutable for the lifetime of a client instance.

use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

/// Connection settings for one HinatureDB backend.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSettings {
    /// Base URL of the server, e.g. `https://hinature.example.org`.
    pub server_url: String,
    pub username: String,
    pub password: String,
    /// Per-request timeout applied uniformly to authenticated calls.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Total attempts per call, including the initial one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

/// Loads [`ClientSettings`] from an optional TOML file and the environment.
///
/// Environment variables use the `HINATURE_` prefix, e.g.
/// `HINATURE_SERVER_URL`, `HINATURE_USERNAME`, `HINATURE_PASSWORD`.
pub fn load_settings(path: Option<&Path>) -> Result<ClientSettings> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        let filename = path.to_str().context("Invalid config file path")?;
        builder = builder.add_source(config::File::with_name(filename));
    }

    let cfg = builder
        .add_source(Environment::with_prefix("HINATURE").prefix_separator("_"))
        .build()
        .context("Could not build client configuration")?;

    cfg.try_deserialize()
        .context("Invalid client configuration")
}
