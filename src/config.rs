//! Configuration management for llm-relay
//!
//! Configuration is loaded from environment variables once at startup.
//! Provider secrets are captured here so that nothing downstream reads the
//! process environment.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::HeaderName;

use crate::proxy::provider::{default_provider_specs, ProviderSpec, Secret};

/// Default name of the trust-boundary header shared by callers and the relay
pub const DEFAULT_INTERNAL_TOKEN_HEADER: &str = "x-internal-token";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    /// Header carrying the internal token; always stripped before forwarding
    pub internal_token_header: HeaderName,
    /// Expected internal token value. Verification is disabled when unset.
    pub internal_token: Option<Secret>,

    /// Provider table (compiled-in defaults plus any loaded from file)
    pub providers: Vec<ProviderSpec>,
    /// Secrets keyed by environment variable name
    pub secrets: HashMap<String, Secret>,

    /// Upstream connect timeout
    pub connect_timeout: Duration,
    /// Total upstream request timeout
    pub request_timeout: Option<Duration>,
    /// Maximum gap between two upstream response body chunks
    pub idle_timeout: Option<Duration>,

    /// Emit logs as JSON
    pub json_logs: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let internal_token_header = lookup("RELAY_INTERNAL_TOKEN_HEADER")
            .unwrap_or_else(|| DEFAULT_INTERNAL_TOKEN_HEADER.to_string());
        let internal_token_header = HeaderName::from_bytes(internal_token_header.as_bytes())
            .context("Invalid RELAY_INTERNAL_TOKEN_HEADER")?;

        let providers = match lookup("RELAY_PROVIDERS_FILE") {
            Some(path) => merge_provider_specs(
                default_provider_specs(),
                load_provider_file(&PathBuf::from(path))?,
            ),
            None => default_provider_specs(),
        };

        let secrets = providers
            .iter()
            .filter_map(|spec| {
                lookup(&spec.secret_env)
                    .filter(|value| !value.is_empty())
                    .map(|value| (spec.secret_env.clone(), Secret::new(value)))
            })
            .collect();

        Ok(Self {
            host: lookup("RELAY_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: lookup("RELAY_PORT")
                .unwrap_or_else(|| "8787".to_string())
                .parse()
                .context("Invalid RELAY_PORT")?,

            internal_token_header,
            internal_token: lookup("RELAY_INTERNAL_TOKEN")
                .filter(|value| !value.is_empty())
                .map(Secret::new),

            providers,
            secrets,

            connect_timeout: Duration::from_secs(
                lookup("RELAY_CONNECT_TIMEOUT_SECS")
                    .unwrap_or_else(|| "10".to_string())
                    .parse()
                    .context("Invalid RELAY_CONNECT_TIMEOUT_SECS")?,
            ),
            request_timeout: parse_secs(&lookup, "RELAY_REQUEST_TIMEOUT_SECS")?,
            idle_timeout: parse_secs(&lookup, "RELAY_IDLE_TIMEOUT_SECS")?,

            json_logs: lookup("RELAY_LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        })
    }
}

fn parse_secs<F>(lookup: &F, key: &str) -> Result<Option<Duration>>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.parse::<u64>()
                .map(Duration::from_secs)
                .with_context(|| format!("Invalid {}", key))
        })
        .transpose()
}

/// Read a JSON array of provider records
fn load_provider_file(path: &PathBuf) -> Result<Vec<ProviderSpec>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read provider file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Invalid provider file {}", path.display()))
}

/// Append `extra` to `base`, replacing entries that share a key
fn merge_provider_specs(mut base: Vec<ProviderSpec>, extra: Vec<ProviderSpec>) -> Vec<ProviderSpec> {
    for spec in extra {
        base.retain(|existing| existing.key != spec.key);
        base.push(spec);
    }
    base
}
