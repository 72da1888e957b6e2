//! Upstream provider definitions
//!
//! A provider is a base URL plus a strategy for attaching credentials to
//! outbound requests. Records are plain data (`ProviderSpec`) so the table can
//! be compiled in or loaded from a file; they are validated into
//! `ProviderConfig` once at startup.

use std::fmt;

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::error::{AppError, AppResult};

/// An opaque credential string
///
/// The value never appears in `Debug` output, so configs and providers can be
/// logged freely.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw secret value
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(****)")
    }
}

/// How credentials are attached, as written in the provider table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InjectionSpec {
    /// `Authorization: Bearer <secret>`
    Bearer,
    /// `<name>: <secret>`
    Header { name: String },
    /// `?<name>=<secret>` on the destination URL
    Query { name: String },
}

/// One row of the provider table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSpec {
    /// Path segment that selects this provider
    pub key: String,
    pub base_url: String,
    pub injection: InjectionSpec,
    /// Environment variable holding the provider secret
    pub secret_env: String,
}

impl ProviderSpec {
    pub fn new(
        key: impl Into<String>,
        base_url: impl Into<String>,
        injection: InjectionSpec,
        secret_env: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            base_url: base_url.into(),
            injection,
            secret_env: secret_env.into(),
        }
    }
}

/// The compiled-in provider table
pub fn default_provider_specs() -> Vec<ProviderSpec> {
    vec![
        ProviderSpec::new(
            "openai",
            "https://api.openai.com",
            InjectionSpec::Bearer,
            "OPENAI_API_KEY",
        ),
        ProviderSpec::new(
            "gemini",
            "https://generativelanguage.googleapis.com",
            InjectionSpec::Query {
                name: "key".to_string(),
            },
            "GOOGLE_API_KEY",
        ),
        ProviderSpec::new(
            "anthropic",
            "https://api.anthropic.com",
            InjectionSpec::Header {
                name: "x-api-key".to_string(),
            },
            "ANTHROPIC_API_KEY",
        ),
    ]
}

/// Validated credential injection strategy
///
/// `apply` is a pure function of its arguments. It runs after header
/// sanitization and replaces any value the caller supplied for the same
/// header or query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectionStrategy {
    Bearer,
    Header(HeaderName),
    QueryParam(String),
}

impl InjectionStrategy {
    fn from_spec(spec: &InjectionSpec) -> Result<Self> {
        match spec {
            InjectionSpec::Bearer => Ok(Self::Bearer),
            InjectionSpec::Header { name } => HeaderName::from_bytes(name.as_bytes())
                .map(Self::Header)
                .with_context(|| format!("Invalid credential header name '{}'", name)),
            InjectionSpec::Query { name } if !name.is_empty() => Ok(Self::QueryParam(name.clone())),
            InjectionSpec::Query { .. } => anyhow::bail!("Credential query parameter name is empty"),
        }
    }

    /// Attach `secret` to the outbound headers or destination URL
    pub fn apply(&self, headers: &mut HeaderMap, url: &mut Url, secret: &Secret) -> AppResult<()> {
        match self {
            Self::Bearer => {
                let value = sensitive_value(&format!("Bearer {}", secret.expose()))?;
                headers.insert(AUTHORIZATION, value);
            }
            Self::Header(name) => {
                let value = sensitive_value(secret.expose())?;
                headers.insert(name.clone(), value);
            }
            Self::QueryParam(name) => {
                // Existing pairs are kept byte-for-byte; pairs whose decoded name
                // matches are dropped.
                let retained = url
                    .query()
                    .unwrap_or_default()
                    .split('&')
                    .filter(|pair| !pair.is_empty() && !pair_has_name(pair, name))
                    .collect::<Vec<_>>()
                    .join("&");
                url.set_query(if retained.is_empty() { None } else { Some(&retained) });
                url.query_pairs_mut().append_pair(name, secret.expose());
            }
        }
        Ok(())
    }
}

/// Whether a raw `name=value` query pair carries `name` once form-decoded
fn pair_has_name(pair: &str, name: &str) -> bool {
    form_urlencoded::parse(pair.as_bytes())
        .next()
        .is_some_and(|(decoded, _)| decoded == name)
}

fn sensitive_value(raw: &str) -> AppResult<HeaderValue> {
    let mut value = HeaderValue::from_str(raw).map_err(|_| AppError::InvalidCredential)?;
    value.set_sensitive(true);
    Ok(value)
}

/// A provider ready to serve requests
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub name: String,
    pub base_url: Url,
    pub injection: InjectionStrategy,
    pub secret_env: String,
    secret: Option<Secret>,
}

impl ProviderConfig {
    /// Validate a table record. `secret` is `None` when the variable was unset.
    pub fn from_spec(spec: &ProviderSpec, secret: Option<Secret>) -> Result<Self> {
        let base_url = Url::parse(&spec.base_url)
            .with_context(|| format!("Invalid base URL for provider '{}'", spec.key))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Base URL for provider '{}' cannot carry a path", spec.key);
        }

        Ok(Self {
            name: spec.key.clone(),
            base_url,
            injection: InjectionStrategy::from_spec(&spec.injection)
                .with_context(|| format!("Invalid injection for provider '{}'", spec.key))?,
            secret_env: spec.secret_env.clone(),
            secret,
        })
    }

    /// Whether the provider secret was present at startup
    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// The provider secret, or `MissingCredential`
    pub fn credential(&self) -> AppResult<&Secret> {
        self.secret.as_ref().ok_or_else(|| AppError::MissingCredential {
            provider: self.name.clone(),
            env_var: self.secret_env.clone(),
        })
    }

    /// Attach this provider's credentials to an outbound request
    pub fn inject(&self, headers: &mut HeaderMap, url: &mut Url) -> AppResult<()> {
        let secret = self.credential()?;
        self.injection.apply(headers, url, secret)
    }
}
