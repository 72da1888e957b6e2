//! Provider registry
//!
//! Read-only lookup table from path segment to provider. Built once at
//! startup and shared across requests without locking.

use std::collections::HashMap;

use anyhow::Result;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::proxy::provider::{ProviderConfig, ProviderSpec, Secret};

#[derive(Debug, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, ProviderConfig>,
}

impl ProviderRegistry {
    /// Build the registry from the loaded configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::from_specs(&config.providers, &config.secrets)
    }

    /// Build the registry from table records and the secrets available
    ///
    /// Providers whose secret is missing are still registered; requests to them
    /// fail with `MissingCredential` instead of reaching the upstream.
    pub fn from_specs(specs: &[ProviderSpec], secrets: &HashMap<String, Secret>) -> Result<Self> {
        let mut providers = HashMap::with_capacity(specs.len());

        for spec in specs {
            let provider = ProviderConfig::from_spec(spec, secrets.get(&spec.secret_env).cloned())?;

            if provider.is_configured() {
                info!(
                    provider = %provider.name,
                    base_url = %provider.base_url,
                    "Provider registered"
                );
            } else {
                warn!(
                    provider = %provider.name,
                    env_var = %provider.secret_env,
                    "Provider secret is not set; requests to this provider will be rejected"
                );
            }

            providers.insert(provider.name.clone(), provider);
        }

        Ok(Self { providers })
    }

    /// Look up a provider by its path segment
    pub fn resolve(&self, name: &str) -> AppResult<&ProviderConfig> {
        self.providers
            .get(name)
            .ok_or_else(|| AppError::UnknownProvider(name.to_string()))
    }

    /// All providers, sorted by name
    pub fn providers(&self) -> Vec<&ProviderConfig> {
        let mut list: Vec<_> = self.providers.values().collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Number of providers with a secret present
    pub fn configured_count(&self) -> usize {
        self.providers.values().filter(|p| p.is_configured()).count()
    }
}
