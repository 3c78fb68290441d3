//! Proxmox VE provider implementation
//!
//! Builds the cluster API client from configuration and hands out one
//! handler per resource kind.

use std::sync::Arc;

use proxima_core::provider::{Provider, ProviderError, ProviderResult, ResourceHandler};
use serde::{Deserialize, Serialize};

use crate::client::{ApiClient, DEFAULT_IPAM, Transport};
use crate::http::HttpTransport;
use crate::resources::resource_handlers;

fn default_timeout_secs() -> u64 {
    30
}

fn default_ipam() -> String {
    DEFAULT_IPAM.to_string()
}

/// Connection settings for a Proxmox VE cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PveConfig {
    /// Base URL of any cluster node, e.g. `https://pve.example.com:8006`
    pub endpoint: String,
    /// API token in `user@realm!tokenid=secret` form
    pub api_token: String,
    /// Skip TLS certificate verification
    #[serde(default)]
    pub insecure: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// IPAM consulted when reading SDN mappings
    #[serde(default = "default_ipam")]
    pub ipam: String,
}

impl Default for PveConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_token: String::new(),
            insecure: false,
            timeout_secs: default_timeout_secs(),
            ipam: default_ipam(),
        }
    }
}

impl PveConfig {
    pub fn validate(&self) -> ProviderResult<()> {
        if !(self.endpoint.starts_with("https://") || self.endpoint.starts_with("http://")) {
            return Err(ProviderError::invalid_config(format!(
                "endpoint must be an http(s) URL, got '{}'",
                self.endpoint
            )));
        }

        let well_formed = self
            .api_token
            .split_once('!')
            .and_then(|(user, rest)| rest.split_once('=').map(|(id, secret)| (user, id, secret)))
            .is_some_and(|(user, id, secret)| {
                !user.is_empty() && !id.is_empty() && !secret.is_empty()
            });
        if !well_formed {
            return Err(ProviderError::invalid_config(
                "api_token must have the form 'user@realm!tokenid=secret'",
            ));
        }

        if self.ipam.is_empty() {
            return Err(ProviderError::invalid_config("ipam must not be empty"));
        }
        Ok(())
    }
}

/// Proxmox VE Provider
pub struct PveProvider {
    api: ApiClient,
    ipam: String,
}

impl PveProvider {
    /// Create a provider talking HTTP to the configured cluster
    pub fn new(config: &PveConfig) -> ProviderResult<Self> {
        let transport = HttpTransport::new(config)?;
        log::debug!("pve provider targeting {}", transport.base_url());
        Ok(Self::with_transport(Arc::new(transport)).with_ipam(config.ipam.clone()))
    }

    /// Create a provider over an arbitrary transport
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            api: ApiClient::new(transport),
            ipam: default_ipam(),
        }
    }

    pub fn with_ipam(mut self, ipam: impl Into<String>) -> Self {
        self.ipam = ipam.into();
        self
    }
}

impl Provider for PveProvider {
    fn name(&self) -> &'static str {
        "pve"
    }

    fn handlers(&self) -> Vec<Box<dyn ResourceHandler>> {
        let cluster = self.api.cluster();
        resource_handlers(
            Arc::new(cluster.firewall()),
            Arc::new(cluster.sdn().with_ipam(self.ipam.as_str())),
        )
    }
}
