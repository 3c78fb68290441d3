//! API client adapter
//!
//! Resolves resource-scoped paths under the cluster namespace and delegates
//! every request to an injected [`Transport`]. Swapping the transport (HTTP,
//! in-memory fake) never touches resource logic.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use proxima_core::provider::{ProviderError, ProviderResult};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Default IPAM plugin that tracks SDN mappings
pub const DEFAULT_IPAM: &str = "pve";

/// HTTP verb of an API request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        };
        write!(f, "{}", s)
    }
}

/// Generic request seam to the remote API.
///
/// `path` is relative to the API root (e.g., "cluster/firewall/aliases").
/// Returns the response payload with any envelope already removed.
/// Implementations must classify a missing remote entity as
/// `ErrorKind::NotFound`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> ProviderResult<serde_json::Value>;
}

/// Typed wrapper around a transport
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Client scoped to the cluster namespace
    pub fn cluster(&self) -> ClusterClient {
        ClusterClient { api: self.clone() }
    }

    async fn send<B>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
    ) -> ProviderResult<serde_json::Value>
    where
        B: Serialize + ?Sized + Sync,
    {
        let body = body
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| ProviderError::decode(format!("Failed to encode request body: {}", e)))?;
        self.transport.request(method, path, body.as_ref()).await
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ProviderResult<T> {
        let data = self.send::<()>(HttpMethod::Get, path, None).await?;
        serde_json::from_value(data).map_err(|e| {
            ProviderError::decode(format!("Failed to decode response of GET {}: {}", path, e))
        })
    }

    pub async fn post<B: Serialize + ?Sized + Sync>(&self, path: &str, body: &B) -> ProviderResult<()> {
        self.send(HttpMethod::Post, path, Some(body)).await.map(|_| ())
    }

    pub async fn put<B: Serialize + ?Sized + Sync>(&self, path: &str, body: &B) -> ProviderResult<()> {
        self.send(HttpMethod::Put, path, Some(body)).await.map(|_| ())
    }

    pub async fn delete(&self, path: &str) -> ProviderResult<()> {
        self.send::<()>(HttpMethod::Delete, path, None)
            .await
            .map(|_| ())
    }

    /// DELETE with parameters (sent as query string by HTTP transports)
    pub async fn delete_with<B: Serialize + ?Sized + Sync>(
        &self,
        path: &str,
        params: &B,
    ) -> ProviderResult<()> {
        self.send(HttpMethod::Delete, path, Some(params))
            .await
            .map(|_| ())
    }
}

fn join_path(prefix: &str, path: &str) -> String {
    format!("{}/{}", prefix, path.trim_start_matches('/'))
}

/// Client for `cluster/...`
#[derive(Clone)]
pub struct ClusterClient {
    api: ApiClient,
}

impl ClusterClient {
    pub fn expand_path(&self, path: &str) -> String {
        join_path("cluster", path)
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn firewall(&self) -> FirewallClient {
        FirewallClient {
            api: self.api.clone(),
        }
    }

    pub fn sdn(&self) -> SdnClient {
        SdnClient {
            api: self.api.clone(),
            ipam: DEFAULT_IPAM.to_string(),
        }
    }
}

/// Client for `cluster/firewall/...`
#[derive(Clone)]
pub struct FirewallClient {
    pub(crate) api: ApiClient,
}

impl FirewallClient {
    pub fn expand_path(&self, path: &str) -> String {
        join_path("cluster/firewall", path)
    }
}

/// Client for `cluster/sdn/...`
#[derive(Clone)]
pub struct SdnClient {
    pub(crate) api: ApiClient,
    pub(crate) ipam: String,
}

impl SdnClient {
    pub fn expand_path(&self, path: &str) -> String {
        join_path("cluster/sdn", path)
    }

    /// Use a different IPAM plugin for mapping lookups
    pub fn with_ipam(mut self, ipam: impl Into<String>) -> Self {
        self.ipam = ipam.into();
        self
    }

    pub fn ipam(&self) -> &str {
        &self.ipam
    }
}
