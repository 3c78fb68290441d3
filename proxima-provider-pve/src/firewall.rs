//! Cluster firewall alias API

use async_trait::async_trait;
use proxima_core::provider::ProviderResult;
use serde::{Deserialize, Serialize};

use crate::client::FirewallClient;

/// Body of `POST cluster/firewall/aliases`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasCreateRequestBody {
    pub name: String,
    pub cidr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Body of `PUT cluster/firewall/aliases/{name}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasUpdateRequestBody {
    /// Target name; equal to the current name when not renaming
    pub rename: String,
    pub cidr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Payload of `GET cluster/firewall/aliases/{name}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasGetResponseData {
    pub name: String,
    pub cidr: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub digest: Option<String>,
    #[serde(default)]
    pub ipversion: Option<u8>,
}

/// Operations on cluster firewall aliases
#[async_trait]
pub trait AliasApi: Send + Sync {
    async fn create_alias(&self, body: &AliasCreateRequestBody) -> ProviderResult<()>;

    /// Fails with `ErrorKind::NotFound` when no alias has this name
    async fn get_alias(&self, name: &str) -> ProviderResult<AliasGetResponseData>;

    async fn update_alias(&self, name: &str, body: &AliasUpdateRequestBody) -> ProviderResult<()>;

    /// Fails with `ErrorKind::NotFound` when no alias has this name
    async fn delete_alias(&self, name: &str) -> ProviderResult<()>;
}

impl FirewallClient {
    fn alias_path(&self, name: &str) -> String {
        self.expand_path(&format!("aliases/{}", name))
    }
}

#[async_trait]
impl AliasApi for FirewallClient {
    async fn create_alias(&self, body: &AliasCreateRequestBody) -> ProviderResult<()> {
        self.api.post(&self.expand_path("aliases"), body).await
    }

    async fn get_alias(&self, name: &str) -> ProviderResult<AliasGetResponseData> {
        self.api.get(&self.alias_path(name)).await
    }

    async fn update_alias(&self, name: &str, body: &AliasUpdateRequestBody) -> ProviderResult<()> {
        self.api.put(&self.alias_path(name), body).await
    }

    async fn delete_alias(&self, name: &str) -> ProviderResult<()> {
        self.api.delete(&self.alias_path(name)).await
    }
}
