//! SDN IP/MAC mapping API
//!
//! Mappings are written through `cluster/sdn/vnets/{vnet}/ips` and looked
//! up in the IPAM status listing, which is the only place the remote exposes
//! them for reading.

use async_trait::async_trait;
use proxima_core::provider::{ErrorKind, ProviderError, ProviderResult};
use serde::{Deserialize, Serialize};

use crate::client::SdnClient;

/// Body of the `cluster/sdn/vnets/{vnet}/ips` calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingRequestBody {
    pub zone: String,
    pub ip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
}

/// One entry of `GET cluster/sdn/ipams/{ipam}/status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub zone: String,
    pub vnet: String,
    pub ip: String,
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default)]
    pub subnet: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
}

/// Operations on SDN IP/MAC mappings
#[async_trait]
pub trait MappingApi: Send + Sync {
    async fn create_mapping(&self, vnet: &str, body: &MappingRequestBody) -> ProviderResult<()>;

    /// Fails with `ErrorKind::NotFound` when no mapping exists for the ip in this zone and vnet
    async fn get_mapping(&self, zone: &str, vnet: &str, ip: &str) -> ProviderResult<MappingEntry>;

    async fn update_mapping(&self, vnet: &str, body: &MappingRequestBody) -> ProviderResult<()>;

    /// Fails with `ErrorKind::NotFound` when the mapping does not exist
    async fn delete_mapping(&self, vnet: &str, body: &MappingRequestBody) -> ProviderResult<()>;
}

impl SdnClient {
    fn ips_path(&self, vnet: &str) -> String {
        self.expand_path(&format!("vnets/{}/ips", vnet))
    }
}

#[async_trait]
impl MappingApi for SdnClient {
    async fn create_mapping(&self, vnet: &str, body: &MappingRequestBody) -> ProviderResult<()> {
        self.api.post(&self.ips_path(vnet), body).await
    }

    async fn get_mapping(&self, zone: &str, vnet: &str, ip: &str) -> ProviderResult<MappingEntry> {
        let path = self.expand_path(&format!("ipams/{}/status", self.ipam));
        // Only a missing entry means the mapping is gone; a missing IPAM is not
        let entries: Vec<MappingEntry> = self.api.get(&path).await.map_err(|mut e| {
            if e.is_not_found() {
                e.kind = ErrorKind::Api;
                e.message = format!("IPAM '{}' status unavailable: {}", self.ipam, e.message);
            }
            e
        })?;

        entries
            .into_iter()
            .find(|e| e.zone == zone && e.vnet == vnet && e.ip == ip)
            .ok_or_else(|| {
                ProviderError::not_found(format!(
                    "no such mapping '{}' in zone '{}' vnet '{}'",
                    ip, zone, vnet
                ))
            })
    }

    async fn update_mapping(&self, vnet: &str, body: &MappingRequestBody) -> ProviderResult<()> {
        self.api.put(&self.ips_path(vnet), body).await
    }

    async fn delete_mapping(&self, vnet: &str, body: &MappingRequestBody) -> ProviderResult<()> {
        self.api.delete_with(&self.ips_path(vnet), body).await
    }
}
