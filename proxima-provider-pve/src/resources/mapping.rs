//! `sdn_mapping` - IP/MAC reservation inside an SDN vnet
//!
//! The remote has no identifier of its own for a mapping; the record is
//! keyed by `<zone>/<vnet>/<ip>`.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use proxima_core::diagnostics::Diagnostics;
use proxima_core::provider::{ProviderError, ProviderResult, ResourceHandler, ResourceModel};
use proxima_core::resource::ResourceData;
use proxima_core::schema::{AttributeSchema, ResourceSchema, types};

use super::selector::{Selector, selector_schema};
use crate::sdn::{MappingApi, MappingEntry, MappingRequestBody};

pub const TYPE_NAME: &str = "sdn_mapping";

pub const MK_MAPPING_IP: &str = "ip";
pub const MK_MAPPING_MAC: &str = "mac";

/// External identifier of a mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingKey {
    pub selector: Selector,
    pub ip: String,
}

impl MappingKey {
    pub fn parse(id: &str) -> ProviderResult<Self> {
        let parts: Vec<&str> = id.splitn(3, '/').collect();
        match parts.as_slice() {
            [zone, vnet, ip] if !zone.is_empty() && !vnet.is_empty() && !ip.is_empty() => {
                Ok(Self {
                    selector: Selector {
                        zone: zone.to_string(),
                        vnet: vnet.to_string(),
                    },
                    ip: ip.to_string(),
                })
            }
            _ => Err(ProviderError::invalid_config(format!(
                "malformed mapping identifier '{}', expected <zone>/<vnet>/<ip>",
                id
            ))),
        }
    }

    fn body(&self, mac: Option<String>) -> MappingRequestBody {
        MappingRequestBody {
            zone: self.selector.zone.clone(),
            ip: self.ip.clone(),
            mac,
        }
    }
}

impl fmt::Display for MappingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.selector.zone, self.selector.vnet, self.ip)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MappingModel {
    pub selector: Selector,
    pub ip: String,
    pub mac: String,
}

impl MappingModel {
    pub fn key(&self) -> MappingKey {
        MappingKey {
            selector: self.selector.clone(),
            ip: self.ip.clone(),
        }
    }
}

impl ResourceModel for MappingModel {
    fn from_data(data: &ResourceData) -> ProviderResult<Self> {
        Ok(Self {
            selector: Selector::from_data(data)?,
            ip: data.require_string(MK_MAPPING_IP)?,
            mac: data.require_string(MK_MAPPING_MAC)?,
        })
    }

    fn write_to(&self, data: &mut ResourceData) {
        self.selector.write_to(data);
        data.set(MK_MAPPING_IP, self.ip.as_str());
        data.set(MK_MAPPING_MAC, self.mac.as_str());
    }
}

/// Lifecycle handler for SDN IP/MAC mappings
pub struct MappingResource {
    api: Arc<dyn MappingApi>,
}

impl MappingResource {
    pub fn new(api: Arc<dyn MappingApi>) -> Self {
        Self { api }
    }

    async fn create_mapping(&self, data: &mut ResourceData) -> ProviderResult<()> {
        let mapping = MappingModel::from_data(data)?;
        let key = mapping.key();
        log::debug!("creating sdn mapping '{}'", key);

        self.api
            .create_mapping(&key.selector.vnet, &key.body(Some(mapping.mac)))
            .await?;

        data.set_id(key.to_string());
        Ok(())
    }

    async fn read_mapping(&self, data: &mut ResourceData) -> ProviderResult<()> {
        let Some(id) = data.id() else {
            return Ok(());
        };
        let key = MappingKey::parse(id)?;

        match self
            .api
            .get_mapping(&key.selector.zone, &key.selector.vnet, &key.ip)
            .await
        {
            Ok(entry) => {
                write_entry(&key, entry, data);
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                log::info!("sdn mapping '{}' no longer exists", key);
                data.clear_id();
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn update_mapping(&self, data: &mut ResourceData) -> ProviderResult<()> {
        let previous = MappingKey::parse(data.require_id()?)?;
        let mapping = MappingModel::from_data(data)?;
        let key = mapping.key();

        if key == previous {
            log::debug!("updating sdn mapping '{}'", key);
            self.api
                .update_mapping(&key.selector.vnet, &key.body(Some(mapping.mac)))
                .await?;
            return Ok(());
        }

        // The remote cannot move a mapping. Into another vnet the new entry is
        // created first; within one vnet the old entry must go first.
        log::debug!("replacing sdn mapping '{}' with '{}'", previous, key);
        let same_selector = key.selector == previous.selector;
        if same_selector {
            self.remove_previous(&previous).await?;
        }
        self.api
            .create_mapping(&key.selector.vnet, &key.body(Some(mapping.mac)))
            .await?;
        data.set_id(key.to_string());
        log::info!("sdn mapping '{}' rekeyed to '{}'", previous, key);

        if !same_selector {
            self.remove_previous(&previous).await?;
        }
        Ok(())
    }

    /// Delete the entry a rekeyed mapping used to live at
    async fn remove_previous(&self, previous: &MappingKey) -> ProviderResult<()> {
        match self
            .api
            .delete_mapping(&previous.selector.vnet, &previous.body(None))
            .await
        {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                log::warn!("sdn mapping '{}' was already deleted", previous);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn delete_mapping(&self, data: &mut ResourceData) -> ProviderResult<()> {
        let Some(id) = data.id() else {
            return Ok(());
        };
        let key = MappingKey::parse(id)?;
        log::debug!("deleting sdn mapping '{}'", key);

        let mac = data.optional_string(MK_MAPPING_MAC)?;
        match self
            .api
            .delete_mapping(&key.selector.vnet, &key.body(mac))
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                log::warn!("sdn mapping '{}' was already deleted", key);
            }
            Err(e) => return Err(e),
        }

        data.clear_id();
        Ok(())
    }
}

fn write_entry(key: &MappingKey, entry: MappingEntry, data: &mut ResourceData) {
    key.selector.write_to(data);
    data.set(MK_MAPPING_IP, entry.ip);
    match entry.mac {
        Some(mac) => data.set(MK_MAPPING_MAC, mac),
        None => {
            data.remove(MK_MAPPING_MAC);
        }
    }
}

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(TYPE_NAME)
        .with_description("IP/MAC mapping in an SDN vnet")
        .attribute(
            AttributeSchema::new(MK_MAPPING_IP, types::ip_address())
                .required()
                .with_description("Reserved IP address"),
        )
        .attribute(
            AttributeSchema::new(MK_MAPPING_MAC, types::mac_address())
                .required()
                .with_description("MAC address bound to the IP"),
        )
        .merge(selector_schema())
}

#[async_trait]
impl ResourceHandler for MappingResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        schema()
    }

    async fn create(&self, data: &mut ResourceData) -> Diagnostics {
        if let Err(e) = self.create_mapping(data).await {
            return Diagnostics::from_err(e);
        }
        self.read(data).await
    }

    async fn read(&self, data: &mut ResourceData) -> Diagnostics {
        Diagnostics::from_result(self.read_mapping(data).await)
    }

    async fn update(&self, data: &mut ResourceData) -> Diagnostics {
        if let Err(e) = self.update_mapping(data).await {
            return Diagnostics::from_err(e);
        }
        self.read(data).await
    }

    async fn delete(&self, data: &mut ResourceData) -> Diagnostics {
        Diagnostics::from_result(self.delete_mapping(data).await)
    }
}
