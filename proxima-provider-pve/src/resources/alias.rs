//! `firewall_alias` - named IP address or network in the cluster firewall
//!
//! The alias name doubles as the external identifier, so a rename rekeys
//! the record.

use std::sync::Arc;

use async_trait::async_trait;
use proxima_core::diagnostics::Diagnostics;
use proxima_core::provider::{ProviderResult, ResourceHandler, ResourceModel};
use proxima_core::resource::{ResourceData, Value};
use proxima_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use crate::firewall::{
    AliasApi, AliasCreateRequestBody, AliasGetResponseData, AliasUpdateRequestBody,
};

pub const TYPE_NAME: &str = "firewall_alias";

pub const MK_ALIAS_NAME: &str = "name";
pub const MK_ALIAS_CIDR: &str = "cidr";
pub const MK_ALIAS_COMMENT: &str = "comment";

#[derive(Debug, Clone, PartialEq)]
pub struct AliasModel {
    pub name: String,
    pub cidr: String,
    pub comment: Option<String>,
}

impl ResourceModel for AliasModel {
    fn from_data(data: &ResourceData) -> ProviderResult<Self> {
        Ok(Self {
            name: data.require_string(MK_ALIAS_NAME)?,
            cidr: data.require_string(MK_ALIAS_CIDR)?,
            comment: data.optional_string(MK_ALIAS_COMMENT)?,
        })
    }

    fn write_to(&self, data: &mut ResourceData) {
        data.set(MK_ALIAS_NAME, self.name.as_str());
        data.set(MK_ALIAS_CIDR, self.cidr.as_str());
        match &self.comment {
            Some(comment) => data.set(MK_ALIAS_COMMENT, comment.as_str()),
            None => {
                data.remove(MK_ALIAS_COMMENT);
            }
        }
    }
}

impl From<AliasGetResponseData> for AliasModel {
    fn from(remote: AliasGetResponseData) -> Self {
        Self {
            name: remote.name,
            cidr: remote.cidr,
            // An empty comment and no comment are the same thing remotely
            comment: remote.comment.filter(|c| !c.is_empty()),
        }
    }
}

/// Lifecycle handler for firewall aliases
pub struct AliasResource {
    api: Arc<dyn AliasApi>,
}

impl AliasResource {
    pub fn new(api: Arc<dyn AliasApi>) -> Self {
        Self { api }
    }

    async fn create_alias(&self, data: &mut ResourceData) -> ProviderResult<()> {
        let alias = AliasModel::from_data(data)?;
        log::debug!("creating firewall alias '{}'", alias.name);

        let body = AliasCreateRequestBody {
            name: alias.name.clone(),
            cidr: alias.cidr,
            comment: alias.comment,
        };
        self.api.create_alias(&body).await?;

        data.set_id(alias.name);
        Ok(())
    }

    async fn read_alias(&self, data: &mut ResourceData) -> ProviderResult<()> {
        let Some(name) = data.id().map(str::to_string) else {
            return Ok(());
        };

        match self.api.get_alias(&name).await {
            Ok(remote) => {
                let mut alias = AliasModel::from(remote);
                // Keep a declared empty comment so it compares equal next time
                if alias.comment.is_none() && has_empty_comment(data) {
                    alias.comment = Some(String::new());
                }
                alias.write_to(data);
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                log::info!("firewall alias '{}' no longer exists", name);
                data.clear_id();
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn update_alias(&self, data: &mut ResourceData) -> ProviderResult<()> {
        let previous_name = data.require_id()?.to_string();
        let alias = AliasModel::from_data(data)?;
        log::debug!("updating firewall alias '{}'", previous_name);

        let body = AliasUpdateRequestBody {
            rename: alias.name.clone(),
            cidr: alias.cidr,
            // Always sent so a removed comment is cleared remotely
            comment: Some(alias.comment.unwrap_or_default()),
            digest: None,
        };
        self.api.update_alias(&previous_name, &body).await?;

        if alias.name != previous_name {
            log::info!(
                "firewall alias '{}' renamed to '{}'",
                previous_name,
                alias.name
            );
        }
        data.set_id(alias.name);
        Ok(())
    }

    async fn delete_alias(&self, data: &mut ResourceData) -> ProviderResult<()> {
        let Some(name) = data.id().map(str::to_string) else {
            return Ok(());
        };
        log::debug!("deleting firewall alias '{}'", name);

        match self.api.delete_alias(&name).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                log::warn!("firewall alias '{}' was already deleted", name);
            }
            Err(e) => return Err(e),
        }

        data.clear_id();
        Ok(())
    }
}

fn has_empty_comment(data: &ResourceData) -> bool {
    matches!(data.get(MK_ALIAS_COMMENT), Some(Value::String(c)) if c.is_empty())
}

/// Schema of the `firewall_alias` resource
pub fn schema() -> ResourceSchema {
    ResourceSchema::new(TYPE_NAME)
        .with_description("Cluster firewall alias")
        .attribute(
            AttributeSchema::new(MK_ALIAS_NAME, types::identifier())
                .required()
                .with_description("Alias name"),
        )
        .attribute(
            AttributeSchema::new(MK_ALIAS_CIDR, types::cidr())
                .required()
                .with_description("IP address or network in CIDR notation"),
        )
        .attribute(
            AttributeSchema::new(MK_ALIAS_COMMENT, AttributeType::String)
                .with_description("Free-form comment"),
        )
}

#[async_trait]
impl ResourceHandler for AliasResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        schema()
    }

    async fn create(&self, data: &mut ResourceData) -> Diagnostics {
        if let Err(e) = self.create_alias(data).await {
            return Diagnostics::from_err(e);
        }
        self.read(data).await
    }

    async fn read(&self, data: &mut ResourceData) -> Diagnostics {
        Diagnostics::from_result(self.read_alias(data).await)
    }

    async fn update(&self, data: &mut ResourceData) -> Diagnostics {
        if let Err(e) = self.update_alias(data).await {
            return Diagnostics::from_err(e);
        }
        self.read(data).await
    }

    async fn delete(&self, data: &mut ResourceData) -> Diagnostics {
        Diagnostics::from_result(self.delete_alias(data).await)
    }
}
