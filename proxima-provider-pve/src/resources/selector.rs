//! Shared selector fragment: the SDN zone and vnet a record is scoped to

use proxima_core::provider::ProviderResult;
use proxima_core::resource::ResourceData;
use proxima_core::schema::{AttributeSchema, types};

pub const MK_SELECTOR_ZONE: &str = "zone";
pub const MK_SELECTOR_VNET: &str = "vnet";

/// Attributes merged into every schema scoped by a selector
pub fn selector_schema() -> Vec<AttributeSchema> {
    vec![
        AttributeSchema::new(MK_SELECTOR_ZONE, types::identifier())
            .required()
            .with_description("SDN zone"),
        AttributeSchema::new(MK_SELECTOR_VNET, types::identifier())
            .required()
            .with_description("SDN vnet inside the zone"),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub zone: String,
    pub vnet: String,
}

impl Selector {
    pub fn from_data(data: &ResourceData) -> ProviderResult<Self> {
        Ok(Self {
            zone: data.require_string(MK_SELECTOR_ZONE)?,
            vnet: data.require_string(MK_SELECTOR_VNET)?,
        })
    }

    pub fn write_to(&self, data: &mut ResourceData) {
        data.set(MK_SELECTOR_ZONE, self.zone.as_str());
        data.set(MK_SELECTOR_VNET, self.vnet.as_str());
    }
}
