//! Resource handlers for the Proxmox VE provider

pub mod alias;
pub mod mapping;
pub mod selector;

use std::sync::Arc;

use proxima_core::provider::ResourceHandler;
use proxima_core::schema::ResourceSchema;

use crate::firewall::AliasApi;
use crate::sdn::MappingApi;

pub use alias::AliasResource;
pub use mapping::MappingResource;

/// Every resource handler this provider offers
pub fn resource_handlers(
    aliases: Arc<dyn AliasApi>,
    mappings: Arc<dyn MappingApi>,
) -> Vec<Box<dyn ResourceHandler>> {
    vec![
        Box::new(AliasResource::new(aliases)),
        Box::new(MappingResource::new(mappings)),
    ]
}

/// Schemas of every resource type, available without a cluster connection
pub fn all_schemas() -> Vec<ResourceSchema> {
    vec![alias::schema(), mapping::schema()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schemas_cover_every_handler() {
        let types: Vec<String> = all_schemas().into_iter().map(|s| s.resource_type).collect();
        assert_eq!(types, vec![alias::TYPE_NAME, mapping::TYPE_NAME]);
    }
}
