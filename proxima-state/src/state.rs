//! State file structures for persisting resource bindings

use std::collections::HashMap;

use proxima_core::resource::{ResourceData, ResourceId, Value};
use serde::{Deserialize, Serialize};

/// The main state file structure that persists to the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFile {
    /// State file format version
    pub version: u32,
    /// Monotonically increasing number for each state modification
    pub serial: u64,
    /// Unique identifier for this state lineage (prevents accidental overwrites)
    pub lineage: String,
    /// Version of Proxima that last modified this state
    pub proxima_version: String,
    pub resources: Vec<ResourceState>,
}

impl StateFile {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new() -> Self {
        Self::with_lineage(uuid::Uuid::new_v4().to_string())
    }

    pub fn with_lineage(lineage: String) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            serial: 0,
            lineage,
            proxima_version: env!("CARGO_PKG_VERSION").to_string(),
            resources: Vec::new(),
        }
    }

    /// Bump the serial before a write
    pub fn increment_serial(&mut self) {
        self.serial += 1;
        self.proxima_version = env!("CARGO_PKG_VERSION").to_string();
    }

    pub fn find_resource(&self, resource_type: &str, name: &str) -> Option<&ResourceState> {
        self.resources
            .iter()
            .find(|r| r.resource_type == resource_type && r.name == name)
    }

    pub fn find_resource_mut(
        &mut self,
        resource_type: &str,
        name: &str,
    ) -> Option<&mut ResourceState> {
        self.resources
            .iter_mut()
            .find(|r| r.resource_type == resource_type && r.name == name)
    }

    /// Add or replace a resource, keeping insertion order
    pub fn upsert_resource(&mut self, resource: ResourceState) {
        if let Some(existing) = self.find_resource_mut(&resource.resource_type, &resource.name) {
            *existing = resource;
        } else {
            self.resources.push(resource);
        }
    }

    pub fn remove_resource(&mut self, resource_type: &str, name: &str) -> Option<ResourceState> {
        let pos = self
            .resources
            .iter()
            .position(|r| r.resource_type == resource_type && r.name == name)?;
        Some(self.resources.remove(pos))
    }

    /// Record the outcome of a lifecycle call
    ///
    /// A carrier without identifier means the remote record is gone, so the
    /// entry is dropped.
    pub fn record(&mut self, id: &ResourceId, provider: &str, data: &ResourceData) {
        if data.exists() {
            self.upsert_resource(ResourceState::from_data(id, provider, data));
        } else {
            self.remove_resource(&id.resource_type, &id.name);
        }
    }
}

impl Default for StateFile {
    fn default() -> Self {
        Self::new()
    }
}

/// State of a single managed resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    /// Resource type (e.g., "firewall_alias")
    pub resource_type: String,
    /// Name of the declaration in configuration
    pub name: String,
    pub provider: String,
    /// External identifier assigned on create
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// Attributes as last read from the remote
    #[serde(default)]
    pub attributes: HashMap<String, Value>,
}

impl ResourceState {
    pub fn new(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            provider: provider.into(),
            identifier: None,
            attributes: HashMap::new(),
        }
    }

    pub fn from_data(id: &ResourceId, provider: &str, data: &ResourceData) -> Self {
        Self {
            resource_type: id.resource_type.clone(),
            name: id.name.clone(),
            provider: provider.to_string(),
            identifier: data.id().map(str::to_string),
            attributes: data.attributes().clone(),
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn resource_id(&self) -> ResourceId {
        ResourceId::new(self.resource_type.clone(), self.name.clone())
    }

    /// Carrier to hand to a resource handler
    pub fn to_data(&self) -> ResourceData {
        match &self.identifier {
            Some(identifier) => ResourceData::existing(identifier.clone(), self.attributes.clone()),
            None => {
                let mut data = ResourceData::new();
                for (key, value) in &self.attributes {
                    data.set(key.clone(), value.clone());
                }
                data
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_is_empty() {
        let state = StateFile::new();
        assert_eq!(state.version, StateFile::CURRENT_VERSION);
        assert_eq!(state.serial, 0);
        assert!(!state.lineage.is_empty());
        assert!(state.resources.is_empty());
    }

    #[test]
    fn increment_serial_counts_writes() {
        let mut state = StateFile::new();
        state.increment_serial();
        state.increment_serial();
        assert_eq!(state.serial, 2);
    }

    #[test]
    fn upsert_replaces_same_resource() {
        let mut state = StateFile::new();

        state.upsert_resource(
            ResourceState::new("firewall_alias", "web", "pve").with_attribute("cidr", "10.0.0.0/24"),
        );
        state.upsert_resource(
            ResourceState::new("firewall_alias", "web", "pve").with_attribute("cidr", "10.0.1.0/24"),
        );

        assert_eq!(state.resources.len(), 1);
        assert_eq!(
            state.resources[0].attributes.get("cidr"),
            Some(&Value::from("10.0.1.0/24"))
        );
    }

    #[test]
    fn remove_returns_removed_resource() {
        let mut state = StateFile::new();
        state.upsert_resource(ResourceState::new("firewall_alias", "web", "pve"));

        assert!(state.remove_resource("firewall_alias", "web").is_some());
        assert!(state.remove_resource("firewall_alias", "web").is_none());
        assert!(state.resources.is_empty());
    }

    #[test]
    fn record_drops_resources_without_identifier() {
        let mut state = StateFile::new();
        let id = ResourceId::new("firewall_alias", "web");

        let mut data = ResourceData::existing("web", HashMap::new());
        data.set("cidr", "10.0.0.0/24");
        state.record(&id, "pve", &data);
        assert_eq!(
            state.find_resource("firewall_alias", "web").unwrap().identifier.as_deref(),
            Some("web")
        );

        data.clear_id();
        state.record(&id, "pve", &data);
        assert!(state.find_resource("firewall_alias", "web").is_none());
    }

    #[test]
    fn to_data_restores_carrier() {
        let resource = ResourceState::new("sdn_mapping", "vm1", "pve")
            .with_identifier("z1/vnet1/10.0.0.5")
            .with_attribute("mac", "BC:24:11:00:00:01");

        let data = resource.to_data();

        assert_eq!(data.id(), Some("z1/vnet1/10.0.0.5"));
        assert_eq!(data.get_string("mac"), Some("BC:24:11:00:00:01"));
        assert_eq!(resource.resource_id().to_string(), "sdn_mapping.vm1");
    }

    #[test]
    fn serialization_keeps_values() {
        let mut state = StateFile::new();
        state.upsert_resource(
            ResourceState::new("firewall_alias", "web", "pve")
                .with_identifier("web")
                .with_attribute("cidr", "10.0.0.0/24"),
        );

        let json = serde_json::to_string_pretty(&state).unwrap();
        let deserialized: StateFile = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.lineage, state.lineage);
        assert_eq!(deserialized.resources, state.resources);
        assert!(json.contains("\"proxima_version\""));
    }
}
