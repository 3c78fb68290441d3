//! Resource - Representing declared records and the field carrier handed to handlers

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::provider::{ProviderError, ProviderResult};

/// Unique identifier for a resource binding
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId {
    /// Resource type (e.g., "firewall_alias", "sdn_mapping")
    pub resource_type: String,
    /// Binding name given in the configuration
    pub name: String,
}

impl ResourceId {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.resource_type, self.name)
    }
}

/// Attribute value of a resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    String(String),
    List(Vec<Value>),
    Map(HashMap<String, Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

/// Desired state declared in configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub id: ResourceId,
    pub attributes: HashMap<String, Value>,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ResourceId::new(resource_type, name),
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Mutable field carrier passed to every lifecycle entry point.
///
/// `id` is the external identifier of the remote record. `None` means the
/// record does not exist (never created, deleted, or gone out of band).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceData {
    id: Option<String>,
    attributes: HashMap<String, Value>,
}

impl ResourceData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Carrier for a record that is about to be created
    pub fn from_resource(resource: &Resource) -> Self {
        Self {
            id: None,
            attributes: resource.attributes.clone(),
        }
    }

    /// Carrier for a record already tracked under `id`
    pub fn existing(id: impl Into<String>, attributes: HashMap<String, Value>) -> Self {
        Self {
            id: Some(id.into()),
            attributes,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Mark the record as gone
    pub fn clear_id(&mut self) {
        self.id = None;
    }

    pub fn exists(&self) -> bool {
        self.id.is_some()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.attributes.remove(key)
    }

    pub fn attributes(&self) -> &HashMap<String, Value> {
        &self.attributes
    }

    pub fn into_attributes(self) -> HashMap<String, Value> {
        self.attributes
    }

    /// Identifier of a record that must already exist
    pub fn require_id(&self) -> ProviderResult<&str> {
        self.id()
            .ok_or_else(|| ProviderError::invalid_config("resource has no identifier"))
    }

    /// Get a required string attribute
    pub fn require_string(&self, key: &str) -> ProviderResult<String> {
        match self.attributes.get(key) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(ProviderError::invalid_config(format!(
                "attribute '{}' must be a string",
                key
            ))),
            None => Err(ProviderError::invalid_config(format!(
                "required attribute '{}' is missing",
                key
            ))),
        }
    }

    /// Get an optional string attribute
    pub fn optional_string(&self, key: &str) -> ProviderResult<Option<String>> {
        match self.attributes.get(key) {
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(ProviderError::invalid_config(format!(
                "attribute '{}' must be a string",
                key
            ))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ErrorKind;

    #[test]
    fn clear_id_marks_absent() {
        let mut data = ResourceData::existing("a1", HashMap::new());
        assert!(data.exists());
        data.clear_id();
        assert!(!data.exists());
        assert_eq!(data.id(), None);
    }

    #[test]
    fn require_string_reports_missing_attribute() {
        let data = ResourceData::new();
        let err = data.require_string("cidr").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidConfig);
        assert!(err.to_string().contains("'cidr'"));
    }

    #[test]
    fn optional_string_rejects_wrong_type() {
        let mut data = ResourceData::new();
        data.set("comment", Value::Int(3));
        assert!(data.optional_string("comment").is_err());
        data.remove("comment");
        assert_eq!(data.optional_string("comment").unwrap(), None);
    }

    #[test]
    fn value_deserializes_untagged() {
        let v: Value = serde_json::from_str(r#"{"a": "x", "b": 2, "c": true, "d": ["y"]}"#).unwrap();
        let Value::Map(map) = v else {
            panic!("Expected Map");
        };
        assert_eq!(map.get("a"), Some(&Value::String("x".to_string())));
        assert_eq!(map.get("b"), Some(&Value::Int(2)));
        assert_eq!(map.get("c"), Some(&Value::Bool(true)));
        assert_eq!(
            map.get("d"),
            Some(&Value::List(vec![Value::String("y".to_string())]))
        );
    }
}
