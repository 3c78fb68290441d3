//! Schema - Declare attribute schemas for resources
//!
//! Providers declare a schema for each resource type so configuration can be
//! checked before any entry point runs.

use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::sync::LazyLock;

use regex::Regex;

use crate::resource::Value;

/// Attribute type
#[derive(Debug, Clone)]
pub enum AttributeType {
    /// String
    String,
    /// Integer
    Int,
    /// Boolean
    Bool,
    /// Custom type (with validation function)
    Custom {
        name: String,
        base: Box<AttributeType>,
        validate: fn(&Value) -> Result<(), String>,
    },
}

impl AttributeType {
    /// Check if a value conforms to this type
    pub fn validate(&self, value: &Value) -> Result<(), TypeError> {
        match (self, value) {
            (AttributeType::String, Value::String(_)) => Ok(()),
            (AttributeType::Int, Value::Int(_)) => Ok(()),
            (AttributeType::Bool, Value::Bool(_)) => Ok(()),

            (AttributeType::Custom { validate, base, .. }, v) => {
                base.validate(v)?;
                validate(v).map_err(|msg| TypeError::ValidationFailed { message: msg })
            }

            _ => Err(TypeError::TypeMismatch {
                expected: self.type_name(),
                got: value_type_name(value),
            }),
        }
    }

    fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::Int => "Int".to_string(),
            AttributeType::Bool => "Bool".to_string(),
            AttributeType::Custom { name, .. } => name.clone(),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

fn value_type_name(value: &Value) -> String {
    match value {
        Value::String(_) => "String",
        Value::Int(_) => "Int",
        Value::Bool(_) => "Bool",
        Value::List(_) => "List",
        Value::Map(_) => "Map",
    }
    .to_string()
}

/// Type error
#[derive(Debug, Clone, thiserror::Error)]
pub enum TypeError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("Attribute '{name}' is computed and cannot be set")]
    ComputedAttribute { name: String },

    #[error("Unknown attribute '{name}'")]
    UnknownAttribute { name: String },
}

/// Attribute schema
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    pub required: bool,
    /// Set by the remote service, never by configuration
    pub computed: bool,
    pub description: Option<String>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            computed: false,
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }
}

/// Resource schema
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub resource_type: String,
    pub attributes: HashMap<String, AttributeSchema>,
    pub description: Option<String>,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: HashMap::new(),
            description: None,
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Merge a shared schema fragment into this schema.
    /// Attributes already declared here win over the fragment.
    pub fn merge(mut self, fragment: impl IntoIterator<Item = AttributeSchema>) -> Self {
        for schema in fragment {
            self.attributes.entry(schema.name.clone()).or_insert(schema);
        }
        self
    }

    /// Attribute names in sorted order
    pub fn attribute_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.attributes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Validate resource attributes
    pub fn validate(&self, attributes: &HashMap<String, Value>) -> Result<(), Vec<TypeError>> {
        let mut errors = Vec::new();

        for (name, schema) in &self.attributes {
            if schema.required && !attributes.contains_key(name) {
                errors.push(TypeError::MissingRequired { name: name.clone() });
            }
        }

        for (name, value) in attributes {
            // Internal attributes are owned by the host
            if name.starts_with('_') {
                continue;
            }
            match self.attributes.get(name) {
                Some(schema) if schema.computed => {
                    errors.push(TypeError::ComputedAttribute { name: name.clone() });
                }
                Some(schema) => {
                    if let Err(e) = schema.attr_type.validate(value) {
                        errors.push(e);
                    }
                }
                None => errors.push(TypeError::UnknownAttribute { name: name.clone() }),
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Helper functions for common types
pub mod types {
    use super::*;

    fn string_check(value: &Value, check: fn(&str) -> Result<(), String>) -> Result<(), String> {
        match value {
            Value::String(s) => check(s),
            _ => Err("Expected string".to_string()),
        }
    }

    /// IP address or network, v4 or v6 (e.g., "10.0.0.1", "10.0.0.0/24", "fd00::/64")
    pub fn cidr() -> AttributeType {
        AttributeType::Custom {
            name: "Cidr".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| string_check(value, validate_cidr),
        }
    }

    /// Single IP address, v4 or v6
    pub fn ip_address() -> AttributeType {
        AttributeType::Custom {
            name: "IpAddress".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| string_check(value, validate_ip),
        }
    }

    /// Ethernet MAC address (e.g., "BC:24:11:00:00:01")
    pub fn mac_address() -> AttributeType {
        AttributeType::Custom {
            name: "MacAddress".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| string_check(value, validate_mac),
        }
    }

    /// Remote object identifier (letter first, then letters, digits, '-' or '_')
    pub fn identifier() -> AttributeType {
        AttributeType::Custom {
            name: "Identifier".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| string_check(value, validate_identifier),
        }
    }
}

static MAC_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Fa-f]{2}(:[0-9A-Fa-f]{2}){5}$").ok());

static IDENTIFIER_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]{1,63}$").ok());

fn regex_match(re: &LazyLock<Option<Regex>>, s: &str) -> bool {
    re.as_ref().is_some_and(|re| re.is_match(s))
}

/// Validate an IP address
pub fn validate_ip(ip: &str) -> Result<(), String> {
    ip.parse::<IpAddr>()
        .map(|_| ())
        .map_err(|_| format!("Invalid IP address '{}'", ip))
}

/// Validate an IP address or CIDR block (e.g., "10.0.0.0/16")
pub fn validate_cidr(cidr: &str) -> Result<(), String> {
    let (ip, prefix) = match cidr.split_once('/') {
        Some((ip, prefix)) => (ip, Some(prefix)),
        None => (cidr, None),
    };

    let addr: IpAddr = ip
        .parse()
        .map_err(|_| format!("Invalid CIDR '{}': bad address '{}'", cidr, ip))?;

    let Some(prefix) = prefix else {
        return Ok(());
    };

    let max = if addr.is_ipv4() { 32 } else { 128 };
    match prefix.parse::<u8>() {
        Ok(p) if p <= max => Ok(()),
        Ok(p) => Err(format!("Invalid prefix length '{}': must be 0-{}", p, max)),
        Err(_) => Err(format!(
            "Invalid prefix length '{}': must be a number",
            prefix
        )),
    }
}

/// Validate a colon-separated MAC address
pub fn validate_mac(mac: &str) -> Result<(), String> {
    if regex_match(&MAC_RE, mac) {
        Ok(())
    } else {
        Err(format!("Invalid MAC address '{}'", mac))
    }
}

/// Validate a remote object identifier
pub fn validate_identifier(id: &str) -> Result<(), String> {
    if regex_match(&IDENTIFIER_RE, id) {
        Ok(())
    } else {
        Err(format!(
            "Invalid identifier '{}': must start with a letter and contain only letters, digits, '-' or '_'",
            id
        ))
    }
}
