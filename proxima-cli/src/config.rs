//! Configuration file loading
//!
//! ```json
//! {
//!   "resources": [
//!     {"type": "firewall_alias", "name": "web", "attributes": {"name": "web", "cidr": "10.0.0.0/24"}}
//!   ]
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use proxima_core::resource::{Resource, ResourceId, Value};
use proxima_core::schema::ResourceSchema;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    resources: Vec<ResourceDecl>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ResourceDecl {
    #[serde(rename = "type")]
    resource_type: String,
    name: String,
    #[serde(default)]
    attributes: HashMap<String, Value>,
}

pub fn load(path: &Path) -> Result<Vec<Resource>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    parse(&content).map_err(|e| format!("{}: {}", path.display(), e))
}

pub fn parse(content: &str) -> Result<Vec<Resource>, String> {
    let file: ConfigFile =
        serde_json::from_str(content).map_err(|e| format!("Parse error: {}", e))?;

    let mut seen = HashSet::new();
    let mut resources = Vec::with_capacity(file.resources.len());
    for decl in file.resources {
        let id = ResourceId::new(decl.resource_type, decl.name);
        if !seen.insert(id.clone()) {
            return Err(format!("Duplicate resource declaration: {}", id));
        }
        resources.push(Resource {
            id,
            attributes: decl.attributes,
        });
    }
    Ok(resources)
}

/// Check every declaration against its type's schema
pub fn validate_resources(
    resources: &[Resource],
    schemas: &HashMap<String, ResourceSchema>,
) -> Result<(), String> {
    let mut all_errors = Vec::new();

    for resource in resources {
        let Some(schema) = schemas.get(&resource.id.resource_type) else {
            all_errors.push(format!(
                "{}: unknown resource type '{}'",
                resource.id, resource.id.resource_type
            ));
            continue;
        };
        if let Err(errors) = schema.validate(&resource.attributes) {
            for error in errors {
                all_errors.push(format!("{}: {}", resource.id, error));
            }
        }
    }

    if all_errors.is_empty() {
        Ok(())
    } else {
        all_errors.sort();
        Err(all_errors.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proxima_provider_pve::resources::all_schemas;

    fn schemas() -> HashMap<String, ResourceSchema> {
        all_schemas()
            .into_iter()
            .map(|s| (s.resource_type.clone(), s))
            .collect()
    }

    #[test]
    fn parse_reads_declarations_in_order() {
        let resources = parse(
            r#"{"resources": [
                {"type": "firewall_alias", "name": "web", "attributes": {"name": "web", "cidr": "10.0.0.0/24"}},
                {"type": "sdn_mapping", "name": "vm1", "attributes": {"zone": "z1", "vnet": "vnet1", "ip": "10.0.0.5", "mac": "BC:24:11:00:00:01"}}
            ]}"#,
        )
        .unwrap();

        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].id.to_string(), "firewall_alias.web");
        assert_eq!(
            resources[1].attributes.get("ip"),
            Some(&Value::from("10.0.0.5"))
        );
    }

    #[test]
    fn parse_rejects_duplicates() {
        let err = parse(
            r#"{"resources": [
                {"type": "firewall_alias", "name": "web"},
                {"type": "firewall_alias", "name": "web"}
            ]}"#,
        )
        .unwrap_err();
        assert!(err.contains("Duplicate resource declaration: firewall_alias.web"));
    }

    #[test]
    fn parse_rejects_unknown_fields() {
        assert!(parse(r#"{"resources": [], "providers": []}"#).is_err());
    }

    #[test]
    fn empty_file_has_no_resources() {
        assert!(parse("{}").unwrap().is_empty());
    }

    #[test]
    fn validate_reports_every_problem() {
        let resources = parse(
            r#"{"resources": [
                {"type": "firewall_alias", "name": "web", "attributes": {"name": "web", "cidr": "10.0.0.0/33"}},
                {"type": "sdn_mapping", "name": "vm1", "attributes": {"zone": "z1", "vnet": "vnet1", "ip": "10.0.0.5"}},
                {"type": "lxc", "name": "ct1"}
            ]}"#,
        )
        .unwrap();

        let err = validate_resources(&resources, &schemas()).unwrap_err();
        let lines: Vec<&str> = err.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().any(|l| l.starts_with("firewall_alias.web:")));
        assert!(lines.iter().any(|l| l.contains("mac")));
        assert!(lines.iter().any(|l| l.contains("unknown resource type 'lxc'")));
    }

    #[test]
    fn validate_accepts_well_formed_config() {
        let resources = parse(
            r#"{"resources": [
                {"type": "firewall_alias", "name": "web", "attributes": {"name": "web", "cidr": "fd00::/64", "comment": "v6"}}
            ]}"#,
        )
        .unwrap();
        assert!(validate_resources(&resources, &schemas()).is_ok());
    }
}
