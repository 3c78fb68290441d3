//! Differ - Compare desired records with refreshed state
//!
//! Compares the record declared in configuration with the carrier returned by
//! the last read, and decides which lifecycle entry point the host should call.

use std::collections::HashMap;

use crate::resource::{Resource, ResourceData, ResourceId, Value};

/// Result of a diff operation
#[derive(Debug, Clone, PartialEq)]
pub enum Diff {
    /// Resource does not exist -> needs creation
    Create(Resource),
    /// Resource exists with differences -> needs update
    Update {
        id: ResourceId,
        identifier: String,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// Resource exists with no differences -> no action needed
    NoChange(ResourceId),
    /// Resource exists but not in desired state -> needs deletion
    Delete { id: ResourceId, identifier: String },
}

impl Diff {
    /// Returns whether this Diff involves a change
    pub fn is_change(&self) -> bool {
        !matches!(self, Diff::NoChange(_))
    }
}

/// Compare desired state with current state to compute a Diff
pub fn diff(desired: &Resource, current: &ResourceData) -> Diff {
    let Some(identifier) = current.id() else {
        return Diff::Create(desired.clone());
    };

    let changed = find_changed_attributes(&desired.attributes, current.attributes());

    if changed.is_empty() {
        Diff::NoChange(desired.id.clone())
    } else {
        Diff::Update {
            id: desired.id.clone(),
            identifier: identifier.to_string(),
            to: desired.clone(),
            changed_attributes: changed,
        }
    }
}

/// Diff for a tracked record that is no longer declared
pub fn orphaned(id: ResourceId, current: &ResourceData) -> Option<Diff> {
    current.id().map(|identifier| Diff::Delete {
        id,
        identifier: identifier.to_string(),
    })
}

/// Find changed attributes between desired and current state.
/// An attribute present remotely but not declared is a change too,
/// since updates always send every field.
fn find_changed_attributes(
    desired: &HashMap<String, Value>,
    current: &HashMap<String, Value>,
) -> Vec<String> {
    let mut changed = Vec::new();

    for (key, desired_value) in desired {
        // Skip internal attributes (starting with _)
        if key.starts_with('_') {
            continue;
        }

        match current.get(key) {
            Some(current_value) if current_value == desired_value => {}
            _ => changed.push(key.clone()),
        }
    }

    for key in current.keys() {
        if !key.starts_with('_') && !desired.contains_key(key) {
            changed.push(key.clone());
        }
    }

    changed.sort();
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alias(name: &str, cidr: &str) -> Resource {
        Resource::new("firewall_alias", "web")
            .with_attribute("name", name)
            .with_attribute("cidr", cidr)
    }

    #[test]
    fn diff_create_when_not_exists() {
        let result = diff(&alias("web", "10.0.0.0/24"), &ResourceData::new());
        assert!(matches!(result, Diff::Create(_)));
    }

    #[test]
    fn diff_no_change_when_same() {
        let desired = alias("web", "10.0.0.0/24");
        let current = ResourceData::existing("web", desired.attributes.clone());

        let result = diff(&desired, &current);
        assert!(matches!(result, Diff::NoChange(_)));
        assert!(!result.is_change());
    }

    #[test]
    fn diff_update_when_different() {
        let desired = alias("web", "10.0.1.0/24");
        let current = ResourceData::existing("web", alias("web", "10.0.0.0/24").attributes);

        match diff(&desired, &current) {
            Diff::Update {
                identifier,
                changed_attributes,
                ..
            } => {
                assert_eq!(identifier, "web");
                assert_eq!(changed_attributes, vec!["cidr".to_string()]);
            }
            other => panic!("Expected Update, got {:?}", other),
        }
    }

    #[test]
    fn diff_update_when_remote_has_extra_attribute() {
        let desired = alias("web", "10.0.0.0/24");
        let mut attrs = desired.attributes.clone();
        attrs.insert("comment".to_string(), Value::String("stale".to_string()));
        let current = ResourceData::existing("web", attrs);

        match diff(&desired, &current) {
            Diff::Update {
                changed_attributes, ..
            } => assert_eq!(changed_attributes, vec!["comment".to_string()]),
            other => panic!("Expected Update, got {:?}", other),
        }
    }

    #[test]
    fn diff_update_keeps_previous_identifier_on_rename() {
        let desired = alias("web2", "10.0.0.0/24");
        let current = ResourceData::existing("web", alias("web", "10.0.0.0/24").attributes);

        match diff(&desired, &current) {
            Diff::Update { identifier, .. } => assert_eq!(identifier, "web"),
            other => panic!("Expected Update, got {:?}", other),
        }
    }

    #[test]
    fn orphaned_only_when_tracked() {
        let id = ResourceId::new("firewall_alias", "old");
        assert!(orphaned(id.clone(), &ResourceData::new()).is_none());
        assert!(matches!(
            orphaned(id, &ResourceData::existing("old", HashMap::new())),
            Some(Diff::Delete { .. })
        ));
    }
}
