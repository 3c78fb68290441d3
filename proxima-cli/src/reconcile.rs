//! Drive the resource handlers and fold their results into state
//!
//! Records are processed one at a time, so at most one entry point is in
//! flight per record.

use proxima_core::diagnostics::Diagnostics;
use proxima_core::differ::{self, Diff};
use proxima_core::registry::Registry;
use proxima_core::resource::{Resource, ResourceData, ResourceId};
use proxima_state::StateFile;

/// Outcome of reading one tracked record
pub struct Refreshed {
    pub id: ResourceId,
    pub diagnostics: Diagnostics,
    /// The remote record disappeared since the last run
    pub drifted: bool,
}

/// Read every tracked record and record what the remote reports.
/// Records whose read fails are left untouched.
pub async fn refresh(registry: &Registry, state: &mut StateFile) -> Vec<Refreshed> {
    let mut results = Vec::new();

    for tracked in state.resources.clone() {
        let id = tracked.resource_id();
        let mut data = tracked.to_data();
        let diagnostics = registry.read(&id.resource_type, &mut data).await;

        let drifted = tracked.identifier.is_some() && !data.exists();
        if !diagnostics.has_errors() {
            state.record(&id, &tracked.provider, &data);
        }
        results.push(Refreshed {
            id,
            diagnostics,
            drifted,
        });
    }

    results
}

/// Diffs that bring the remote to the declared records
///
/// Declared records come first in declaration order, followed by deletions
/// of tracked records that are no longer declared.
pub fn plan(desired: &[Resource], state: &StateFile) -> Vec<Diff> {
    let mut diffs: Vec<Diff> = desired
        .iter()
        .map(|resource| {
            let current = state
                .find_resource(&resource.id.resource_type, &resource.id.name)
                .map(|tracked| tracked.to_data())
                .unwrap_or_default();
            differ::diff(resource, &current)
        })
        .collect();

    for tracked in &state.resources {
        let id = tracked.resource_id();
        if desired.iter().any(|r| r.id == id) {
            continue;
        }
        if let Some(diff) = differ::orphaned(id, &tracked.to_data()) {
            diffs.push(diff);
        }
    }

    diffs
}

/// Every tracked record, as deletions
pub fn destroy_plan(state: &StateFile) -> Vec<Diff> {
    state
        .resources
        .iter()
        .filter_map(|tracked| differ::orphaned(tracked.resource_id(), &tracked.to_data()))
        .collect()
}

/// Run the entry point a diff calls for and record the result in state
pub async fn apply_diff(
    registry: &Registry,
    state: &mut StateFile,
    provider: &str,
    diff: &Diff,
) -> Diagnostics {
    match diff {
        Diff::Create(resource) => {
            let mut data = ResourceData::from_resource(resource);
            let diagnostics = registry.create(&resource.id.resource_type, &mut data).await;
            // Created but failed to read back still binds the record
            if data.exists() {
                state.record(&resource.id, provider, &data);
            }
            diagnostics
        }
        Diff::Update { id, identifier, to, .. } => {
            let mut data = ResourceData::existing(identifier.clone(), to.attributes.clone());
            let diagnostics = registry.update(&id.resource_type, &mut data).await;
            if !diagnostics.has_errors() || data.id() != Some(identifier.as_str()) {
                state.record(id, provider, &data);
            }
            diagnostics
        }
        Diff::Delete { id, .. } => {
            let mut data = state
                .find_resource(&id.resource_type, &id.name)
                .map(|tracked| tracked.to_data())
                .unwrap_or_default();
            let diagnostics = registry.delete(&id.resource_type, &mut data).await;
            if !diagnostics.has_errors() {
                state.record(id, provider, &data);
            }
            diagnostics
        }
        Diff::NoChange(_) => Diagnostics::new(),
    }
}
