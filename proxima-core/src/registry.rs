//! Registry - Dispatch lifecycle calls to the handler for a resource type

use std::collections::HashMap;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::provider::{Provider, ResourceHandler};
use crate::resource::ResourceData;
use crate::schema::ResourceSchema;

/// Lifecycle phase requested by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Create,
    Read,
    Update,
    Delete,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Create => "create",
            Phase::Read => "read",
            Phase::Update => "update",
            Phase::Delete => "delete",
        };
        write!(f, "{}", s)
    }
}

/// Handlers keyed by resource type name
#[derive(Default)]
pub struct Registry {
    handlers: HashMap<&'static str, Box<dyn ResourceHandler>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry holding every handler of a provider
    pub fn from_provider(provider: &dyn Provider) -> Self {
        let mut registry = Self::new();
        for handler in provider.handlers() {
            registry.register(handler);
        }
        registry
    }

    /// Register a handler, replacing any previous handler for the same type
    pub fn register(&mut self, handler: Box<dyn ResourceHandler>) {
        self.handlers.insert(handler.type_name(), handler);
    }

    pub fn get(&self, resource_type: &str) -> Option<&dyn ResourceHandler> {
        self.handlers.get(resource_type).map(|h| h.as_ref())
    }

    pub fn contains(&self, resource_type: &str) -> bool {
        self.handlers.contains_key(resource_type)
    }

    /// Registered type names, sorted
    pub fn resource_types(&self) -> Vec<&'static str> {
        let mut types: Vec<_> = self.handlers.keys().copied().collect();
        types.sort_unstable();
        types
    }

    /// Schemas of all registered types
    pub fn schemas(&self) -> HashMap<String, ResourceSchema> {
        self.handlers
            .values()
            .map(|h| (h.type_name().to_string(), h.schema()))
            .collect()
    }

    /// Run one lifecycle phase for a record of the given type
    pub async fn dispatch(
        &self,
        phase: Phase,
        resource_type: &str,
        data: &mut ResourceData,
    ) -> Diagnostics {
        let Some(handler) = self.get(resource_type) else {
            return Diagnostic::error(format!("Unknown resource type: {}", resource_type)).into();
        };

        log::debug!("{} {} (id: {:?})", phase, resource_type, data.id());

        match phase {
            Phase::Create => handler.create(data).await,
            Phase::Read => handler.read(data).await,
            Phase::Update => handler.update(data).await,
            Phase::Delete => handler.delete(data).await,
        }
    }

    pub async fn create(&self, resource_type: &str, data: &mut ResourceData) -> Diagnostics {
        self.dispatch(Phase::Create, resource_type, data).await
    }

    pub async fn read(&self, resource_type: &str, data: &mut ResourceData) -> Diagnostics {
        self.dispatch(Phase::Read, resource_type, data).await
    }

    pub async fn update(&self, resource_type: &str, data: &mut ResourceData) -> Diagnostics {
        self.dispatch(Phase::Update, resource_type, data).await
    }

    pub async fn delete(&self, resource_type: &str, data: &mut ResourceData) -> Diagnostics {
        self.dispatch(Phase::Delete, resource_type, data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct CountingHandler {
        name: &'static str,
    }

    #[async_trait]
    impl ResourceHandler for CountingHandler {
        fn type_name(&self) -> &'static str {
            self.name
        }

        fn schema(&self) -> ResourceSchema {
            ResourceSchema::new(self.name)
        }

        async fn create(&self, data: &mut ResourceData) -> Diagnostics {
            data.set_id("created");
            Diagnostics::new()
        }

        async fn read(&self, data: &mut ResourceData) -> Diagnostics {
            data.set("read", "yes");
            Diagnostics::new()
        }

        async fn update(&self, data: &mut ResourceData) -> Diagnostics {
            data.set_id("updated");
            Diagnostics::new()
        }

        async fn delete(&self, data: &mut ResourceData) -> Diagnostics {
            data.clear_id();
            Diagnostics::new()
        }
    }

    struct TwoKinds;

    impl Provider for TwoKinds {
        fn name(&self) -> &'static str {
            "test"
        }

        fn handlers(&self) -> Vec<Box<dyn ResourceHandler>> {
            vec![
                Box::new(CountingHandler { name: "b_kind" }),
                Box::new(CountingHandler { name: "a_kind" }),
            ]
        }
    }

    #[test]
    fn from_provider_registers_all_handlers() {
        let registry = Registry::from_provider(&TwoKinds);
        assert_eq!(registry.resource_types(), vec!["a_kind", "b_kind"]);
        assert!(registry.contains("a_kind"));
        assert_eq!(registry.schemas().len(), 2);
    }

    #[tokio::test]
    async fn dispatch_routes_each_phase() {
        let registry = Registry::from_provider(&TwoKinds);
        let mut data = ResourceData::new();

        assert!(registry.create("a_kind", &mut data).await.is_empty());
        assert_eq!(data.id(), Some("created"));

        assert!(registry.read("a_kind", &mut data).await.is_empty());
        assert_eq!(data.get_string("read"), Some("yes"));

        assert!(registry.update("a_kind", &mut data).await.is_empty());
        assert_eq!(data.id(), Some("updated"));

        assert!(registry.delete("a_kind", &mut data).await.is_empty());
        assert!(!data.exists());
    }

    #[tokio::test]
    async fn unknown_type_is_an_error_diagnostic() {
        let registry = Registry::new();
        let mut data = ResourceData::new();
        let diags = registry.create("nope", &mut data).await;
        assert!(diags.has_errors());
        assert!(!data.exists());
    }
}
