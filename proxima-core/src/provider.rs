//! Provider - Traits abstracting resource lifecycle operations
//!
//! A Provider exposes one `ResourceHandler` per resource kind. Each handler
//! translates a declarative record into remote API calls and back into the
//! field carrier. The host decides which entry point to call; handlers never
//! initiate work on their own.

use async_trait::async_trait;

use crate::diagnostics::Diagnostics;
use crate::resource::{ResourceData, ResourceId};
use crate::schema::ResourceSchema;

/// Classification of a provider failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The remote entity does not exist
    NotFound,
    /// Network or connection failure before a response was received
    Transport,
    /// The remote API rejected the request
    Api,
    /// The declared record or provider configuration is unusable
    InvalidConfig,
    /// The response could not be decoded
    Decode,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::Transport => "transport error",
            ErrorKind::Api => "api error",
            ErrorKind::InvalidConfig => "invalid configuration",
            ErrorKind::Decode => "decode error",
        };
        write!(f, "{}", s)
    }
}

/// Error type for Provider operations
#[derive(Debug)]
pub struct ProviderError {
    pub kind: ErrorKind,
    pub message: String,
    pub resource_id: Option<ResourceId>,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref id) = self.resource_id {
            write!(f, "[{}.{}] {}", id.resource_type, id.name, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &dyn std::error::Error)
    }
}

impl ProviderError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            resource_id: None,
            cause: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    pub fn api(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Api, message)
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidConfig, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Decode, message)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    pub fn for_resource(mut self, id: ResourceId) -> Self {
        self.resource_id = Some(id);
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Strongly typed view of a field carrier
pub trait ResourceModel: Sized {
    /// Read the model out of the carrier's attributes
    fn from_data(data: &ResourceData) -> ProviderResult<Self>;

    /// Write every field of the model into the carrier
    fn write_to(&self, data: &mut ResourceData);
}

/// Lifecycle entry points for one resource kind
///
/// Every entry point takes the mutable carrier and returns diagnostics.
/// A handler signals "the remote record is gone" by clearing the identifier,
/// not by returning an error.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    /// Resource type name (e.g., "firewall_alias")
    fn type_name(&self) -> &'static str;

    /// Attribute schema for this resource type
    fn schema(&self) -> ResourceSchema;

    /// Create the remote record, set the identifier, then read it back
    async fn create(&self, data: &mut ResourceData) -> Diagnostics;

    /// Refresh the carrier from the remote record, clearing the identifier if it is gone
    async fn read(&self, data: &mut ResourceData) -> Diagnostics;

    /// Apply the carrier's attributes to the record named by the current identifier
    async fn update(&self, data: &mut ResourceData) -> Diagnostics;

    /// Delete the remote record; an already-missing record counts as deleted
    async fn delete(&self, data: &mut ResourceData) -> Diagnostics;
}

/// Main Provider trait
///
/// Each infrastructure provider implements this trait to hand its
/// resource handlers to the host.
pub trait Provider: Send + Sync {
    /// Name of this Provider (e.g., "pve")
    fn name(&self) -> &'static str;

    /// Handlers for every resource type this Provider can manage
    fn handlers(&self) -> Vec<Box<dyn ResourceHandler>>;
}
