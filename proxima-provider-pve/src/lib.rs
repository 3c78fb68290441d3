//! Proxima Proxmox VE Provider
//!
//! Manages cluster firewall aliases and SDN IP/MAC mappings through the
//! Proxmox VE REST API.
//!
//! ## Module Structure
//!
//! - `client` - Transport seam and path-scoped API clients
//! - `http` - reqwest-backed transport
//! - `firewall` - Firewall alias API
//! - `sdn` - SDN mapping API
//! - `resources` - Lifecycle handlers per resource kind
//! - `provider` - PveProvider and its configuration

pub mod client;
pub mod firewall;
pub mod http;
pub mod provider;
pub mod resources;
pub mod sdn;

#[cfg(test)]
mod fake;

// Re-export main types
pub use client::{ApiClient, HttpMethod, Transport};
pub use http::HttpTransport;
pub use provider::{PveConfig, PveProvider};
