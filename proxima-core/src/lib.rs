//! Proxima Core
//!
//! Core library for reconciling declared infrastructure records against a
//! remote API through per-resource lifecycle handlers

pub mod diagnostics;
pub mod differ;
pub mod provider;
pub mod registry;
pub mod resource;
pub mod schema;
