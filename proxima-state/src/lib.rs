//! Proxima State Management
//!
//! Records which remote entity each declared resource is bound to, so that
//! later runs can read, update, or delete it by identifier.
//!
//! # Overview
//!
//! - **StateFile**: every managed resource with its identifier and last
//!   observed attributes
//! - **StateBackend**: a trait for state storage backends
//! - **LockInfo**: the lock taken around mutating commands
//!
//! # Example
//!
//! ```ignore
//! use proxima_state::{create_backend, BackendConfig};
//!
//! let config = BackendConfig::local("proxima.state.json");
//! let backend = create_backend(&config).await?;
//!
//! let lock = backend.acquire_lock("apply").await?;
//! let mut state = backend.read_state().await?.unwrap_or_default();
//!
//! // ... drive the resource handlers ...
//!
//! state.increment_serial();
//! backend.write_state(&state).await?;
//! backend.release_lock(&lock).await?;
//! ```

pub mod backend;
pub mod backends;
pub mod lock;
pub mod state;

// Re-export main types for convenience
pub use backend::{BackendConfig, BackendError, BackendResult, StateBackend};
pub use backends::{LocalBackend, create_backend};
pub use lock::LockInfo;
pub use state::{ResourceState, StateFile};
