//! In-memory remote registry for extsync.
//!
//! This crate provides an in-process implementation of the `RemoteRegistry`
//! trait from `extsync-registry`. It keeps every call it receives so tests can
//! assert on exact remote traffic, and it can be loaded from and saved to a
//! JSON state file so the CLI can run against it end to end.
//!
//! # Example
//!
//! ```ignore
//! use extsync_registry_memory::InMemoryRegistry;
//! use extsync_registry::{CreateExtensionInput, RemoteRegistry};
//!
//! let registry = InMemoryRegistry::new();
//! let created = registry.create_extension(input).await?;
//! assert_eq!(registry.create_count().await, 1);
//! ```

mod registry;

pub use extsync_registry::{RegistryError, RemoteRegistry};
pub use registry::{InMemoryRegistry, RegistryCall, RegistryOptions};

/// Creates a new shareable in-memory registry.
pub fn create_registry() -> extsync_registry::DynRegistry {
    std::sync::Arc::new(InMemoryRegistry::new())
}
