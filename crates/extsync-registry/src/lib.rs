//! # extsync-registry
//!
//! Remote registry abstraction for extsync.
//!
//! This crate defines the contract the reconciliation core uses to talk to the
//! platform that owns extension registrations. It does not contain a network
//! client; backends live in separate crates.
//!
//! ## Overview
//!
//! The main trait is [`RemoteRegistry`], which covers:
//! - listing the registrations of an app
//! - creating a registration
//! - migrating a registration to a newer type
//!
//! ## Example
//!
//! ```ignore
//! use extsync_registry::{CreateExtensionInput, RemoteRegistry, RegistryError};
//!
//! async fn create_one(
//!     registry: &dyn RemoteRegistry,
//!     input: CreateExtensionInput,
//! ) -> Result<String, RegistryError> {
//!     let created = registry.create_extension(input).await?;
//!     Ok(created.uuid)
//! }
//! ```

mod error;
mod traits;
mod types;

pub use error::{ErrorCategory, RegistryError};
pub use traits::RemoteRegistry;
pub use types::{CreateExtensionInput, MigrateTypeInput, RemoteListing};

/// Type alias for a registry result.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Type alias for a shared registry trait object.
pub type DynRegistry = std::sync::Arc<dyn RemoteRegistry>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use extsync_registry::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{ErrorCategory, RegistryError};
    pub use crate::traits::RemoteRegistry;
    pub use crate::types::{CreateExtensionInput, MigrateTypeInput, RemoteListing};
    pub use crate::{DynRegistry, RegistryResult};
}
