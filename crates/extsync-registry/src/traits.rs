//! Registry traits.

use async_trait::async_trait;
use extsync_core::RemoteSource;

use crate::error::RegistryError;
use crate::types::{CreateExtensionInput, MigrateTypeInput, RemoteListing};

/// The operations the reconciliation core needs from the remote platform.
///
/// Implementations must be thread-safe (`Send + Sync`). The core awaits one
/// call at a time, so implementations do not need to handle concurrent
/// mutations from a single run.
///
/// # Example
///
/// ```ignore
/// use extsync_registry::{RemoteRegistry, RegistryError};
///
/// async fn count(registry: &dyn RemoteRegistry, api_key: &str) -> Result<usize, RegistryError> {
///     Ok(registry.list_registrations(api_key).await?.len())
/// }
/// ```
#[async_trait]
pub trait RemoteRegistry: Send + Sync {
    /// Lists every registration of the app identified by `api_key`.
    ///
    /// # Errors
    ///
    /// Returns an error for infrastructure issues.
    async fn list_registrations(&self, api_key: &str) -> Result<RemoteListing, RegistryError>;

    /// Creates a registration and returns it as the registry stored it.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Connection` when the registry cannot be reached.
    async fn create_extension(
        &self,
        input: CreateExtensionInput,
    ) -> Result<RemoteSource, RegistryError>;

    /// Rewrites the type of an existing registration.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NotFound` if the registration does not exist.
    async fn migrate_type(&self, input: MigrateTypeInput) -> Result<(), RegistryError>;

    /// Name of this backend for logging.
    fn backend_name(&self) -> &'static str;
}
