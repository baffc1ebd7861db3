//! Creation of missing canonical registrations.

use extsync_core::{IdentifierMap, LocalSource, RemoteSource};
use extsync_registry::{CreateExtensionInput, RemoteRegistry};
use tracing::{debug, info};

use crate::error::{ReconcileError, RemoteOperation};

/// Identifiers of registrations created during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatedExtensions {
    /// Handle to uuid
    pub extensions: IdentifierMap,
    /// Handle to id
    pub extension_ids: IdentifierMap,
}

/// Create one registration per source, sequentially and in order.
///
/// The first failure ends the run. Registrations created before it are not
/// rolled back. Duplicate handles are each created; the later one wins in
/// the returned maps.
pub async fn create_extensions(
    registry: &dyn RemoteRegistry,
    api_key: &str,
    to_create: &[LocalSource],
) -> Result<CreatedExtensions, ReconcileError> {
    let mut created = CreatedExtensions::default();

    for source in to_create {
        let input = CreateExtensionInput::for_source(api_key, source);
        let registration = registry.create_extension(input).await.map_err(|source_err| {
            ReconcileError::remote_call(RemoteOperation::Create, &source.handle, source_err)
        })?;

        debug!(
            handle = %source.handle,
            uuid = %registration.uuid,
            id = %registration.id,
            "Created registration"
        );
        created
            .extensions
            .insert(source.handle.clone(), registration.uuid);
        created
            .extension_ids
            .insert(source.handle.clone(), registration.id);
    }

    if !to_create.is_empty() {
        info!(
            backend = registry.backend_name(),
            created = to_create.len(),
            "Extensions created"
        );
    }
    Ok(created)
}

/// Look up the remote id of every matched handle.
///
/// Handles whose uuid is not in `remote` are skipped.
pub fn matched_extension_ids(
    valid_matches: &IdentifierMap,
    remote: &[RemoteSource],
) -> IdentifierMap {
    valid_matches
        .iter()
        .filter_map(|(handle, uuid)| {
            let found = remote.iter().find(|registration| &registration.uuid == uuid);
            if found.is_none() {
                debug!(%handle, %uuid, "Matched uuid not in listing, no id recorded");
            }
            found.map(|registration| (handle.clone(), registration.id.clone()))
        })
        .collect()
}

/// Every canonical local handle must have a uuid once commit is done.
pub fn verify_canonical_coverage(
    local: &[LocalSource],
    extensions: &IdentifierMap,
) -> Result<(), ReconcileError> {
    match local
        .iter()
        .filter(|source| source.is_canonical())
        .find(|source| !extensions.contains_key(&source.handle))
    {
        Some(source) => Err(ReconcileError::invariant(format!(
            "source '{}' has no identifier after commit",
            source.handle
        ))),
        None => Ok(()),
    }
}
