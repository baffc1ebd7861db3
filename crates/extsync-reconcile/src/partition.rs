//! Splitting of the remote listing by management policy.
//!
//! Configuration-managed registrations never reach the canonical matcher.

use extsync_core::{RemoteSource, SpecificationRegistry};
use tracing::debug;

/// Remote registrations split by how their lifecycle is managed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionedRegistrations {
    /// Folder-based registrations, eligible for matching and creation
    pub not_managed_in_config: Vec<RemoteSource>,
    /// Configuration registrations, then extension registrations of a
    /// configuration-managed type
    pub all_managed_in_config: Vec<RemoteSource>,
}

/// Split a listing before any matching runs.
///
/// Classification is a type lookup against `specs`. A type `specs` does not
/// know stays folder-based.
pub fn partition_registrations(
    extension_registrations: Vec<RemoteSource>,
    configuration_registrations: Vec<RemoteSource>,
    specs: &SpecificationRegistry,
) -> PartitionedRegistrations {
    let (managed, not_managed): (Vec<_>, Vec<_>) = extension_registrations
        .into_iter()
        .partition(|registration| specs.is_configuration_managed(&registration.kind));

    let mut all_managed_in_config = configuration_registrations;
    all_managed_in_config.extend(managed);

    debug!(
        not_managed = not_managed.len(),
        managed = all_managed_in_config.len(),
        "Partitioned registrations"
    );

    PartitionedRegistrations {
        not_managed_in_config: not_managed,
        all_managed_in_config,
    }
}
