//! Type migration of registrations created under a superseded type.

use extsync_core::{IdentifierMap, LocalSource, RemoteSource, ResourceType, SpecificationRegistry};
use extsync_registry::{MigrateTypeInput, RemoteRegistry};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{ReconcileError, RemoteOperation};

/// A registration that should move to its local source's newer type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationCandidate {
    /// Handle of the local source claiming the registration
    pub handle: String,
    pub registration: RemoteSource,
    pub to_type: ResourceType,
}

impl MigrationCandidate {
    pub fn from_type(&self) -> &ResourceType {
        &self.registration.kind
    }
}

/// Find registrations whose type is a legacy predecessor of a local type.
///
/// The registration must be referenced by the local source's prior
/// identifier (uuid or id), or carry its title or handle. Each registration
/// is claimed at most once, by the first local source in input order.
pub fn extensions_to_migrate(
    local: &[LocalSource],
    remote: &[RemoteSource],
    prior: &IdentifierMap,
    specs: &SpecificationRegistry,
) -> Vec<MigrationCandidate> {
    let mut claimed = vec![false; remote.len()];
    let mut candidates = Vec::new();

    for source in local {
        let Some(spec) = specs.get(&source.graphql_type) else {
            continue;
        };
        if spec.legacy_types.is_empty() {
            continue;
        }
        let prior_value = prior
            .get(&source.handle)
            .map(String::as_str)
            .or(source.uuid.as_deref());

        let found = remote.iter().enumerate().position(|(ri, registration)| {
            !claimed[ri]
                && spec.supersedes(&registration.kind)
                && (prior_value
                    .is_some_and(|value| value == registration.uuid || value == registration.id)
                    || source.title_matches(registration))
        });

        if let Some(ri) = found {
            let registration = &remote[ri];
            debug!(
                handle = %source.handle,
                uuid = %registration.uuid,
                from = %registration.kind,
                to = %source.graphql_type,
                "Registration needs a type migration"
            );
            claimed[ri] = true;
            candidates.push(MigrationCandidate {
                handle: source.handle.clone(),
                registration: registration.clone(),
                to_type: source.graphql_type.clone(),
            });
        }
    }

    candidates
}

/// Rewrite the type of every migrated registration in `remote`.
pub fn apply_migrations(remote: &mut [RemoteSource], candidates: &[MigrationCandidate]) {
    for candidate in candidates {
        if let Some(registration) = remote
            .iter_mut()
            .find(|registration| registration.uuid == candidate.registration.uuid)
        {
            registration.kind = candidate.to_type.clone();
        }
    }
}

/// Migrate each candidate remotely, in order, then rewrite `remote` so the
/// migrated registrations match like native ones.
///
/// Stops at the first failing call. Migrations already done stay done.
pub async fn migrate_extensions(
    registry: &dyn RemoteRegistry,
    api_key: &str,
    candidates: &[MigrationCandidate],
    remote: &mut [RemoteSource],
) -> Result<(), ReconcileError> {
    for candidate in candidates {
        let input = MigrateTypeInput {
            api_key: api_key.to_string(),
            registration_id: candidate.registration.id.clone(),
            registration_uuid: candidate.registration.uuid.clone(),
            from_type: candidate.from_type().clone(),
            to_type: candidate.to_type.clone(),
        };
        registry.migrate_type(input).await.map_err(|source| {
            ReconcileError::remote_call(RemoteOperation::Migrate, &candidate.handle, source)
        })?;
    }
    apply_migrations(remote, candidates);

    info!(
        backend = registry.backend_name(),
        migrated = candidates.len(),
        "Registrations migrated"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ui_extension(title: &str) -> LocalSource {
        LocalSource::new(title, "ui_extension", "UI_EXTENSION")
    }

    #[test]
    fn test_finds_legacy_type_by_title() {
        let specs = SpecificationRegistry::builtin();
        let local = vec![ui_extension("Checkout Banner")];
        let remote = vec![
            RemoteSource::new("UUID_OTHER", "1", "Unrelated", "CHECKOUT_UI_EXTENSION"),
            RemoteSource::new("UUID_BANNER", "2", "Checkout Banner", "CHECKOUT_UI_EXTENSION"),
        ];

        let candidates = extensions_to_migrate(&local, &remote, &IdentifierMap::new(), &specs);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].handle, "checkout-banner");
        assert_eq!(candidates[0].registration.uuid, "UUID_BANNER");
        assert_eq!(candidates[0].from_type().as_str(), "CHECKOUT_UI_EXTENSION");
        assert_eq!(candidates[0].to_type.as_str(), "UI_EXTENSION");
    }

    #[test]
    fn test_finds_legacy_type_by_prior_id() {
        let specs = SpecificationRegistry::builtin();
        let local = vec![ui_extension("Renamed")];
        let remote = vec![RemoteSource::new("UUID_A", "A", "Old Name", "POS_UI_EXTENSION")];
        let prior = IdentifierMap::from([("renamed".to_string(), "A".to_string())]);

        let candidates = extensions_to_migrate(&local, &remote, &prior, &specs);
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn test_ignores_current_and_unrelated_types() {
        let specs = SpecificationRegistry::builtin();
        let local = vec![
            ui_extension("Banner"),
            LocalSource::new("Flow", "function", "FUNCTION"),
        ];
        let remote = vec![
            RemoteSource::new("UUID_A", "A", "Banner", "UI_EXTENSION"),
            RemoteSource::new("UUID_B", "B", "Flow", "FLOW_ACTION_DEFINITION"),
        ];

        assert!(extensions_to_migrate(&local, &remote, &IdentifierMap::new(), &specs).is_empty());
    }

    #[test]
    fn test_each_registration_claimed_once() {
        let specs = SpecificationRegistry::builtin();
        let local = vec![
            ui_extension("Banner").with_uuid("UUID_A"),
            ui_extension("Banner Two").with_uuid("UUID_A"),
        ];
        let remote = vec![RemoteSource::new("UUID_A", "A", "Banner", "CHECKOUT_UI_EXTENSION")];

        let candidates = extensions_to_migrate(&local, &remote, &IdentifierMap::new(), &specs);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].handle, "banner");
    }

    #[test]
    fn test_apply_migrations_rewrites_type() {
        let mut remote = vec![
            RemoteSource::new("UUID_A", "A", "Banner", "CHECKOUT_UI_EXTENSION"),
            RemoteSource::new("UUID_B", "B", "Other", "FUNCTION"),
        ];
        let candidates = vec![MigrationCandidate {
            handle: "banner".to_string(),
            registration: remote[0].clone(),
            to_type: "UI_EXTENSION".into(),
        }];

        apply_migrations(&mut remote, &candidates);

        assert_eq!(remote[0].kind.as_str(), "UI_EXTENSION");
        assert_eq!(remote[1].kind.as_str(), "FUNCTION");
    }
}
