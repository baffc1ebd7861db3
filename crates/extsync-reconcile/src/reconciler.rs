//! Orchestration of a full reconciliation run.

use std::collections::HashSet;
use std::sync::Arc;

use extsync_core::{IdentifierMap, LocalSource, MatchKey, RemoteSource, SpecificationRegistry};
use extsync_registry::DynRegistry;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::commit::{create_extensions, matched_extension_ids, verify_canonical_coverage};
use crate::error::ReconcileError;
use crate::instances::{NonCanonicalIds, reconcile_non_canonical};
use crate::manual::{ManualMatchGroup, ManualMatcher, ResolverManualMatcher, validate_manual_result};
use crate::matching::automatic_matchmaking;
use crate::migration::{MigrationCandidate, apply_migrations, extensions_to_migrate, migrate_extensions};
use crate::partition::partition_registrations;
use crate::resolver::{DeploySummary, DynResolver};

/// Inputs of a run that do not come from the remote listing.
#[derive(Debug, Clone, Default)]
pub struct ReconcileOptions {
    pub api_key: String,
    /// Identifiers recorded by a previous run
    pub identifiers: IdentifierMap,
    pub include_config_on_deploy: bool,
    pub include_draft_extensions: bool,
    /// Informational, shown in the deploy summary
    pub release: bool,
    /// Skip the deploy confirmation
    pub force: bool,
    pub match_key: MatchKey,
}

impl ReconcileOptions {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    fn includes_non_canonical(&self) -> bool {
        self.include_config_on_deploy || self.include_draft_extensions
    }
}

/// Outcome of matching, before anything is created.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionsToConfirm {
    pub extensions_to_create: Vec<LocalSource>,
    /// Handle to remote uuid
    pub valid_matches: IdentifierMap,
    /// Registrations managed only from the dashboard
    pub dashboard_only_extensions: Vec<RemoteSource>,
    /// Registrations no local source claimed
    pub unmatched_remote: Vec<RemoteSource>,
}

impl ExtensionsToConfirm {
    pub fn summary(&self, release: bool) -> DeploySummary {
        DeploySummary {
            to_create: self
                .extensions_to_create
                .iter()
                .map(|source| source.handle.clone())
                .collect(),
            matched: self.valid_matches.clone(),
            dashboard_only: titles(&self.dashboard_only_extensions),
            unmatched_remote: titles(&self.unmatched_remote),
            release,
        }
    }
}

fn titles(registrations: &[RemoteSource]) -> Vec<String> {
    registrations
        .iter()
        .map(|registration| registration.title.clone())
        .collect()
}

/// Identifiers after commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentIds {
    /// Canonical handle to uuid
    pub extensions: IdentifierMap,
    /// Handle to id, canonical and configuration-managed singletons
    pub extension_ids: IdentifierMap,
    pub extensions_non_uuid_managed: IndexMap<String, Vec<String>>,
    pub extension_ids_non_uuid_managed: IndexMap<String, Vec<String>>,
}

impl DeploymentIds {
    /// Canonical identifiers in the form a later run reads back under `key`.
    ///
    /// Handles without a known id are left out under [`MatchKey::Id`].
    pub fn recorded_identifiers(&self, key: MatchKey) -> IdentifierMap {
        match key {
            MatchKey::Uuid => self.extensions.clone(),
            MatchKey::Id => self
                .extensions
                .keys()
                .filter_map(|handle| {
                    self.extension_ids
                        .get(handle)
                        .map(|id| (handle.clone(), id.clone()))
                })
                .collect(),
        }
    }
}

/// What a dry run would do.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub migrations: Vec<MigrationCandidate>,
    pub extensions: ExtensionsToConfirm,
    /// Registrations handled by the non-canonical reconciler
    pub configuration_managed: Vec<RemoteSource>,
}

/// Runs reconciliation against a registry, asking a resolver when needed.
pub struct Reconciler {
    registry: DynRegistry,
    resolver: DynResolver,
    manual_matcher: Option<Arc<dyn ManualMatcher>>,
    specs: SpecificationRegistry,
    options: ReconcileOptions,
}

impl Reconciler {
    pub fn new(registry: DynRegistry, resolver: DynResolver, options: ReconcileOptions) -> Self {
        Self {
            registry,
            resolver,
            manual_matcher: None,
            specs: SpecificationRegistry::builtin(),
            options,
        }
    }

    /// Use `matcher` instead of asking the resolver to pick candidates.
    pub fn with_manual_matcher(mut self, matcher: Arc<dyn ManualMatcher>) -> Self {
        self.manual_matcher = Some(matcher);
        self
    }

    pub fn with_specifications(mut self, specs: SpecificationRegistry) -> Self {
        self.specs = specs;
        self
    }

    /// Match canonical sources against `remote`.
    ///
    /// Migrations are confirmed and executed first, and `remote` is updated
    /// in place to their new types. Declining the migration aborts before
    /// any remote call.
    pub async fn ensure_extensions_ids(
        &self,
        local: &[LocalSource],
        remote: &mut Vec<RemoteSource>,
        dashboard_managed: &[RemoteSource],
    ) -> Result<ExtensionsToConfirm, ReconcileError> {
        let (confirmed, _) = self
            .match_extensions(local, remote, dashboard_managed, false)
            .await?;
        Ok(confirmed)
    }

    async fn match_extensions(
        &self,
        local: &[LocalSource],
        remote: &mut Vec<RemoteSource>,
        dashboard_managed: &[RemoteSource],
        dry_run: bool,
    ) -> Result<(ExtensionsToConfirm, Vec<MigrationCandidate>), ReconcileError> {
        let canonical: Vec<LocalSource> = local
            .iter()
            .filter(|source| source.is_canonical())
            .cloned()
            .collect();
        warn_duplicate_handles(&canonical);

        let migrations =
            extensions_to_migrate(&canonical, remote, &self.options.identifiers, &self.specs);
        if !migrations.is_empty() {
            if !self.resolver.confirm_migration(&migrations).await? {
                info!(count = migrations.len(), "Migration declined");
                return Err(ReconcileError::AbortSilent);
            }
            if dry_run {
                apply_migrations(remote, &migrations);
            } else {
                migrate_extensions(
                    self.registry.as_ref(),
                    &self.options.api_key,
                    &migrations,
                    remote,
                )
                .await?;
            }
        }

        let key = self.options.match_key;
        let matches = automatic_matchmaking(&canonical, remote, &self.options.identifiers, key);
        matches.verify(canonical.len(), remote.len())?;

        let mut valid_matches = IdentifierMap::new();
        for (l, r) in &matches.identifiers {
            valid_matches.insert(canonical[l.0].handle.clone(), remote[r.0].uuid.clone());
        }

        let mut extensions_to_create: Vec<LocalSource> = matches
            .to_create
            .iter()
            .map(|l| canonical[l.0].clone())
            .collect();

        for (l, r) in &matches.to_confirm {
            let (source, registration) = (&canonical[l.0], &remote[r.0]);
            if self.resolver.confirm_match(source, registration).await? {
                debug!(handle = %source.handle, uuid = %registration.uuid, "Rename confirmed");
                valid_matches.insert(source.handle.clone(), registration.uuid.clone());
            } else {
                debug!(handle = %source.handle, uuid = %registration.uuid, "Rename declined");
                extensions_to_create.push(source.clone());
            }
        }

        let manual = &matches.to_manual_match;
        let unmatched_remote: Vec<_> = if manual.local.is_empty() {
            manual.remote.iter().map(|r| remote[r.0].clone()).collect()
        } else {
            let group = ManualMatchGroup {
                local: manual.local.iter().map(|l| &canonical[l.0]).collect(),
                remote: manual.remote.iter().map(|r| &remote[r.0]).collect(),
            };
            let result = match &self.manual_matcher {
                Some(matcher) => matcher.manual_match(&group, key).await?,
                None => {
                    ResolverManualMatcher::new(self.resolver.clone())
                        .manual_match(&group, key)
                        .await?
                }
            };
            validate_manual_result(&result, group.local.len(), group.remote.len())?;

            for (l, r) in &result.identifiers {
                valid_matches.insert(group.local[*l].handle.clone(), group.remote[*r].uuid.clone());
            }
            extensions_to_create.extend(result.to_create.iter().map(|l| group.local[*l].clone()));
            result
                .only_remote
                .iter()
                .map(|r| group.remote[*r].clone())
                .collect()
        };

        info!(
            matched = valid_matches.len(),
            to_create = extensions_to_create.len(),
            unmatched_remote = unmatched_remote.len(),
            "Extensions matched"
        );

        let confirmed = ExtensionsToConfirm {
            extensions_to_create,
            valid_matches,
            dashboard_only_extensions: dashboard_managed.to_vec(),
            unmatched_remote,
        };
        Ok((confirmed, migrations))
    }

    /// Create what is missing and assemble the final identifiers.
    ///
    /// `remote_extensions` is the folder-based listing used to resolve ids of
    /// matched handles. `configuration_registrations` feeds the
    /// non-canonical reconciler.
    pub async fn deploy_confirmed(
        &self,
        local: &[LocalSource],
        remote_extensions: &[RemoteSource],
        configuration_registrations: &[RemoteSource],
        confirmed: &ExtensionsToConfirm,
    ) -> Result<DeploymentIds, ReconcileError> {
        let non_canonical = if self.options.includes_non_canonical() {
            reconcile_non_canonical(
                self.registry.as_ref(),
                &self.options.api_key,
                local,
                configuration_registrations,
            )
            .await?
        } else {
            debug!("Configuration not included, skipping non-canonical sources");
            NonCanonicalIds::default()
        };

        let created = create_extensions(
            self.registry.as_ref(),
            &self.options.api_key,
            &confirmed.extensions_to_create,
        )
        .await?;

        let mut extensions = confirmed.valid_matches.clone();
        extensions.extend(created.extensions);

        let mut extension_ids = matched_extension_ids(&confirmed.valid_matches, remote_extensions);
        extension_ids.extend(created.extension_ids);
        extension_ids.extend(non_canonical.singleton_ids);

        verify_canonical_coverage(local, &extensions)?;

        info!(
            extensions = extensions.len(),
            non_uuid_managed = non_canonical.uuids.len(),
            "Deployment identifiers ready"
        );

        Ok(DeploymentIds {
            extensions,
            extension_ids,
            extensions_non_uuid_managed: non_canonical.uuids,
            extension_ids_non_uuid_managed: non_canonical.ids,
        })
    }

    /// List, match, confirm and commit.
    pub async fn ensure_deployment_ids(
        &self,
        local: &[LocalSource],
    ) -> Result<DeploymentIds, ReconcileError> {
        let listing = self
            .registry
            .list_registrations(&self.options.api_key)
            .await
            .map_err(ReconcileError::Listing)?;
        let partitioned = partition_registrations(
            listing.extension_registrations,
            listing.configuration_registrations,
            &self.specs,
        );
        let mut remote = partitioned.not_managed_in_config;

        let confirmed = self
            .ensure_extensions_ids(local, &mut remote, &listing.dashboard_managed_registrations)
            .await?;

        if !self.options.force {
            let summary = confirmed.summary(self.options.release);
            if !self.resolver.confirm_deploy(&summary).await? {
                info!("Deploy declined");
                return Err(ReconcileError::AbortSilent);
            }
        }

        self.deploy_confirmed(local, &remote, &partitioned.all_managed_in_config, &confirmed)
            .await
    }

    /// List and match without creating or migrating anything remotely.
    pub async fn plan(&self, local: &[LocalSource]) -> Result<Plan, ReconcileError> {
        let listing = self
            .registry
            .list_registrations(&self.options.api_key)
            .await
            .map_err(ReconcileError::Listing)?;
        let partitioned = partition_registrations(
            listing.extension_registrations,
            listing.configuration_registrations,
            &self.specs,
        );
        let mut remote = partitioned.not_managed_in_config;

        let (extensions, migrations) = self
            .match_extensions(local, &mut remote, &listing.dashboard_managed_registrations, true)
            .await?;

        Ok(Plan {
            migrations,
            extensions,
            configuration_managed: partitioned.all_managed_in_config,
        })
    }
}

/// Handles declared more than once, each reported once, in first-repeat order.
fn duplicate_handles(sources: &[LocalSource]) -> Vec<&str> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for source in sources {
        let handle = source.handle.as_str();
        if !seen.insert(handle) && !duplicates.contains(&handle) {
            duplicates.push(handle);
        }
    }
    duplicates
}

fn warn_duplicate_handles(sources: &[LocalSource]) {
    for handle in duplicate_handles(sources) {
        warn!(
            %handle,
            "Duplicate handle, the later source replaces the earlier identifier"
        );
    }
}
