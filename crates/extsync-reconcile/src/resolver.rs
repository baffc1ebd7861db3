//! Human decision boundary.
//!
//! Every question the reconciliation asks goes through [`Resolver`], so the
//! algorithm itself never touches a terminal.

use std::sync::Arc;

use async_trait::async_trait;
use extsync_core::{IdentifierMap, LocalSource, RemoteSource};
use serde::Serialize;

use crate::error::ResolverError;
use crate::migration::MigrationCandidate;

/// What a deploy is about to do, shown before anything is created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploySummary {
    /// Handles that will get a new registration
    pub to_create: Vec<String>,
    /// Handle to remote uuid
    pub matched: IdentifierMap,
    /// Titles of registrations only managed from the dashboard
    pub dashboard_only: Vec<String>,
    /// Titles of registrations no local source claimed
    pub unmatched_remote: Vec<String>,
    pub release: bool,
}

impl DeploySummary {
    pub fn has_creations(&self) -> bool {
        !self.to_create.is_empty()
    }
}

/// Answers the questions a reconciliation run asks.
///
/// Implementations must be `Send + Sync`. Calls are made one at a time, in
/// the order the run needs them.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Accept `remote` as the counterpart of `local` although their titles differ.
    async fn confirm_match(
        &self,
        local: &LocalSource,
        remote: &RemoteSource,
    ) -> Result<bool, ResolverError>;

    /// Accept migrating every listed registration to its new type.
    async fn confirm_migration(
        &self,
        candidates: &[MigrationCandidate],
    ) -> Result<bool, ResolverError>;

    /// Accept the deploy described by `summary`.
    async fn confirm_deploy(&self, summary: &DeploySummary) -> Result<bool, ResolverError>;

    /// Pick the counterpart of `local` among `candidates`.
    ///
    /// Returns the position in `candidates`, or `None` to create a new
    /// registration instead.
    async fn select_remote(
        &self,
        local: &LocalSource,
        candidates: &[&RemoteSource],
    ) -> Result<Option<usize>, ResolverError>;
}

/// Type alias for a shared resolver trait object.
pub type DynResolver = Arc<dyn Resolver>;

/// Resolver that gives the same answer to every question.
///
/// When accepting, [`Resolver::select_remote`] picks the first candidate.
#[derive(Debug, Clone, Copy)]
pub struct StaticResolver {
    accept: bool,
}

impl StaticResolver {
    pub fn accept_all() -> Self {
        Self { accept: true }
    }

    pub fn decline_all() -> Self {
        Self { accept: false }
    }
}

#[async_trait]
impl Resolver for StaticResolver {
    async fn confirm_match(
        &self,
        _local: &LocalSource,
        _remote: &RemoteSource,
    ) -> Result<bool, ResolverError> {
        Ok(self.accept)
    }

    async fn confirm_migration(
        &self,
        _candidates: &[MigrationCandidate],
    ) -> Result<bool, ResolverError> {
        Ok(self.accept)
    }

    async fn confirm_deploy(&self, _summary: &DeploySummary) -> Result<bool, ResolverError> {
        Ok(self.accept)
    }

    async fn select_remote(
        &self,
        _local: &LocalSource,
        candidates: &[&RemoteSource],
    ) -> Result<Option<usize>, ResolverError> {
        Ok((self.accept && !candidates.is_empty()).then_some(0))
    }
}
