//! # extsync-reconcile
//!
//! Reconciles locally declared extension sources against the registrations
//! a remote registry already holds.
//!
//! A run goes through these phases, in order:
//!
//! 1. [`partition_registrations`] splits the remote listing into folder-based
//!    and configuration-managed registrations.
//! 2. [`extensions_to_migrate`] finds registrations of a superseded type and,
//!    once confirmed, migrates them.
//! 3. [`automatic_matchmaking`] pairs locals with remotes by prior identifier,
//!    by title and by type.
//! 4. A [`ManualMatcher`] resolves whatever stays ambiguous.
//! 5. The commit phase creates what is missing and assembles [`DeploymentIds`].
//!
//! Every prompt goes through an injected [`Resolver`], so the whole pipeline
//! runs deterministically under test.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use extsync_reconcile::{Reconciler, ReconcileOptions, StaticResolver};
//!
//! let reconciler = Reconciler::new(registry, Arc::new(StaticResolver::accept_all()), options);
//! let ids = reconciler.ensure_deployment_ids(&local).await?;
//! println!("{:?}", ids.extensions);
//! ```

mod commit;
mod error;
mod instances;
mod manual;
mod matching;
mod migration;
mod partition;
mod reconciler;
mod resolver;

pub use commit::{
    CreatedExtensions, create_extensions, matched_extension_ids, verify_canonical_coverage,
};
pub use error::{ErrorCategory, ReconcileError, RemoteOperation, ResolverError};
pub use instances::{NonCanonicalIds, reconcile_non_canonical};
pub use manual::{
    ManualMatchGroup, ManualMatchResult, ManualMatcher, ResolverManualMatcher,
    validate_manual_result,
};
pub use matching::{
    LocalIdx, ManualMatchCandidates, MatchResult, RemoteIdx, automatic_matchmaking,
};
pub use migration::{
    MigrationCandidate, apply_migrations, extensions_to_migrate, migrate_extensions,
};
pub use partition::{PartitionedRegistrations, partition_registrations};
pub use reconciler::{DeploymentIds, ExtensionsToConfirm, Plan, ReconcileOptions, Reconciler};
pub use resolver::{DeploySummary, DynResolver, Resolver, StaticResolver};
