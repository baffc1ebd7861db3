//! Manual matching of ambiguous leftovers.
//!
//! How a [`ManualMatcher`] decides is up to the implementation. The core only
//! checks the shape of what comes back.

use std::collections::HashSet;

use async_trait::async_trait;
use extsync_core::{LocalSource, MatchKey, RemoteSource};
use tracing::{debug, warn};

use crate::error::{ReconcileError, ResolverError};
use crate::resolver::DynResolver;

/// Sources and registrations handed to a manual matcher.
#[derive(Debug, Clone, Default)]
pub struct ManualMatchGroup<'a> {
    pub local: Vec<&'a LocalSource>,
    pub remote: Vec<&'a RemoteSource>,
}

/// Decisions of a manual matcher. Positions index into the group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualMatchResult {
    /// (local position, remote position)
    pub identifiers: Vec<(usize, usize)>,
    pub to_create: Vec<usize>,
    /// Remote positions nobody claimed
    pub only_remote: Vec<usize>,
}

/// Resolves ambiguous leftovers, usually by asking a human.
#[async_trait]
pub trait ManualMatcher: Send + Sync {
    async fn manual_match(
        &self,
        group: &ManualMatchGroup<'_>,
        key: MatchKey,
    ) -> Result<ManualMatchResult, ResolverError>;
}

/// Walks the group's locals in order and lets a [`Resolver`](crate::Resolver)
/// pick among the unclaimed registrations of the same type.
pub struct ResolverManualMatcher {
    resolver: DynResolver,
}

impl ResolverManualMatcher {
    pub fn new(resolver: DynResolver) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl ManualMatcher for ResolverManualMatcher {
    async fn manual_match(
        &self,
        group: &ManualMatchGroup<'_>,
        key: MatchKey,
    ) -> Result<ManualMatchResult, ResolverError> {
        let mut result = ManualMatchResult::default();
        let mut claimed = vec![false; group.remote.len()];

        for (li, local) in group.local.iter().enumerate() {
            let positions: Vec<usize> = group
                .remote
                .iter()
                .enumerate()
                .filter(|(ri, remote)| !claimed[*ri] && local.same_type(remote))
                .map(|(ri, _)| ri)
                .collect();
            if positions.is_empty() {
                result.to_create.push(li);
                continue;
            }

            let candidates: Vec<&RemoteSource> =
                positions.iter().map(|&ri| group.remote[ri]).collect();
            match self.resolver.select_remote(local, &candidates).await? {
                Some(choice) if choice < positions.len() => {
                    let ri = positions[choice];
                    debug!(
                        handle = %local.handle,
                        %key,
                        value = key.of(group.remote[ri]),
                        "Manually matched"
                    );
                    claimed[ri] = true;
                    result.identifiers.push((li, ri));
                }
                Some(choice) => {
                    warn!(
                        handle = %local.handle,
                        choice,
                        candidates = positions.len(),
                        "Selection out of range, creating instead"
                    );
                    result.to_create.push(li);
                }
                None => result.to_create.push(li),
            }
        }

        result.only_remote = claimed
            .iter()
            .enumerate()
            .filter(|(_, claimed)| !**claimed)
            .map(|(ri, _)| ri)
            .collect();
        Ok(result)
    }
}

/// Check a manual matcher's answer against the group it was given.
///
/// Every local position must appear in exactly one of `identifiers` and
/// `to_create`. Remote positions must be in range and used once across
/// `identifiers` and `only_remote`.
pub fn validate_manual_result(
    result: &ManualMatchResult,
    local_len: usize,
    remote_len: usize,
) -> Result<(), ReconcileError> {
    let mut seen_local = vec![false; local_len];
    let locals = result
        .identifiers
        .iter()
        .map(|(local, _)| *local)
        .chain(result.to_create.iter().copied());
    for index in locals {
        match seen_local.get_mut(index) {
            Some(true) => {
                return Err(ReconcileError::invariant(format!(
                    "manual match placed local {index} twice"
                )));
            }
            Some(slot) => *slot = true,
            None => {
                return Err(ReconcileError::invariant(format!(
                    "manual match returned local {index}, group has {local_len}"
                )));
            }
        }
    }
    if let Some(index) = seen_local.iter().position(|seen| !seen) {
        return Err(ReconcileError::invariant(format!(
            "manual match dropped local {index}"
        )));
    }

    let mut seen_remote = HashSet::new();
    let remotes = result
        .identifiers
        .iter()
        .map(|(_, remote)| *remote)
        .chain(result.only_remote.iter().copied());
    for index in remotes {
        if index >= remote_len {
            return Err(ReconcileError::invariant(format!(
                "manual match returned remote {index}, group has {remote_len}"
            )));
        }
        if !seen_remote.insert(index) {
            return Err(ReconcileError::invariant(format!(
                "manual match used remote {index} twice"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::resolver::StaticResolver;

    fn fixtures() -> (Vec<LocalSource>, Vec<RemoteSource>) {
        let local = vec![
            LocalSource::new("A", "checkout_post_purchase", "CHECKOUT_POST_PURCHASE"),
            LocalSource::new("B", "function", "FUNCTION"),
        ];
        let remote = vec![
            RemoteSource::new("UUID_X", "X", "X", "CHECKOUT_POST_PURCHASE"),
            RemoteSource::new("UUID_Y", "Y", "Y", "CHECKOUT_POST_PURCHASE"),
            RemoteSource::new("UUID_Z", "Z", "Z", "THEME_APP_EXTENSION"),
        ];
        (local, remote)
    }

    #[tokio::test]
    async fn test_resolver_matcher_accepting() {
        let (local, remote) = fixtures();
        let group = ManualMatchGroup {
            local: local.iter().collect(),
            remote: remote.iter().collect(),
        };
        let matcher = ResolverManualMatcher::new(Arc::new(StaticResolver::accept_all()));

        let result = matcher.manual_match(&group, MatchKey::Uuid).await.unwrap();

        assert_eq!(result.identifiers, vec![(0, 0)]);
        assert_eq!(result.to_create, vec![1]);
        assert_eq!(result.only_remote, vec![1, 2]);
        validate_manual_result(&result, 2, 3).unwrap();
    }

    #[tokio::test]
    async fn test_resolver_matcher_declining() {
        let (local, remote) = fixtures();
        let group = ManualMatchGroup {
            local: local.iter().collect(),
            remote: remote.iter().collect(),
        };
        let matcher = ResolverManualMatcher::new(Arc::new(StaticResolver::decline_all()));

        let result = matcher.manual_match(&group, MatchKey::Uuid).await.unwrap();

        assert!(result.identifiers.is_empty());
        assert_eq!(result.to_create, vec![0, 1]);
        assert_eq!(result.only_remote, vec![0, 1, 2]);
    }

    #[test]
    fn test_validate_rejects_dropped_local() {
        let result = ManualMatchResult {
            identifiers: vec![(0, 0)],
            ..Default::default()
        };
        assert!(validate_manual_result(&result, 2, 1).is_err());
    }

    #[test]
    fn test_validate_rejects_double_remote() {
        let result = ManualMatchResult {
            identifiers: vec![(0, 0), (1, 0)],
            ..Default::default()
        };
        assert!(validate_manual_result(&result, 2, 1).is_err());

        let result = ManualMatchResult {
            identifiers: vec![(0, 0)],
            only_remote: vec![0],
            ..Default::default()
        };
        assert!(validate_manual_result(&result, 1, 1).is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let result = ManualMatchResult {
            to_create: vec![3],
            ..Default::default()
        };
        assert!(validate_manual_result(&result, 1, 0).is_err());
    }
}
