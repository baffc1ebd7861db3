//! Automatic matching of local sources against remote registrations.
//!
//! Results are expressed as indices into the caller's slices so later phases
//! can merge them without cloning sources around.

use std::collections::HashSet;

use extsync_core::{IdentifierMap, LocalSource, MatchKey, RemoteSource, ResourceType};
use indexmap::IndexMap;
use tracing::debug;

use crate::error::ReconcileError;

/// Position of a source in the local slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalIdx(pub usize);

/// Position of a registration in the remote slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RemoteIdx(pub usize);

/// Leftovers whose type groups have an ambiguous shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualMatchCandidates {
    pub local: Vec<LocalIdx>,
    pub remote: Vec<RemoteIdx>,
}

/// Outcome of [`automatic_matchmaking`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    /// Pairs accepted without asking
    pub identifiers: Vec<(LocalIdx, RemoteIdx)>,
    /// Same type, different title; needs confirmation
    pub to_confirm: Vec<(LocalIdx, RemoteIdx)>,
    /// No remote of the same type is left
    pub to_create: Vec<LocalIdx>,
    pub to_manual_match: ManualMatchCandidates,
}

impl MatchResult {
    /// Check that every local index sits in exactly one bucket and that no
    /// remote index is paired twice.
    pub fn verify(&self, local_len: usize, remote_len: usize) -> Result<(), ReconcileError> {
        let mut seen_local = vec![false; local_len];
        let locals = self
            .identifiers
            .iter()
            .chain(&self.to_confirm)
            .map(|(local, _)| *local)
            .chain(self.to_create.iter().copied())
            .chain(self.to_manual_match.local.iter().copied());

        for LocalIdx(index) in locals {
            match seen_local.get_mut(index) {
                None => {
                    return Err(ReconcileError::invariant(format!(
                        "local index {index} out of range ({local_len} sources)"
                    )));
                }
                Some(true) => {
                    return Err(ReconcileError::invariant(format!(
                        "local index {index} placed in more than one bucket"
                    )));
                }
                Some(slot) => *slot = true,
            }
        }
        if let Some(index) = seen_local.iter().position(|seen| !seen) {
            return Err(ReconcileError::invariant(format!(
                "local index {index} missing from match result"
            )));
        }

        let mut seen_remote = HashSet::new();
        for (_, RemoteIdx(index)) in self.identifiers.iter().chain(&self.to_confirm) {
            if *index >= remote_len {
                return Err(ReconcileError::invariant(format!(
                    "remote index {index} out of range ({remote_len} registrations)"
                )));
            }
            if !seen_remote.insert(*index) {
                return Err(ReconcileError::invariant(format!(
                    "remote index {index} matched more than once"
                )));
            }
        }
        Ok(())
    }
}

/// Match `local` against `remote`.
///
/// Runs three passes, each only over what the previous ones left:
/// 1. prior identifiers (from `prior`, falling back to the declared uuid
///    when matching by uuid), validated against the remote type;
/// 2. same type and title, where the remote title may equal the local title
///    or handle;
/// 3. grouping by type. A group with no remote is created, a one-to-one
///    group is confirmed, and any other shape goes to manual matching.
///
/// Every output list follows input order.
pub fn automatic_matchmaking(
    local: &[LocalSource],
    remote: &[RemoteSource],
    prior: &IdentifierMap,
    key: MatchKey,
) -> MatchResult {
    let mut result = MatchResult::default();
    let mut local_done = vec![false; local.len()];
    let mut remote_claimed = vec![false; remote.len()];

    for (li, source) in local.iter().enumerate() {
        let prior_value = prior
            .get(&source.handle)
            .map(String::as_str)
            .or_else(|| match key {
                MatchKey::Uuid => source.uuid.as_deref(),
                MatchKey::Id => None,
            });
        let Some(value) = prior_value else {
            continue;
        };

        let found = remote.iter().enumerate().position(|(ri, registration)| {
            !remote_claimed[ri] && key.of(registration) == value && source.same_type(registration)
        });
        match found {
            Some(ri) => {
                debug!(handle = %source.handle, %key, value, "Matched by prior identifier");
                remote_claimed[ri] = true;
                local_done[li] = true;
                result.identifiers.push((LocalIdx(li), RemoteIdx(ri)));
            }
            None => debug!(
                handle = %source.handle,
                %key,
                value,
                "Prior identifier no longer matches a registration"
            ),
        }
    }

    for (li, source) in local.iter().enumerate() {
        if local_done[li] {
            continue;
        }
        let found = remote.iter().enumerate().position(|(ri, registration)| {
            !remote_claimed[ri] && source.same_type(registration) && source.title_matches(registration)
        });
        if let Some(ri) = found {
            debug!(handle = %source.handle, uuid = %remote[ri].uuid, "Matched by title and type");
            remote_claimed[ri] = true;
            local_done[li] = true;
            result.identifiers.push((LocalIdx(li), RemoteIdx(ri)));
        }
    }

    let mut groups: IndexMap<&ResourceType, (Vec<LocalIdx>, Vec<RemoteIdx>)> = IndexMap::new();
    for (li, source) in local.iter().enumerate() {
        if !local_done[li] {
            groups
                .entry(&source.graphql_type)
                .or_default()
                .0
                .push(LocalIdx(li));
        }
    }
    let mut orphans = Vec::new();
    for (ri, registration) in remote.iter().enumerate() {
        if remote_claimed[ri] {
            continue;
        }
        match groups.get_mut(&registration.kind) {
            Some((_, remotes)) => remotes.push(RemoteIdx(ri)),
            None => orphans.push(RemoteIdx(ri)),
        }
    }

    for (kind, (locals, remotes)) in groups {
        match (locals.as_slice(), remotes.as_slice()) {
            (_, []) => {
                debug!(%kind, count = locals.len(), "No registration left, creating");
                result.to_create.extend(locals.iter().copied());
            }
            ([only_local], [only_remote]) => {
                result.to_confirm.push((*only_local, *only_remote));
            }
            _ => {
                debug!(
                    %kind,
                    local = locals.len(),
                    remote = remotes.len(),
                    "Ambiguous type group, deferring to manual matching"
                );
                result.to_manual_match.local.extend(locals.iter().copied());
                result.to_manual_match.remote.extend(remotes.iter().copied());
            }
        }
    }
    result.to_manual_match.remote.extend(orphans);

    // Buckets were filled group by group; restore input order.
    result.to_create.sort_by_key(|LocalIdx(i)| *i);
    result.to_confirm.sort_by_key(|(LocalIdx(i), _)| *i);
    result.to_manual_match.local.sort_by_key(|LocalIdx(i)| *i);
    result.to_manual_match.remote.sort_by_key(|RemoteIdx(i)| *i);
    result.identifiers.sort_by_key(|(LocalIdx(i), _)| *i);

    result
}
