/// Group state patcher: windowed reconciliation of cached state with server
/// history.
///
/// `reconcile` walks the remote history up to a revision bound through a
/// `StateChain`, seeding it from the cached snapshot. Placeholders are handled
/// specially: a join-link placeholder is not trusted for membership, so the
/// chain is anchored on the first server snapshot with only the placeholder's
/// title and avatar carried over.
///
/// `clean_duplicate_changes` then strips from each surfaced change whatever
/// the state before it already had, so the caller never shows an event twice.
///
/// `advance_group_state` runs both, which is what callers normally want.

use std::collections::BTreeMap;

use crate::groups::apply::apply_change_without_revision_check;
use crate::groups::chain::{ChainStrategy, StateChain};
use crate::groups::change::GroupChange;
use crate::groups::entry::{GroupStateDiff, LocalLogEntry, ReconcileResult, RemoteLogEntry};
use crate::groups::group::GroupSnapshot;
use crate::groups::ids::Revision;
use crate::groups::reconstruct::reconstruct_change;
use crate::groups::resolve::resolve_conflict;
use crate::groups::revision::{Provenance, RevisionWindow};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// A chain strategy that can also reduce a delta against a prior state.
pub trait ResolveConflict: ChainStrategy {
    fn resolve_conflict(&self, prior: &Self::State, delta: &Self::Delta) -> Self::Delta;
}

/// The group strategies: lenient apply, reconstruct as diff, and equality as
/// "same revision, same provenance, nothing to reconstruct".
#[derive(Clone, Copy, Debug, Default)]
pub struct GroupChangeStrategy;

impl ChainStrategy for GroupChangeStrategy {
    type State = GroupSnapshot;
    type Delta = GroupChange;

    fn apply(&self, state: &GroupSnapshot, delta: &GroupChange) -> Option<GroupSnapshot> {
        match apply_change_without_revision_check(state, delta) {
            Ok(next) => Some(next),
            Err(e) => {
                log::warn!("Unable to apply change at revision {}: {}", delta.revision, e);
                None
            }
        }
    }

    fn diff(&self, before: &GroupSnapshot, after: &GroupSnapshot) -> GroupChange {
        reconstruct_change(before, after)
    }

    fn same_state(&self, a: &GroupSnapshot, b: &GroupSnapshot) -> bool {
        a.revision == b.revision
            && a.provenance == b.provenance
            && reconstruct_change(a, b).is_empty()
    }
}

impl ResolveConflict for GroupChangeStrategy {
    fn resolve_conflict(&self, prior: &GroupSnapshot, delta: &GroupChange) -> GroupChange {
        resolve_conflict(prior, delta)
    }
}

// ---------------------------------------------------------------------------
// GroupStatePatcher
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default)]
pub struct GroupStatePatcher<S = GroupChangeStrategy> {
    strategy: S,
}

impl GroupStatePatcher {
    pub fn new() -> Self {
        GroupStatePatcher::default()
    }
}

impl<S> GroupStatePatcher<S>
where
    S: ResolveConflict<State = GroupSnapshot, Delta = GroupChange>,
{
    pub fn with_strategy(strategy: S) -> Self {
        GroupStatePatcher { strategy }
    }

    /// Reconcile and then clean against the cached snapshot.
    pub fn advance_group_state(&self, input: &GroupStateDiff, max_revision: Revision) -> ReconcileResult {
        let result = self.reconcile(input, max_revision);
        self.clean_duplicate_changes(result, input.local_snapshot.as_ref())
    }

    /// Walk `input.remote_history` up to `max_revision`.
    ///
    /// Entries above the bound are returned untouched in
    /// `remaining_remote_history`. Missing revisions inside the window are
    /// logged and skipped.
    pub fn reconcile(&self, input: &GroupStateDiff, max_revision: Revision) -> ReconcileResult {
        if input.remote_history.is_empty() {
            return ReconcileResult {
                surfaced: Vec::new(),
                new_state: input.local_snapshot.clone(),
                remaining_remote_history: Vec::new(),
            };
        }

        let mut apply_now: BTreeMap<Revision, &RemoteLogEntry> = BTreeMap::new();
        let mut apply_later: Vec<RemoteLogEntry> = Vec::new();
        for entry in &input.remote_history {
            if entry.revision() <= max_revision {
                apply_now.insert(entry.revision(), entry);
            } else {
                apply_later.push(entry.clone());
            }
        }
        apply_later.sort_by_key(RemoteLogEntry::revision);

        let local = input.local_snapshot.as_ref();
        let placeholder = local.filter(|s| s.provenance == Provenance::Placeholder);

        let mut chain = StateChain::new(&self.strategy);
        if let Some(local) = local.filter(|s| s.provenance != Provenance::Placeholder) {
            chain.push(Some(local.clone()), None);
        }

        let (Some(earliest), Some(latest)) = (input.earliest_revision(), input.latest_revision()) else {
            return Self::collect(chain, local.is_none(), apply_later);
        };
        let window = RevisionWindow::clamped(earliest, latest, max_revision);

        if !window.is_empty() {
            // Revisions before the first entry are only a gap relative to a
            // trusted local snapshot.
            let mut next_expected = match local {
                Some(local) if !local.is_placeholder() => local.revision.checked_add(1),
                _ => None,
            };

            for (&revision, entry) in apply_now.range(window.revisions()) {
                if let Some(expected) = next_expected {
                    if revision > expected {
                        log::warn!(
                            "Gap in remote history: revisions {}..={} missing",
                            expected,
                            revision - 1
                        );
                    }
                }
                next_expected = revision.checked_add(1);

                let anchored = chain.latest_state().is_some();
                if let (false, Some(snapshot), Some(placeholder)) =
                    (anchored, entry.snapshot(), placeholder)
                {
                    log::debug!("Seeding placeholder group from revision {}", revision);
                    let previous = GroupSnapshot {
                        title: placeholder.title.clone(),
                        avatar: placeholder.avatar.clone(),
                        ..snapshot.clone()
                    };
                    chain.push(Some(previous), None);
                }

                chain.push(entry.snapshot().cloned(), entry.change().cloned());
            }
        }

        Self::collect(chain, local.is_none(), apply_later)
    }

    fn collect(
        chain: StateChain<&S>,
        first_sync: bool,
        remaining_remote_history: Vec<RemoteLogEntry>,
    ) -> ReconcileResult {
        let new_state = chain.latest_state().cloned();
        let surfaced = chain
            .into_links()
            .into_iter()
            .enumerate()
            .filter(|(index, link)| (first_sync && *index == 0) || link.delta.is_some())
            .map(|(_, link)| LocalLogEntry::new(link.state, link.delta))
            .collect();

        ReconcileResult {
            surfaced,
            new_state,
            remaining_remote_history,
        }
    }

    /// Reduce every surfaced change against the state just before it.
    ///
    /// Without a prior state there is nothing to compare with and `result` is
    /// returned as is. Entries whose change becomes empty are kept: the
    /// revision still happened.
    pub fn clean_duplicate_changes(
        &self,
        result: ReconcileResult,
        prior: Option<&GroupSnapshot>,
    ) -> ReconcileResult {
        let Some(prior) = prior else {
            return result;
        };

        let mut previous = prior.clone();
        let surfaced = result
            .surfaced
            .into_iter()
            .map(|entry| {
                let change = entry
                    .change
                    .map(|change| self.strategy.resolve_conflict(&previous, &change));
                previous = entry.snapshot.clone();
                LocalLogEntry::new(entry.snapshot, change)
            })
            .collect();

        ReconcileResult {
            surfaced,
            ..result
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
