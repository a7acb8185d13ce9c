/// Log entries: the inputs and outputs of one reconciliation pass.
///
/// - `RemoteLogEntry`: what the server returned for one revision
/// - `LocalLogEntry`: a reconciled (snapshot, change) pair ready to surface
/// - `GroupStateDiff`: cached state plus a page of remote history
/// - `ReconcileResult`: surfaced entries, new state, history left for later

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::groups::change::GroupChange;
use crate::groups::group::GroupSnapshot;
use crate::groups::ids::Revision;
use crate::groups::reconstruct::reconstruct_change;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LogEntryError {
    #[error("Log entry has neither a snapshot nor a change")]
    Empty,
}

// ---------------------------------------------------------------------------
// RemoteLogEntry
// ---------------------------------------------------------------------------

/// One revision of server history. At least one half is always present.
///
/// A `Both` whose change revision disagrees with its snapshot is treated as
/// `SnapshotOnly`: `change()` hides the change, and decoding drops it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(from = "RemoteLogEntryRepr")]
pub enum RemoteLogEntry {
    SnapshotOnly(GroupSnapshot),
    ChangeOnly(GroupChange),
    Both {
        snapshot: GroupSnapshot,
        change: GroupChange,
    },
}

/// Wire shape of `RemoteLogEntry`, before revision checks.
#[derive(Deserialize)]
#[serde(rename = "RemoteLogEntry")]
enum RemoteLogEntryRepr {
    SnapshotOnly(GroupSnapshot),
    ChangeOnly(GroupChange),
    Both {
        snapshot: GroupSnapshot,
        change: GroupChange,
    },
}

impl From<RemoteLogEntryRepr> for RemoteLogEntry {
    fn from(repr: RemoteLogEntryRepr) -> Self {
        match repr {
            RemoteLogEntryRepr::SnapshotOnly(snapshot) => RemoteLogEntry::SnapshotOnly(snapshot),
            RemoteLogEntryRepr::ChangeOnly(change) => RemoteLogEntry::ChangeOnly(change),
            RemoteLogEntryRepr::Both { snapshot, change } => RemoteLogEntry::pair(snapshot, change),
        }
    }
}

impl RemoteLogEntry {
    /// Build from the two optional halves the server may send.
    ///
    /// A change whose revision disagrees with the snapshot is dropped and the
    /// snapshot alone is kept.
    pub fn new(
        snapshot: Option<GroupSnapshot>,
        change: Option<GroupChange>,
    ) -> Result<Self, LogEntryError> {
        match (snapshot, change) {
            (None, None) => Err(LogEntryError::Empty),
            (Some(snapshot), None) => Ok(RemoteLogEntry::SnapshotOnly(snapshot)),
            (None, Some(change)) => Ok(RemoteLogEntry::ChangeOnly(change)),
            (Some(snapshot), Some(change)) => Ok(RemoteLogEntry::pair(snapshot, change)),
        }
    }

    fn pair(snapshot: GroupSnapshot, change: GroupChange) -> Self {
        if snapshot.revision != change.revision {
            log::warn!(
                "Discarding change at revision {} paired with snapshot at revision {}",
                change.revision,
                snapshot.revision
            );
            return RemoteLogEntry::SnapshotOnly(snapshot);
        }
        RemoteLogEntry::Both { snapshot, change }
    }

    pub fn revision(&self) -> Revision {
        match self {
            RemoteLogEntry::SnapshotOnly(snapshot) => snapshot.revision,
            RemoteLogEntry::ChangeOnly(change) => change.revision,
            RemoteLogEntry::Both { snapshot, .. } => snapshot.revision,
        }
    }

    pub fn snapshot(&self) -> Option<&GroupSnapshot> {
        match self {
            RemoteLogEntry::SnapshotOnly(snapshot) | RemoteLogEntry::Both { snapshot, .. } => {
                Some(snapshot)
            }
            RemoteLogEntry::ChangeOnly(_) => None,
        }
    }

    /// The change half, if present and at the snapshot's revision.
    pub fn change(&self) -> Option<&GroupChange> {
        match self {
            RemoteLogEntry::ChangeOnly(change) => Some(change),
            RemoteLogEntry::Both { snapshot, change } if snapshot.revision == change.revision => {
                Some(change)
            }
            RemoteLogEntry::Both { .. } | RemoteLogEntry::SnapshotOnly(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// LocalLogEntry
// ---------------------------------------------------------------------------

/// A reconciled history entry: the state at a revision and, when it is a
/// timeline event, the change that produced it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LocalLogEntry {
    pub snapshot: GroupSnapshot,
    pub change: Option<GroupChange>,
}

impl LocalLogEntry {
    pub fn new(snapshot: GroupSnapshot, change: Option<GroupChange>) -> Self {
        debug_assert!(
            change.as_ref().map_or(true, |c| c.revision == snapshot.revision),
            "change revision does not match snapshot revision"
        );
        LocalLogEntry { snapshot, change }
    }

    pub fn revision(&self) -> Revision {
        self.snapshot.revision
    }
}

// ---------------------------------------------------------------------------
// GroupStateDiff
// ---------------------------------------------------------------------------

/// Where the next page of server history starts.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PagingCursor {
    pub has_more_pages: bool,
    pub next_page_revision: Revision,
}

/// Reconciliation input: the cached state and what the server returned since.
///
/// `remote_history` must be sorted by revision with no duplicates.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupStateDiff {
    pub local_snapshot: Option<GroupSnapshot>,
    pub remote_history: Vec<RemoteLogEntry>,
    pub paging: Option<PagingCursor>,
}

impl GroupStateDiff {
    pub fn new(local_snapshot: Option<GroupSnapshot>, remote_history: Vec<RemoteLogEntry>) -> Self {
        GroupStateDiff {
            local_snapshot,
            remote_history,
            paging: None,
        }
    }

    pub fn with_paging(mut self, paging: PagingCursor) -> Self {
        self.paging = Some(paging);
        self
    }

    /// Jump straight to the server's current state, skipping the change log.
    ///
    /// When there is a local state the change is reconstructed from it, so the
    /// jump still surfaces as a single event.
    pub fn direct_to_latest(local_snapshot: Option<GroupSnapshot>, latest: GroupSnapshot) -> Self {
        let entry = match &local_snapshot {
            Some(local) => RemoteLogEntry::Both {
                change: reconstruct_change(local, &latest),
                snapshot: latest,
            },
            None => RemoteLogEntry::SnapshotOnly(latest),
        };
        GroupStateDiff::new(local_snapshot, vec![entry])
    }

    /// First revision a pass over this input has to visit.
    ///
    /// Placeholders count as revision 0: their own revision is not a server
    /// revision.
    pub fn earliest_revision(&self) -> Option<Revision> {
        match &self.local_snapshot {
            Some(local) if local.is_placeholder() => Some(0),
            Some(local) => Some(local.revision),
            None => self.remote_history.first().map(RemoteLogEntry::revision),
        }
    }

    /// Last revision known from either side.
    pub fn latest_revision(&self) -> Option<Revision> {
        let remote = self.remote_history.iter().map(RemoteLogEntry::revision).max();
        let local = self
            .local_snapshot
            .as_ref()
            .filter(|s| !s.is_placeholder())
            .map(|s| s.revision);
        remote.max(local)
    }
}

// ---------------------------------------------------------------------------
// ReconcileResult
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileResult {
    /// Entries to show, in revision order.
    pub surfaced: Vec<LocalLogEntry>,
    /// Reconciled state, `None` only if nothing was ever known.
    pub new_state: Option<GroupSnapshot>,
    /// Entries above the revision bound, for a later pass.
    pub remaining_remote_history: Vec<RemoteLogEntry>,
}

impl ReconcileResult {
    /// Input for the follow-up pass over `remaining_remote_history`.
    pub fn into_next_input(self) -> GroupStateDiff {
        GroupStateDiff::new(self.new_state, self.remaining_remote_history)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::groups::group::Member;
    use crate::groups::ids::ServiceId;

    fn id(n: u8) -> ServiceId {
        ServiceId::from_bytes([n; 16])
    }

    #[test]
    fn test_remote_entry_requires_one_half() {
        assert_eq!(RemoteLogEntry::new(None, None), Err(LogEntryError::Empty));
    }

    #[test]
    fn test_remote_entry_variants() {
        let snapshot = GroupSnapshot::at_revision(4);
        let change = GroupChange::at_revision(4);

        let both = RemoteLogEntry::new(Some(snapshot.clone()), Some(change.clone())).unwrap();
        assert_eq!(both.revision(), 4);
        assert_eq!(both.snapshot(), Some(&snapshot));
        assert_eq!(both.change(), Some(&change));

        let change_only = RemoteLogEntry::new(None, Some(GroupChange::at_revision(7))).unwrap();
        assert_eq!(change_only.revision(), 7);
        assert!(change_only.snapshot().is_none());
    }

    #[test]
    fn test_remote_entry_mismatched_revision_drops_change() {
        let entry = RemoteLogEntry::new(
            Some(GroupSnapshot::at_revision(4)),
            Some(GroupChange::at_revision(5)),
        )
        .unwrap();
        assert_eq!(entry, RemoteLogEntry::SnapshotOnly(GroupSnapshot::at_revision(4)));
    }

    #[test]
    fn test_mismatched_both_hides_change() {
        let entry = RemoteLogEntry::Both {
            snapshot: GroupSnapshot::at_revision(3),
            change: GroupChange::at_revision(4),
        };
        assert_eq!(entry.revision(), 3);
        assert_eq!(entry.snapshot(), Some(&GroupSnapshot::at_revision(3)));
        assert!(entry.change().is_none());
    }

    #[test]
    #[should_panic(expected = "change revision does not match")]
    #[cfg(debug_assertions)]
    fn test_local_entry_rejects_mismatch_in_debug() {
        LocalLogEntry::new(GroupSnapshot::at_revision(1), Some(GroupChange::at_revision(2)));
    }

    #[test]
    fn test_revision_bounds() {
        let history = vec![
            RemoteLogEntry::SnapshotOnly(GroupSnapshot::at_revision(3)),
            RemoteLogEntry::ChangeOnly(GroupChange::at_revision(4)),
        ];

        let fresh = GroupStateDiff::new(Some(GroupSnapshot::at_revision(2)), history.clone());
        assert_eq!(fresh.earliest_revision(), Some(2));
        assert_eq!(fresh.latest_revision(), Some(4));

        let unknown = GroupStateDiff::new(None, history.clone());
        assert_eq!(unknown.earliest_revision(), Some(3));

        let placeholder = GroupStateDiff::new(
            Some(GroupSnapshot {
                revision: 9,
                ..GroupSnapshot::placeholder("Title", "")
            }),
            history,
        );
        assert_eq!(placeholder.earliest_revision(), Some(0));
        assert_eq!(placeholder.latest_revision(), Some(4));

        let empty = GroupStateDiff::default();
        assert_eq!(empty.earliest_revision(), None);
        assert_eq!(empty.latest_revision(), None);
    }

    #[test]
    fn test_direct_to_latest_reconstructs_change() {
        let local = GroupSnapshot {
            members: vec![Member::new(id(1))],
            ..GroupSnapshot::at_revision(5)
        };
        let latest = GroupSnapshot {
            members: vec![Member::new(id(1)), Member::new(id(2))],
            ..GroupSnapshot::at_revision(9)
        };

        let diff = GroupStateDiff::direct_to_latest(Some(local), latest.clone());
        assert_eq!(diff.remote_history.len(), 1);
        let change = diff.remote_history[0].change().unwrap();
        assert_eq!(change.revision, 9);
        assert_eq!(change.new_members, vec![Member::new(id(2))]);

        let first_sync = GroupStateDiff::direct_to_latest(None, latest.clone());
        assert_eq!(first_sync.remote_history, vec![RemoteLogEntry::SnapshotOnly(latest)]);
    }

    #[test]
    fn test_paging_cursor() {
        let diff = GroupStateDiff::default().with_paging(PagingCursor {
            has_more_pages: true,
            next_page_revision: 12,
        });
        assert!(diff.paging.unwrap().has_more_pages);
    }
}
