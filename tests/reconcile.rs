//! End-to-end reconciliation through the public API.

use shield_group_state::groups::{
    apply_change_without_revision_check, reconstruct_change, GroupChange, GroupSnapshot,
    GroupStateDiff, GroupStatePatcher, LocalLogEntry, Member, PendingMember, RemoteLogEntry,
    Revision, Role, ServiceId, LATEST,
};

fn id(n: u8) -> ServiceId {
    ServiceId::from_bytes([n; 16])
}

fn state(revision: Revision, member_ids: &[u8]) -> GroupSnapshot {
    GroupSnapshot {
        title: format!("Revision {}", revision),
        members: member_ids.iter().map(|n| Member::new(id(*n))).collect(),
        ..GroupSnapshot::at_revision(revision)
    }
}

fn entry(snapshot: GroupSnapshot, change: GroupChange) -> RemoteLogEntry {
    RemoteLogEntry::new(Some(snapshot), Some(change)).unwrap()
}

fn titled(revision: Revision) -> GroupChange {
    GroupChange {
        editor: Some(id(1)),
        new_title: Some(format!("Revision {}", revision)),
        ..GroupChange::at_revision(revision)
    }
}

#[test]
fn test_empty_history_is_a_no_op() {
    let patcher = GroupStatePatcher::new();
    for local in [None, Some(state(3, &[1]))] {
        let result = patcher.reconcile(&GroupStateDiff::new(local.clone(), vec![]), 7);
        assert!(result.surfaced.is_empty());
        assert!(result.remaining_remote_history.is_empty());
        assert_eq!(result.new_state, local);
    }
}

#[test]
fn test_gap_is_skipped_without_error() {
    let history = vec![
        entry(state(1, &[1]), titled(1)),
        entry(state(3, &[1]), titled(3)),
    ];
    let result = GroupStatePatcher::new()
        .advance_group_state(&GroupStateDiff::new(Some(state(0, &[1])), history), 3);

    let revisions: Vec<_> = result.surfaced.iter().map(LocalLogEntry::revision).collect();
    assert_eq!(revisions, vec![1, 3]);
    assert_eq!(result.new_state, Some(state(3, &[1])));
}

#[test]
fn test_windowed_then_latest_matches_single_pass() {
    let local = state(0, &[1]);
    let history: Vec<_> = (1..=3).map(|r| entry(state(r, &[1]), titled(r))).collect();
    let patcher = GroupStatePatcher::new();

    let first = patcher.advance_group_state(&GroupStateDiff::new(Some(local.clone()), history.clone()), 2);
    assert_eq!(first.surfaced.len(), 2);
    assert_eq!(first.remaining_remote_history, vec![history[2].clone()]);

    let follow_up_input = first.clone().into_next_input();
    let second = patcher.advance_group_state(&follow_up_input, LATEST);
    assert_eq!(second.surfaced.len(), 1);
    assert_eq!(second.surfaced[0].revision(), 3);

    let single = patcher.advance_group_state(&GroupStateDiff::new(Some(local), history), LATEST);
    assert_eq!(second.new_state, single.new_state);
    let mut combined = first.surfaced;
    combined.extend(second.surfaced);
    assert_eq!(combined, single.surfaced);
}

#[test]
fn test_new_state_reaches_highest_contiguous_revision_under_bound() {
    let history: Vec<_> = (1..=5).map(|r| entry(state(r, &[1]), titled(r))).collect();
    let result = GroupStatePatcher::new()
        .advance_group_state(&GroupStateDiff::new(Some(state(0, &[1])), history), 4);
    assert_eq!(result.new_state.unwrap().revision, 4);
    assert_eq!(result.remaining_remote_history.len(), 1);
}

#[test]
fn test_duplicate_member_addition_is_cleaned() {
    // Prior state already has member 2; the server's change claims to add it
    // alongside a genuine title change.
    let prior = state(4, &[1, 2]);
    let change = GroupChange {
        editor: Some(id(1)),
        new_members: vec![Member::new(id(2))],
        new_title: Some("Renamed".into()),
        ..GroupChange::at_revision(5)
    };
    let after = GroupSnapshot {
        title: "Renamed".into(),
        ..state(5, &[1, 2])
    };

    let result = GroupStatePatcher::new()
        .advance_group_state(&GroupStateDiff::new(Some(prior), vec![entry(after.clone(), change)]), LATEST);

    assert_eq!(result.surfaced.len(), 1);
    let cleaned = result.surfaced[0].change.as_ref().unwrap();
    assert!(cleaned.new_members.is_empty());
    assert_eq!(cleaned.new_title.as_deref(), Some("Renamed"));
    assert_eq!(cleaned.editor(), Some(id(1)));
    assert_eq!(result.new_state, Some(after));
}

#[test]
fn test_diff_then_apply_round_trips() {
    let from = GroupSnapshot {
        pending_members: vec![PendingMember::new(id(3))],
        ..state(10, &[1, 2])
    };
    let mut to = state(11, &[1]);
    to.members[0].role = Role::Administrator;
    to.members.push(Member::new(id(3)).with_profile_key(vec![3; 32]));
    to.description = "Weekend trips".into();

    let change = reconstruct_change(&from, &to);
    let applied = apply_change_without_revision_check(&from, &change).unwrap();
    assert_eq!(applied, to);
}

#[test]
fn test_direct_to_latest_surfaces_single_reconstructed_event() {
    let local = state(2, &[1]);
    let latest = state(9, &[1, 4]);
    let result = GroupStatePatcher::new()
        .advance_group_state(&GroupStateDiff::direct_to_latest(Some(local), latest.clone()), LATEST);

    assert_eq!(result.surfaced.len(), 1);
    let change = result.surfaced[0].change.as_ref().unwrap();
    assert_eq!(change.new_members, vec![Member::new(id(4))]);
    assert_eq!(change.editor(), None);
    assert_eq!(result.new_state, Some(latest));
}

#[test]
fn test_state_hash_detects_no_change() {
    let local = state(6, &[1]);
    let result = GroupStatePatcher::new().advance_group_state(
        &GroupStateDiff::new(Some(local.clone()), vec![RemoteLogEntry::SnapshotOnly(local.clone())]),
        LATEST,
    );
    assert_eq!(result.new_state.unwrap().state_hash(), local.state_hash());
}
