#![no_main]
use libfuzzer_sys::fuzz_target;
use arbitrary::Arbitrary;

use shield_group_state::groups::{
    GroupChange, GroupSnapshot, GroupStateDiff, GroupStatePatcher, Member, PendingMember,
    RemoteLogEntry, Revision, Role, ServiceId, LATEST,
};

/// Fuzz the reconciliation engine.
///
/// Tests:
/// - reconcile / advance_group_state never panic on gapped, partial or
///   contradictory history
/// - both are deterministic
/// - entries above the bound are handed back untouched
/// - surfaced entries never go backwards in revision

#[derive(Arbitrary, Debug)]
struct FuzzMember {
    /// Small id space so adds, removes and promotions collide
    id: u8,
    admin: bool,
}

#[derive(Arbitrary, Debug)]
struct FuzzEntry {
    /// Revision step from the previous entry (0 produces a duplicate)
    step: u8,
    snapshot: Option<Vec<FuzzMember>>,
    add: Vec<FuzzMember>,
    remove: Vec<u8>,
    invite: Vec<u8>,
    promote: Vec<u8>,
    title: Option<u8>,
    has_change: bool,
}

#[derive(Arbitrary, Debug)]
struct ReconcileInput {
    /// 0 = none, 1 = fresh, 2 = placeholder, 3 = restore placeholder
    local_kind: u8,
    local_revision: u16,
    local_members: Vec<FuzzMember>,
    entries: Vec<FuzzEntry>,
    max_revision: Option<u16>,
}

fn service_id(n: u8) -> ServiceId {
    ServiceId::from_bytes([n % 8; 16])
}

fn member(m: &FuzzMember) -> Member {
    let member = Member::new(service_id(m.id));
    if m.admin {
        member.with_role(Role::Administrator)
    } else {
        member
    }
}

fn snapshot(revision: Revision, members: &[FuzzMember], title: Option<u8>) -> GroupSnapshot {
    let mut group = GroupSnapshot::at_revision(revision);
    for m in members {
        if !group.is_member(&service_id(m.id)) {
            group.members.push(member(m));
        }
    }
    group.title = format!("{}", title.unwrap_or(0));
    group
}

fuzz_target!(|input: ReconcileInput| {
    // Limit history length to keep iterations fast
    if input.entries.len() > 64 {
        return;
    }

    let local = match input.local_kind % 4 {
        0 => None,
        1 => Some(snapshot(input.local_revision as Revision, &input.local_members, None)),
        2 => Some(GroupSnapshot {
            members: input.local_members.iter().map(member).collect(),
            ..GroupSnapshot::placeholder("Placeholder", "")
        }),
        _ => Some(GroupSnapshot::restore_placeholder()),
    };

    let mut history: Vec<RemoteLogEntry> = Vec::new();
    let mut revision: Revision = 0;
    for e in &input.entries {
        revision = revision.saturating_add(e.step as Revision);
        let snap = e.snapshot.as_ref().map(|members| snapshot(revision, members, e.title));
        let change = e.has_change.then(|| GroupChange {
            new_members: e.add.iter().map(member).collect(),
            delete_members: e.remove.iter().map(|n| service_id(*n)).collect(),
            new_pending_members: e.invite.iter().map(|n| PendingMember::new(service_id(*n))).collect(),
            promote_pending_members: e.promote.iter().map(|n| Member::new(service_id(*n))).collect(),
            new_title: e.title.map(|t| format!("{}", t)),
            ..GroupChange::at_revision(revision)
        });
        if let Ok(entry) = RemoteLogEntry::new(snap, change) {
            // Remote history must be strictly increasing
            if history.last().map_or(true, |last| last.revision() < entry.revision()) {
                history.push(entry);
            }
        }
    }

    let max_revision = input.max_revision.map_or(LATEST, |m| m as Revision);
    let diff = GroupStateDiff::new(local.clone(), history.clone());
    let patcher = GroupStatePatcher::new();

    let first = patcher.advance_group_state(&diff, max_revision);
    let second = patcher.advance_group_state(&diff, max_revision);
    assert_eq!(first, second);

    let expected_later: Vec<_> = history
        .iter()
        .filter(|e| e.revision() > max_revision)
        .cloned()
        .collect();
    assert_eq!(first.remaining_remote_history, expected_later);

    for pair in first.surfaced.windows(2) {
        assert!(pair[0].revision() <= pair[1].revision());
    }

    if history.is_empty() {
        assert_eq!(first.new_state, local);
    }
    // Any new state came from an entry inside the window
    if first.new_state != local {
        if let Some(state) = &first.new_state {
            assert!(state.revision <= max_revision);
        }
    }
});
