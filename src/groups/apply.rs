/// Change application: produces the snapshot a `GroupChange` leads to.
///
/// `apply_change` is the strict entry point used when a change arrives in
/// order. `apply_change_without_revision_check` backs the reconciliation chain,
/// which deliberately applies changes across gaps and onto placeholders.
///
/// Application never edits its input: the group is cloned and the clone is
/// returned. Structural impossibilities (modifying an unknown member, promoting
/// someone who was never invited) are errors; redundant edits such as deleting
/// an absent member are logged and skipped.

use thiserror::Error;

use crate::groups::change::GroupChange;
use crate::groups::group::{
    AccessRequired, BannedMember, EnabledState, GroupSnapshot, Member, PendingMember,
    RequestingMember, Role,
};
use crate::groups::ids::{Revision, ServiceId};
use crate::groups::revision::Provenance;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ApplyError {
    #[error("Change revision {actual} does not follow group revision (expected {expected})")]
    RevisionMismatch { expected: Revision, actual: Revision },

    #[error("Unknown member: {0}")]
    UnknownMember(ServiceId),

    #[error("Invalid role: {0:?}")]
    InvalidRole(Role),

    #[error("Already a full member: {0}")]
    AlreadyMember(ServiceId),

    #[error("Not a pending member: {0}")]
    NotPending(ServiceId),
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Apply `change` to `group`, requiring `change.revision == group.revision + 1`.
pub fn apply_change(group: &GroupSnapshot, change: &GroupChange) -> Result<GroupSnapshot, ApplyError> {
    let expected = group.revision.checked_add(1);
    if expected != Some(change.revision) {
        return Err(ApplyError::RevisionMismatch {
            expected: expected.unwrap_or(Revision::MAX),
            actual: change.revision,
        });
    }
    apply_change_without_revision_check(group, change)
}

/// Apply `change` to `group` regardless of their revisions.
///
/// The result carries `change.revision` and is `Fresh`: once a real change has
/// been applied the revision is a server revision, even if the base was a
/// placeholder.
pub fn apply_change_without_revision_check(
    group: &GroupSnapshot,
    change: &GroupChange,
) -> Result<GroupSnapshot, ApplyError> {
    let mut next = group.clone();
    next.revision = change.revision;
    next.provenance = Provenance::Fresh;

    apply_add_members(&mut next, &change.new_members);
    apply_delete_members(&mut next, &change.delete_members);
    apply_modify_roles(&mut next, change)?;
    apply_modify_profile_keys(&mut next, &change.modified_profile_keys)?;
    apply_add_pending(&mut next, &change.new_pending_members)?;
    apply_delete_pending(&mut next, &change.delete_pending_members);
    apply_promote_pending(&mut next, &change.promote_pending_members)?;

    if let Some(title) = &change.new_title {
        next.title = title.clone();
    }
    if let Some(description) = &change.new_description {
        next.description = description.clone();
    }
    if let Some(avatar) = &change.new_avatar {
        next.avatar = avatar.clone();
    }
    if let Some(timer) = change.new_timer {
        next.disappearing_messages_timer = timer;
    }
    if change.new_attribute_access != AccessRequired::Unknown {
        next.access_control.attributes = change.new_attribute_access;
    }
    if change.new_member_access != AccessRequired::Unknown {
        next.access_control.members = change.new_member_access;
    }
    if change.new_invite_link_access != AccessRequired::Unknown {
        next.access_control.add_from_invite_link = change.new_invite_link_access;
    }

    apply_add_requesting(&mut next, &change.new_requesting_members);
    apply_delete_requesting(&mut next, &change.delete_requesting_members);
    apply_promote_requesting(&mut next, change);

    if !change.new_invite_link_password.is_empty() {
        next.invite_link_password = change.new_invite_link_password.clone();
    }
    if change.new_is_announcement_group != EnabledState::Unknown {
        next.is_announcement_group = change.new_is_announcement_group;
    }

    apply_add_banned(&mut next, &change.new_banned_members);
    apply_delete_banned(&mut next, &change.delete_banned_members);

    Ok(next)
}

/// Drop `aci` from the full member list and stamp `revision`.
///
/// Used when the local user leaves a group whose later state can no longer be
/// fetched, so the local copy must be edited directly.
pub fn remove_member(group: &GroupSnapshot, aci: &ServiceId, revision: Revision) -> GroupSnapshot {
    let mut next = group.clone();
    next.members.retain(|m| &m.aci != aci);
    next.revision = revision;
    next
}

// ---------------------------------------------------------------------------
// Full members
// ---------------------------------------------------------------------------

fn apply_add_members(group: &mut GroupSnapshot, new_members: &[Member]) {
    if new_members.is_empty() {
        return;
    }
    for member in new_members {
        match group.members.iter_mut().find(|m| m.aci == member.aci) {
            Some(existing) => *existing = member.clone(),
            None => group.members.push(member.clone()),
        }
    }
    remove_pending_and_requesting_now_in_group(group);
}

fn apply_delete_members(group: &mut GroupSnapshot, delete_members: &[ServiceId]) {
    for aci in delete_members {
        match group.members.iter().position(|m| &m.aci == aci) {
            Some(index) => {
                group.members.remove(index);
            }
            None => log::warn!("Deleted member {} was not in the group", aci),
        }
    }
}

fn apply_modify_roles(group: &mut GroupSnapshot, change: &GroupChange) -> Result<(), ApplyError> {
    for modify in &change.modify_member_roles {
        if !modify.role.is_known() {
            return Err(ApplyError::InvalidRole(modify.role));
        }
        let member = find_member_mut(group, &modify.aci)?;
        member.role = modify.role;
    }
    Ok(())
}

fn apply_modify_profile_keys(group: &mut GroupSnapshot, modified: &[Member]) -> Result<(), ApplyError> {
    for update in modified {
        let member = find_member_mut(group, &update.aci)?;
        member.profile_key = update.profile_key.clone();
    }
    Ok(())
}

fn find_member_mut<'a>(group: &'a mut GroupSnapshot, aci: &ServiceId) -> Result<&'a mut Member, ApplyError> {
    group
        .members
        .iter_mut()
        .find(|m| &m.aci == aci)
        .ok_or(ApplyError::UnknownMember(*aci))
}

// ---------------------------------------------------------------------------
// Pending members
// ---------------------------------------------------------------------------

fn apply_add_pending(group: &mut GroupSnapshot, new_pending: &[PendingMember]) -> Result<(), ApplyError> {
    for pending in new_pending {
        if group.is_member(&pending.service_id) {
            return Err(ApplyError::AlreadyMember(pending.service_id));
        }
        if group.find_pending(&pending.service_id).is_none() {
            group.pending_members.push(pending.clone());
        }
    }
    Ok(())
}

fn apply_delete_pending(group: &mut GroupSnapshot, delete_pending: &[ServiceId]) {
    for id in delete_pending {
        match group.pending_members.iter().position(|p| &p.service_id == id) {
            Some(index) => {
                group.pending_members.remove(index);
            }
            None => log::warn!("Deleted pending member {} was not pending", id),
        }
    }
}

fn apply_promote_pending(group: &mut GroupSnapshot, promoted: &[Member]) -> Result<(), ApplyError> {
    for member in promoted {
        let index = group
            .pending_members
            .iter()
            .position(|p| p.service_id == member.aci)
            .ok_or(ApplyError::NotPending(member.aci))?;
        group.pending_members.remove(index);
        group.members.push(member.clone());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Requesting members
// ---------------------------------------------------------------------------

fn apply_add_requesting(group: &mut GroupSnapshot, new_requesting: &[RequestingMember]) {
    group.requesting_members.extend(new_requesting.iter().cloned());
}

fn apply_delete_requesting(group: &mut GroupSnapshot, delete_requesting: &[ServiceId]) {
    for aci in delete_requesting {
        match group.requesting_members.iter().position(|r| &r.aci == aci) {
            Some(index) => {
                group.requesting_members.remove(index);
            }
            None => log::warn!("Deleted requesting member {} was not requesting", aci),
        }
    }
}

fn apply_promote_requesting(group: &mut GroupSnapshot, change: &GroupChange) {
    for approval in &change.promote_requesting_members {
        let Some(index) = group.requesting_members.iter().position(|r| r.aci == approval.aci) else {
            log::warn!("Approved member {} was not requesting", approval.aci);
            continue;
        };
        let requesting = group.requesting_members.remove(index);
        group.members.push(Member {
            aci: requesting.aci,
            role: approval.role,
            profile_key: requesting.profile_key,
            joined_at_revision: change.revision,
        });
    }
}

fn remove_pending_and_requesting_now_in_group(group: &mut GroupSnapshot) {
    let members = &group.members;
    group
        .pending_members
        .retain(|p| !members.iter().any(|m| m.aci == p.service_id));
    group
        .requesting_members
        .retain(|r| !members.iter().any(|m| m.aci == r.aci));
}

// ---------------------------------------------------------------------------
// Banned members
// ---------------------------------------------------------------------------

fn apply_add_banned(group: &mut GroupSnapshot, new_banned: &[BannedMember]) {
    for banned in new_banned {
        if group.is_banned(&banned.service_id) {
            log::warn!("Banned member {} was already banned", banned.service_id);
            continue;
        }
        group.banned_members.push(banned.clone());
    }
}

fn apply_delete_banned(group: &mut GroupSnapshot, delete_banned: &[ServiceId]) {
    for id in delete_banned {
        match group.banned_members.iter().position(|b| &b.service_id == id) {
            Some(index) => {
                group.banned_members.remove(index);
            }
            None => log::warn!("Unbanned member {} was not banned", id),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
