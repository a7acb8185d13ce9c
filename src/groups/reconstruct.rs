/// Change reconstruction: derives the `GroupChange` between two snapshots.
///
/// Used wherever the server gave us a snapshot but no change: the chain's diff
/// strategy, and the direct-to-latest path. The reconstructed change has no
/// editor, since who made it is unknowable from two states.
///
/// Reconstruction is set-based on member ids and preserves `to`'s ordering in
/// every derived list, so output is deterministic.

use std::collections::HashSet;

use crate::groups::change::{ApproveMember, GroupChange, ModifyMemberRole};
use crate::groups::group::GroupSnapshot;
use crate::groups::ids::ServiceId;

/// The change that takes `from` to `to`, stamped with `to.revision`.
pub fn reconstruct_change(from: &GroupSnapshot, to: &GroupSnapshot) -> GroupChange {
    let mut change = GroupChange::at_revision(to.revision);

    if from.title != to.title {
        change.new_title = Some(to.title.clone());
    }
    if from.description != to.description {
        change.new_description = Some(to.description.clone());
    }
    if from.avatar != to.avatar {
        change.new_avatar = Some(to.avatar.clone());
    }
    if from.disappearing_messages_timer != to.disappearing_messages_timer {
        change.new_timer = Some(to.disappearing_messages_timer);
    }
    if from.access_control.attributes != to.access_control.attributes {
        change.new_attribute_access = to.access_control.attributes;
    }
    if from.access_control.members != to.access_control.members {
        change.new_member_access = to.access_control.members;
    }
    if from.access_control.add_from_invite_link != to.access_control.add_from_invite_link {
        change.new_invite_link_access = to.access_control.add_from_invite_link;
    }
    if from.is_announcement_group != to.is_announcement_group {
        change.new_is_announcement_group = to.is_announcement_group;
    }
    if from.invite_link_password != to.invite_link_password {
        change.new_invite_link_password = to.invite_link_password.clone();
    }

    reconstruct_members(from, to, &mut change);
    reconstruct_bans(from, to, &mut change);

    change
}

fn reconstruct_members(from: &GroupSnapshot, to: &GroupSnapshot, change: &mut GroupChange) {
    let from_members: HashSet<ServiceId> = from.members.iter().map(|m| m.aci).collect();
    let to_members: HashSet<ServiceId> = to.members.iter().map(|m| m.aci).collect();
    let from_pending: HashSet<ServiceId> = from.pending_members.iter().map(|p| p.service_id).collect();
    let to_pending: HashSet<ServiceId> = to.pending_members.iter().map(|p| p.service_id).collect();
    let from_requesting: HashSet<ServiceId> = from.requesting_members.iter().map(|r| r.aci).collect();
    let to_requesting: HashSet<ServiceId> = to.requesting_members.iter().map(|r| r.aci).collect();

    for member in &to.members {
        if from_members.contains(&member.aci) {
            continue;
        }
        if from_pending.contains(&member.aci) {
            change.promote_pending_members.push(member.clone());
        } else if from_requesting.contains(&member.aci) {
            change.promote_requesting_members.push(ApproveMember {
                aci: member.aci,
                role: member.role,
            });
        } else {
            change.new_members.push(member.clone());
        }
    }

    change.delete_members = from
        .members
        .iter()
        .map(|m| m.aci)
        .filter(|aci| !to_members.contains(aci))
        .collect();

    for before in &from.members {
        let Some(after) = to.find_member(&before.aci) else {
            continue;
        };
        if before.role != after.role {
            change.modify_member_roles.push(ModifyMemberRole {
                aci: after.aci,
                role: after.role,
            });
        }
        if before.profile_key != after.profile_key {
            change.modified_profile_keys.push(after.clone());
        }
    }

    change.new_pending_members = to
        .pending_members
        .iter()
        .filter(|p| !from_pending.contains(&p.service_id))
        .cloned()
        .collect();
    change.delete_pending_members = from
        .pending_members
        .iter()
        .map(|p| p.service_id)
        .filter(|id| !to_pending.contains(id) && !to_members.contains(id))
        .collect();

    change.new_requesting_members = to
        .requesting_members
        .iter()
        .filter(|r| !from_requesting.contains(&r.aci))
        .cloned()
        .collect();
    change.delete_requesting_members = from
        .requesting_members
        .iter()
        .map(|r| r.aci)
        .filter(|aci| !to_requesting.contains(aci) && !to_members.contains(aci))
        .collect();
}

fn reconstruct_bans(from: &GroupSnapshot, to: &GroupSnapshot, change: &mut GroupChange) {
    change.new_banned_members = to
        .banned_members
        .iter()
        .filter(|b| !from.is_banned(&b.service_id))
        .cloned()
        .collect();
    change.delete_banned_members = from
        .banned_members
        .iter()
        .map(|b| b.service_id)
        .filter(|id| !to.is_banned(id))
        .collect();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
