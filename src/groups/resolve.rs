/// Conflict resolution: strips the parts of a change a group already reflects.
///
/// Given the state a change is about to be shown against, every field-level
/// action that would be a no-op there is removed. Two actions are rewritten
/// rather than dropped, because the target is invited rather than absent:
///
/// - adding a member who is pending becomes promoting that pending member;
/// - a join request from someone who is pending becomes a promotion too.
///
/// Revision and editor are carried over untouched.

use crate::groups::change::GroupChange;
use crate::groups::group::{AccessRequired, EnabledState, GroupSnapshot, Member};

/// Return `change` minus everything `group` already has.
pub fn resolve_conflict(group: &GroupSnapshot, change: &GroupChange) -> GroupChange {
    let mut resolved = GroupChange {
        revision: change.revision,
        editor: change.editor,
        ..Default::default()
    };

    // Membership.
    for member in &change.new_members {
        if group.is_member(&member.aci) {
            continue;
        }
        if group.find_pending(&member.aci).is_some() {
            resolved.promote_pending_members.push(member.clone());
        } else {
            resolved.new_members.push(member.clone());
        }
    }
    resolved.delete_members = change
        .delete_members
        .iter()
        .filter(|aci| group.is_member(aci))
        .copied()
        .collect();
    resolved.modify_member_roles = change
        .modify_member_roles
        .iter()
        .filter(|m| group.find_member(&m.aci).is_some_and(|current| current.role != m.role))
        .cloned()
        .collect();
    resolved.modified_profile_keys = change
        .modified_profile_keys
        .iter()
        .filter(|m| {
            group
                .find_member(&m.aci)
                .is_some_and(|current| current.profile_key != m.profile_key)
        })
        .cloned()
        .collect();

    // Pending.
    resolved.new_pending_members = change
        .new_pending_members
        .iter()
        .filter(|p| !group.is_member(&p.service_id) && group.find_pending(&p.service_id).is_none())
        .cloned()
        .collect();
    resolved.delete_pending_members = change
        .delete_pending_members
        .iter()
        .filter(|id| group.find_pending(id).is_some())
        .copied()
        .collect();
    resolved.promote_pending_members.extend(
        change
            .promote_pending_members
            .iter()
            .filter(|m| group.find_pending(&m.aci).is_some())
            .cloned(),
    );

    // Attributes.
    resolved.new_title = change.new_title.clone().filter(|t| t != &group.title);
    resolved.new_avatar = change.new_avatar.clone().filter(|a| a != &group.avatar);
    resolved.new_timer = change
        .new_timer
        .filter(|t| *t != group.disappearing_messages_timer);
    resolved.new_attribute_access =
        resolve_access(change.new_attribute_access, group.access_control.attributes);
    resolved.new_member_access =
        resolve_access(change.new_member_access, group.access_control.members);
    resolved.new_invite_link_access = resolve_access(
        change.new_invite_link_access,
        group.access_control.add_from_invite_link,
    );
    resolved.new_description = change
        .new_description
        .clone()
        .filter(|d| d != &group.description);
    resolved.new_is_announcement_group =
        if change.new_is_announcement_group == group.is_announcement_group {
            EnabledState::Unknown
        } else {
            change.new_is_announcement_group
        };
    // Password changes are always kept.
    resolved.new_invite_link_password = change.new_invite_link_password.clone();

    // Requesting.
    for requesting in &change.new_requesting_members {
        if group.is_member(&requesting.aci) {
            continue;
        }
        if let Some(pending) = group.find_pending(&requesting.aci) {
            resolved.promote_pending_members.push(Member {
                aci: pending.service_id,
                profile_key: requesting.profile_key.clone(),
                ..Member::new(pending.service_id)
            });
        } else {
            resolved.new_requesting_members.push(requesting.clone());
        }
    }
    resolved.delete_requesting_members = change
        .delete_requesting_members
        .iter()
        .filter(|aci| group.find_requesting(aci).is_some())
        .copied()
        .collect();
    resolved.promote_requesting_members = change
        .promote_requesting_members
        .iter()
        .filter(|a| group.find_requesting(&a.aci).is_some())
        .cloned()
        .collect();

    // Bans.
    resolved.new_banned_members = change
        .new_banned_members
        .iter()
        .filter(|b| !group.is_banned(&b.service_id))
        .cloned()
        .collect();
    resolved.delete_banned_members = change
        .delete_banned_members
        .iter()
        .filter(|id| group.is_banned(id))
        .copied()
        .collect();

    resolved
}

fn resolve_access(requested: AccessRequired, current: AccessRequired) -> AccessRequired {
    if requested == current {
        AccessRequired::Unknown
    } else {
        requested
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
