/// Group change: the delta that takes a group from `revision - 1` to `revision`.
///
/// A change is a bag of independent field-level actions. "Unset" is expressed
/// with `None`, an empty list, `AccessRequired::Unknown`,
/// `EnabledState::Unknown` or an empty password, so a `Default` change is
/// a no-op.

use serde::{Deserialize, Serialize};

use crate::groups::group::{
    AccessRequired, BannedMember, EnabledState, Member, PendingMember, RequestingMember, Role,
};
use crate::groups::ids::{Revision, ServiceId};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModifyMemberRole {
    pub aci: ServiceId,
    pub role: Role,
}

/// Approval of a requesting member, with the role they are admitted at.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ApproveMember {
    pub aci: ServiceId,
    pub role: Role,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupChange {
    pub revision: Revision,
    /// Member that authored the change. Absent for reconstructed changes.
    pub editor: Option<ServiceId>,
    pub new_members: Vec<Member>,
    pub delete_members: Vec<ServiceId>,
    pub modify_member_roles: Vec<ModifyMemberRole>,
    pub modified_profile_keys: Vec<Member>,
    pub new_pending_members: Vec<PendingMember>,
    pub delete_pending_members: Vec<ServiceId>,
    pub promote_pending_members: Vec<Member>,
    pub new_title: Option<String>,
    pub new_avatar: Option<String>,
    pub new_timer: Option<u32>,
    pub new_attribute_access: AccessRequired,
    pub new_member_access: AccessRequired,
    pub new_invite_link_access: AccessRequired,
    pub new_requesting_members: Vec<RequestingMember>,
    pub delete_requesting_members: Vec<ServiceId>,
    pub promote_requesting_members: Vec<ApproveMember>,
    pub new_invite_link_password: Vec<u8>,
    pub new_description: Option<String>,
    pub new_is_announcement_group: EnabledState,
    pub new_banned_members: Vec<BannedMember>,
    pub delete_banned_members: Vec<ServiceId>,
}

impl GroupChange {
    /// An empty change at `revision`.
    pub fn at_revision(revision: Revision) -> Self {
        GroupChange {
            revision,
            ..Default::default()
        }
    }

    /// The member that made the change, if known.
    pub fn editor(&self) -> Option<ServiceId> {
        self.editor
    }

    /// No field-level action at all.
    pub fn is_empty(&self) -> bool {
        self.modified_profile_keys.is_empty() && self.is_empty_except_profile_keys()
    }

    /// Only profile-key updates, which members publish silently.
    pub fn is_empty_except_profile_keys(&self) -> bool {
        self.new_banned_members.is_empty()
            && self.delete_banned_members.is_empty()
            && self.is_empty_except_bans_and_profile_keys_inner()
    }

    /// At least one ban edit, and otherwise only profile-key updates.
    pub fn is_empty_except_bans_and_profile_keys(&self) -> bool {
        (!self.new_banned_members.is_empty() || !self.delete_banned_members.is_empty())
            && self.is_empty_except_bans_and_profile_keys_inner()
    }

    /// Changes that should not produce a visible timeline event.
    pub fn is_silent(&self) -> bool {
        self.is_empty_except_profile_keys() || self.is_empty_except_bans_and_profile_keys()
    }

    fn is_empty_except_bans_and_profile_keys_inner(&self) -> bool {
        self.new_members.is_empty()
            && self.delete_members.is_empty()
            && self.modify_member_roles.is_empty()
            && self.new_pending_members.is_empty()
            && self.delete_pending_members.is_empty()
            && self.promote_pending_members.is_empty()
            && self.new_title.is_none()
            && self.new_avatar.is_none()
            && self.new_timer.is_none()
            && self.new_attribute_access == AccessRequired::Unknown
            && self.new_member_access == AccessRequired::Unknown
            && self.new_invite_link_access == AccessRequired::Unknown
            && self.new_requesting_members.is_empty()
            && self.delete_requesting_members.is_empty()
            && self.promote_requesting_members.is_empty()
            && self.new_invite_link_password.is_empty()
            && self.new_description.is_none()
            && self.new_is_announcement_group == EnabledState::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u8) -> ServiceId {
        ServiceId::from_bytes([n; 16])
    }

    #[test]
    fn test_default_change_is_empty() {
        let change = GroupChange::at_revision(4);
        assert!(change.is_empty());
        assert!(change.is_silent());
        assert!(!change.is_empty_except_bans_and_profile_keys());
    }

    #[test]
    fn test_editor_and_revision_do_not_count_as_content() {
        let change = GroupChange {
            editor: Some(id(1)),
            ..GroupChange::at_revision(9)
        };
        assert!(change.is_empty());
        assert_eq!(change.editor(), Some(id(1)));
    }

    #[test]
    fn test_profile_key_only_change_is_silent_but_not_empty() {
        let change = GroupChange {
            modified_profile_keys: vec![Member::new(id(1)).with_profile_key(vec![1, 2])],
            ..GroupChange::at_revision(2)
        };
        assert!(!change.is_empty());
        assert!(change.is_empty_except_profile_keys());
        assert!(change.is_silent());
    }

    #[test]
    fn test_ban_only_change_is_silent() {
        let change = GroupChange {
            new_banned_members: vec![BannedMember::new(id(2))],
            ..GroupChange::at_revision(2)
        };
        assert!(!change.is_empty_except_profile_keys());
        assert!(change.is_empty_except_bans_and_profile_keys());
        assert!(change.is_silent());
    }

    #[test]
    fn test_title_change_is_not_silent() {
        let change = GroupChange {
            new_title: Some("New title".into()),
            new_banned_members: vec![BannedMember::new(id(2))],
            ..GroupChange::at_revision(2)
        };
        assert!(!change.is_empty());
        assert!(!change.is_silent());
    }

    #[test]
    fn test_each_access_field_counts() {
        for change in [
            GroupChange {
                new_attribute_access: AccessRequired::Administrator,
                ..Default::default()
            },
            GroupChange {
                new_member_access: AccessRequired::Member,
                ..Default::default()
            },
            GroupChange {
                new_invite_link_access: AccessRequired::Any,
                ..Default::default()
            },
            GroupChange {
                new_is_announcement_group: EnabledState::Enabled,
                ..Default::default()
            },
            GroupChange {
                new_invite_link_password: vec![9; 16],
                ..Default::default()
            },
        ] {
            assert!(!change.is_empty(), "{:?}", change);
        }
    }
}
