/// Group snapshot: the full state of a group at one revision.
///
/// Snapshots are plain immutable values. Every transformation (apply, diff,
/// placeholder seeding) produces a new snapshot rather than editing one.

use serde::{Deserialize, Serialize};

use crate::groups::ids::{Revision, ServiceId};
use crate::groups::revision::Provenance;

// ---------------------------------------------------------------------------
// Roles and access levels
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Role {
    #[default]
    Unknown = 0,
    Default = 1,
    Administrator = 2,
}

impl Role {
    /// Only these roles may be assigned by a change.
    pub fn is_known(&self) -> bool {
        matches!(self, Role::Default | Role::Administrator)
    }
}

/// Who may perform an action. `Unknown` inside a change means "not changed".
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AccessRequired {
    #[default]
    Unknown = 0,
    Any = 1,
    Member = 2,
    Administrator = 3,
    Unsatisfiable = 4,
}

/// Tri-state flag. `Unknown` inside a change means "not changed".
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EnabledState {
    #[default]
    Unknown = 0,
    Enabled = 1,
    Disabled = 2,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct AccessControl {
    pub attributes: AccessRequired,
    pub members: AccessRequired,
    pub add_from_invite_link: AccessRequired,
}

// ---------------------------------------------------------------------------
// Member records
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Member {
    pub aci: ServiceId,
    pub role: Role,
    pub profile_key: Vec<u8>,
    pub joined_at_revision: Revision,
}

impl Member {
    /// A default-role member with no profile key.
    pub fn new(aci: ServiceId) -> Self {
        Member {
            aci,
            role: Role::Default,
            profile_key: Vec::new(),
            joined_at_revision: 0,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn with_profile_key(mut self, profile_key: Vec<u8>) -> Self {
        self.profile_key = profile_key;
        self
    }
}

/// Invited but not yet accepted.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PendingMember {
    pub service_id: ServiceId,
    pub role: Role,
    pub added_by: Option<ServiceId>,
    pub timestamp_ms: u64,
}

impl PendingMember {
    pub fn new(service_id: ServiceId) -> Self {
        PendingMember {
            service_id,
            role: Role::Default,
            added_by: None,
            timestamp_ms: 0,
        }
    }
}

/// Asked to join via an invite link, awaiting admin approval.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RequestingMember {
    pub aci: ServiceId,
    pub profile_key: Vec<u8>,
    pub timestamp_ms: u64,
}

impl RequestingMember {
    pub fn new(aci: ServiceId) -> Self {
        RequestingMember {
            aci,
            profile_key: Vec::new(),
            timestamp_ms: 0,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BannedMember {
    pub service_id: ServiceId,
    pub timestamp_ms: u64,
}

impl BannedMember {
    pub fn new(service_id: ServiceId) -> Self {
        BannedMember {
            service_id,
            timestamp_ms: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// GroupSnapshot
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupSnapshot {
    pub revision: Revision,
    /// Whether this snapshot is authoritative or a locally built stand-in.
    pub provenance: Provenance,
    pub title: String,
    pub description: String,
    /// Reference (CDN key) to the encrypted avatar, empty when unset.
    pub avatar: String,
    /// Disappearing-messages timer in seconds, 0 when off.
    pub disappearing_messages_timer: u32,
    pub access_control: AccessControl,
    pub members: Vec<Member>,
    pub pending_members: Vec<PendingMember>,
    pub requesting_members: Vec<RequestingMember>,
    pub banned_members: Vec<BannedMember>,
    pub invite_link_password: Vec<u8>,
    pub is_announcement_group: EnabledState,
}

impl GroupSnapshot {
    /// An empty, trusted snapshot at `revision`.
    pub fn at_revision(revision: Revision) -> Self {
        GroupSnapshot {
            revision,
            ..Default::default()
        }
    }

    /// A join-link placeholder that knows only the title and avatar.
    pub fn placeholder(title: impl Into<String>, avatar: impl Into<String>) -> Self {
        GroupSnapshot {
            provenance: Provenance::Placeholder,
            title: title.into(),
            avatar: avatar.into(),
            ..Default::default()
        }
    }

    /// A restore placeholder with no knowledge of the group at all.
    pub fn restore_placeholder() -> Self {
        GroupSnapshot {
            provenance: Provenance::RestorePlaceholder,
            ..Default::default()
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.provenance.is_placeholder()
    }

    pub fn find_member(&self, aci: &ServiceId) -> Option<&Member> {
        self.members.iter().find(|m| &m.aci == aci)
    }

    pub fn find_pending(&self, service_id: &ServiceId) -> Option<&PendingMember> {
        self.pending_members
            .iter()
            .find(|m| &m.service_id == service_id)
    }

    pub fn find_requesting(&self, aci: &ServiceId) -> Option<&RequestingMember> {
        self.requesting_members.iter().find(|m| &m.aci == aci)
    }

    pub fn is_member(&self, aci: &ServiceId) -> bool {
        self.find_member(aci).is_some()
    }

    pub fn is_banned(&self, service_id: &ServiceId) -> bool {
        self.banned_members
            .iter()
            .any(|m| &m.service_id == service_id)
    }

    /// Whether `id` is either invited or asking to join.
    pub fn is_pending_or_requesting(&self, id: &ServiceId) -> bool {
        self.find_pending(id).is_some() || self.find_requesting(id).is_some()
    }

    /// Deterministic digest of the snapshot.
    ///
    /// BLAKE3 over every field in a fixed order, variable-length fields
    /// length-prefixed. Member order is part of the digest, matching server
    /// order.
    pub fn state_hash(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();

        // --- Attributes ---
        hasher.update(b"A");
        hasher.update(&self.revision.to_le_bytes());
        hasher.update(&[self.provenance as u8]);
        hash_bytes(&mut hasher, self.title.as_bytes());
        hash_bytes(&mut hasher, self.description.as_bytes());
        hash_bytes(&mut hasher, self.avatar.as_bytes());
        hasher.update(&self.disappearing_messages_timer.to_le_bytes());
        hasher.update(&[
            self.access_control.attributes as u8,
            self.access_control.members as u8,
            self.access_control.add_from_invite_link as u8,
        ]);
        hash_bytes(&mut hasher, &self.invite_link_password);
        hasher.update(&[self.is_announcement_group as u8]);

        // --- Members ---
        hasher.update(b"M");
        hasher.update(&(self.members.len() as u64).to_le_bytes());
        for member in &self.members {
            hasher.update(member.aci.as_bytes());
            hasher.update(&[member.role as u8]);
            hash_bytes(&mut hasher, &member.profile_key);
            hasher.update(&member.joined_at_revision.to_le_bytes());
        }

        // --- Pending ---
        hasher.update(b"P");
        hasher.update(&(self.pending_members.len() as u64).to_le_bytes());
        for pending in &self.pending_members {
            hasher.update(pending.service_id.as_bytes());
            hasher.update(&[pending.role as u8]);
            match &pending.added_by {
                Some(added_by) => {
                    hasher.update(&[1]);
                    hasher.update(added_by.as_bytes());
                }
                None => {
                    hasher.update(&[0]);
                }
            }
            hasher.update(&pending.timestamp_ms.to_le_bytes());
        }

        // --- Requesting ---
        hasher.update(b"R");
        hasher.update(&(self.requesting_members.len() as u64).to_le_bytes());
        for requesting in &self.requesting_members {
            hasher.update(requesting.aci.as_bytes());
            hash_bytes(&mut hasher, &requesting.profile_key);
            hasher.update(&requesting.timestamp_ms.to_le_bytes());
        }

        // --- Banned ---
        hasher.update(b"B");
        hasher.update(&(self.banned_members.len() as u64).to_le_bytes());
        for banned in &self.banned_members {
            hasher.update(banned.service_id.as_bytes());
            hasher.update(&banned.timestamp_ms.to_le_bytes());
        }

        *hasher.finalize().as_bytes()
    }
}

fn hash_bytes(hasher: &mut blake3::Hasher, bytes: &[u8]) {
    hasher.update(&(bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u8) -> ServiceId {
        ServiceId::from_bytes([n; 16])
    }

    #[test]
    fn test_placeholder_constructors() {
        let placeholder = GroupSnapshot::placeholder("Join link title", "avatar/cdn/1");
        assert_eq!(placeholder.provenance, Provenance::Placeholder);
        assert_eq!(placeholder.title, "Join link title");
        assert!(placeholder.members.is_empty());
        assert!(placeholder.is_placeholder());

        let restore = GroupSnapshot::restore_placeholder();
        assert_eq!(restore.provenance, Provenance::RestorePlaceholder);
        assert!(!GroupSnapshot::at_revision(3).is_placeholder());
    }

    #[test]
    fn test_member_lookups() {
        let group = GroupSnapshot {
            members: vec![Member::new(id(1)).with_role(Role::Administrator)],
            pending_members: vec![PendingMember::new(id(2))],
            requesting_members: vec![RequestingMember::new(id(3))],
            banned_members: vec![BannedMember::new(id(4))],
            ..GroupSnapshot::at_revision(5)
        };

        assert_eq!(group.find_member(&id(1)).unwrap().role, Role::Administrator);
        assert!(group.is_member(&id(1)));
        assert!(!group.is_member(&id(2)));
        assert!(group.is_pending_or_requesting(&id(2)));
        assert!(group.is_pending_or_requesting(&id(3)));
        assert!(!group.is_pending_or_requesting(&id(1)));
        assert!(group.is_banned(&id(4)));
    }

    #[test]
    fn test_state_hash_tracks_content() {
        let a = GroupSnapshot {
            title: "A".into(),
            ..GroupSnapshot::at_revision(1)
        };
        let same = a.clone();
        let renamed = GroupSnapshot {
            title: "B".into(),
            ..a.clone()
        };

        assert_eq!(a.state_hash(), same.state_hash());
        assert_ne!(a.state_hash(), renamed.state_hash());
    }

    #[test]
    fn test_state_hash_covers_every_section() {
        let base = GroupSnapshot::at_revision(3);
        let variants = [
            GroupSnapshot { members: vec![Member::new(id(1))], ..base.clone() },
            GroupSnapshot { pending_members: vec![PendingMember::new(id(1))], ..base.clone() },
            GroupSnapshot { requesting_members: vec![RequestingMember::new(id(1))], ..base.clone() },
            GroupSnapshot { banned_members: vec![BannedMember::new(id(1))], ..base.clone() },
            GroupSnapshot { provenance: Provenance::RestorePlaceholder, ..base.clone() },
            GroupSnapshot { invite_link_password: vec![7], ..base.clone() },
            GroupSnapshot::at_revision(4),
        ];

        let mut hashes: Vec<[u8; 32]> = variants.iter().map(GroupSnapshot::state_hash).collect();
        hashes.push(base.state_hash());
        let count = hashes.len();
        hashes.sort();
        hashes.dedup();
        assert_eq!(hashes.len(), count);
    }

    #[test]
    fn test_state_hash_separates_adjacent_strings() {
        let a = GroupSnapshot {
            title: "ab".into(),
            ..GroupSnapshot::at_revision(1)
        };
        let b = GroupSnapshot {
            title: "a".into(),
            description: "b".into(),
            ..GroupSnapshot::at_revision(1)
        };
        assert_ne!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn test_role_known() {
        assert!(Role::Default.is_known());
        assert!(Role::Administrator.is_known());
        assert!(!Role::Unknown.is_known());
    }
}
