/// Identity types for group members.
///
/// - `ServiceId`: 16-byte account identity (ACI or PNI), UUID-shaped
/// - `Revision`: monotonically increasing group revision number

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Group revision number. Revisions are dense: every change advances by one.
pub type Revision = u32;

// ---------------------------------------------------------------------------
// ServiceId
// ---------------------------------------------------------------------------

/// Stable account identity of a member, pending invitee, requester or editor.
///
/// Ordering is by raw bytes so that any derived collections iterate in the
/// same order on every device.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceId(pub Uuid);

impl ServiceId {
    /// Create from raw bytes.
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        ServiceId(Uuid::from_bytes(bytes))
    }

    /// Generate a random identity (v4).
    pub fn random() -> Self {
        ServiceId(Uuid::new_v4())
    }

    /// Return the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// Hex-encode for display/storage.
    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }

    /// Decode from hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 16 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut id = [0u8; 16];
        id.copy_from_slice(&bytes);
        Ok(ServiceId::from_bytes(id))
    }
}

impl From<Uuid> for ServiceId {
    fn from(uuid: Uuid) -> Self {
        ServiceId(uuid)
    }
}

impl Ord for ServiceId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl PartialOrd for ServiceId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceId({})", &self.to_hex()[..8])
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
