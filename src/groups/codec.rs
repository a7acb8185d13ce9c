/// CBOR persistence for reconciled group state.
///
/// The engine never stores anything itself. These helpers give callers a
/// stable byte form for snapshots and log entries without picking a format of
/// their own.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::groups::entry::{LocalLogEntry, RemoteLogEntry};
use crate::groups::group::GroupSnapshot;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("CBOR encoding failed: {0}")]
    CborEncode(String),

    #[error("CBOR decoding failed: {0}")]
    CborDecode(String),
}

// ---------------------------------------------------------------------------
// CBOR helpers
// ---------------------------------------------------------------------------

/// CBOR-encode a value.
pub fn cbor_encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| CodecError::CborEncode(e.to_string()))?;
    Ok(buf)
}

/// CBOR-decode a value from bytes.
pub fn cbor_decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    ciborium::from_reader(bytes).map_err(|e| CodecError::CborDecode(e.to_string()))
}

macro_rules! impl_cbor {
    ($($ty:ty),*) => {
        $(
            impl $ty {
                pub fn to_cbor(&self) -> Result<Vec<u8>, CodecError> {
                    cbor_encode(self)
                }

                pub fn from_cbor(bytes: &[u8]) -> Result<Self, CodecError> {
                    cbor_decode(bytes)
                }
            }
        )*
    };
}

impl_cbor!(GroupSnapshot, LocalLogEntry, RemoteLogEntry);

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
