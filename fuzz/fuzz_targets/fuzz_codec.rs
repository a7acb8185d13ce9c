#![no_main]
use libfuzzer_sys::fuzz_target;

use shield_group_state::groups::{
    cbor_decode, cbor_encode, GroupSnapshot, GroupStateDiff, GroupStatePatcher, LocalLogEntry,
    RemoteLogEntry, LATEST,
};

/// Fuzz CBOR decoding of persisted state and feed whatever decodes into the
/// engine.
///
/// Decoding arbitrary bytes must never panic, and a decoded value must
/// re-encode to bytes that decode to the same value.

fuzz_target!(|data: &[u8]| {
    // Limit input size to prevent OOM
    if data.len() > 16384 {
        return;
    }

    if let Ok(group) = GroupSnapshot::from_cbor(data) {
        let encoded = group.to_cbor().unwrap();
        assert_eq!(GroupSnapshot::from_cbor(&encoded).unwrap(), group);
    }

    let _ = LocalLogEntry::from_cbor(data);
    if let Ok(entry) = RemoteLogEntry::from_cbor(data) {
        if let Some(change) = entry.change() {
            assert_eq!(change.revision, entry.revision());
        }
    }

    if let Ok(diff) = cbor_decode::<GroupStateDiff>(data) {
        // Restore the ordering a caller guarantees before reconciling.
        let mut history = diff.remote_history;
        history.sort_by_key(RemoteLogEntry::revision);
        history.dedup_by_key(|e| e.revision());
        if history.len() > 64 {
            return;
        }

        let input = GroupStateDiff::new(diff.local_snapshot, history);
        let result = GroupStatePatcher::new().advance_group_state(&input, LATEST);
        for pair in result.surfaced.windows(2) {
            assert!(pair[0].revision() <= pair[1].revision());
        }
        let _ = cbor_encode(&result);
    }
});
