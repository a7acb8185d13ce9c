//! # Shield Group State
//!
//! **Reconciles a locally cached group with the server's revision log.**
//!
//! Given the last group snapshot a device stored and a page of server history,
//! the engine produces the reconciled group state and a linear, deduplicated
//! list of changes to surface as timeline events. It is a pure function of its
//! inputs: no I/O, no persistence, no shared state.
//!
//! - **Gap tolerant**: missing revisions are logged and skipped
//! - **Self-repairing**: a change that disagrees with its snapshot is kept and
//!   followed by a correcting change
//! - **Placeholder aware**: join-link and restore placeholders never produce
//!   membership events they could not have observed
//! - **Windowed**: history above a revision bound is handed back for later
//!
//! ## Quick Start
//!
//! ```rust
//! use shield_group_state::groups::{
//!     GroupChange, GroupSnapshot, GroupStateDiff, GroupStatePatcher, RemoteLogEntry, LATEST,
//! };
//!
//! let local = GroupSnapshot { title: "Hikers".into(), ..GroupSnapshot::at_revision(4) };
//! let change = GroupChange { new_title: Some("Hikers 2026".into()), ..GroupChange::at_revision(5) };
//! let input = GroupStateDiff::new(Some(local), vec![RemoteLogEntry::ChangeOnly(change)]);
//!
//! let result = GroupStatePatcher::new().advance_group_state(&input, LATEST);
//! assert_eq!(result.new_state.unwrap().title, "Hikers 2026");
//! assert_eq!(result.surfaced.len(), 1);
//! ```
//!
//! ## Architecture
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`groups::chain`] | Generic self-repairing (state, delta) chain |
//! | [`groups::patcher`] | Windowed reconciliation and duplicate-change cleaning |
//! | [`groups::apply`] / [`groups::reconstruct`] / [`groups::resolve`] | Group change semantics |
//! | [`groups::entry`] | Remote and local log entries, reconcile input and output |
//! | [`groups::group`] / [`groups::change`] | Snapshot and change models |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `codec` | Yes | CBOR persistence helpers (adds `ciborium`) |

// Crate-level lint configuration: stylistic lints only.
#![allow(clippy::empty_line_after_doc_comments)]

// ── Public modules ──────────────────────────────────────────────────────────

/// Group snapshots, changes, and the reconciliation engine.
pub mod groups;

// ── Re-exports for convenience ──────────────────────────────────────────────

pub use groups::{
    GroupChange, GroupSnapshot, GroupStateDiff, GroupStatePatcher, LocalLogEntry, Provenance,
    ReconcileResult, RemoteLogEntry, Revision, ServiceId, LATEST,
};

// ── Library metadata ────────────────────────────────────────────────────────

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the crate version string.
pub fn version() -> &'static str {
    VERSION
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
        assert!(version().contains('.'));
    }
}
