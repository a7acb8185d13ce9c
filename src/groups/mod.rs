/// Group state reconciliation: merging a cached group with server history.
///
/// A client keeps the last group state it saw. When it next talks to the
/// server it receives a page of revision history that may have missing
/// snapshots, missing changes, gaps, or changes that disagree with their
/// snapshots. Reconciliation turns that into one trusted state plus a
/// deduplicated list of changes to show on the timeline.
///
/// # Module structure
/// - `ids`: ServiceId and Revision
/// - `revision`: LATEST bound, snapshot provenance, revision windows
/// - `group`: GroupSnapshot and member records
/// - `change`: GroupChange and its classification
/// - `apply`: applying a change to a snapshot
/// - `reconstruct`: deriving the change between two snapshots
/// - `resolve`: stripping changes a snapshot already reflects
/// - `entry`: remote and local log entries, reconcile input and output
/// - `chain`: generic self-repairing (state, delta) chain
/// - `patcher`: windowed reconciliation and duplicate cleaning
/// - `codec`: CBOR persistence (feature `codec`)
pub mod apply;
pub mod chain;
pub mod change;
#[cfg(feature = "codec")]
pub mod codec;
pub mod entry;
pub mod group;
pub mod ids;
pub mod patcher;
pub mod reconstruct;
pub mod resolve;
pub mod revision;

// Re-export core types for convenience
pub use apply::{apply_change, apply_change_without_revision_check, remove_member, ApplyError};
pub use chain::{ChainLink, ChainStrategy, StateChain};
pub use change::{ApproveMember, GroupChange, ModifyMemberRole};
#[cfg(feature = "codec")]
pub use codec::{cbor_decode, cbor_encode, CodecError};
pub use entry::{
    GroupStateDiff, LocalLogEntry, LogEntryError, PagingCursor, ReconcileResult, RemoteLogEntry,
};
pub use group::{
    AccessControl, AccessRequired, BannedMember, EnabledState, GroupSnapshot, Member,
    PendingMember, RequestingMember, Role,
};
pub use ids::{Revision, ServiceId};
pub use patcher::{GroupChangeStrategy, GroupStatePatcher, ResolveConflict};
pub use reconstruct::reconstruct_change;
pub use resolve::resolve_conflict;
pub use revision::{Provenance, RevisionWindow, LATEST};
