/// Revision bounds and snapshot provenance.
///
/// A reconciliation pass only ever walks a closed window of revisions. These
/// constants and helpers define that window and how much a cached snapshot can
/// be trusted when it is used to seed one.

use serde::{Deserialize, Serialize};

use crate::groups::ids::Revision;

/// Upper bound meaning "apply everything the server returned".
pub const LATEST: Revision = Revision::MAX;

/// Where a locally cached snapshot came from.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Provenance {
    /// Built from a server snapshot or change log. Fully trusted.
    #[default]
    Fresh = 0,
    /// Partial knowledge (title and avatar) gathered from a group join link.
    /// Membership is a guess and must not produce timeline events.
    Placeholder = 1,
    /// No knowledge at all, e.g. only the master key survived a restore.
    RestorePlaceholder = 2,
}

impl Provenance {
    /// Returns true for either placeholder kind.
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Provenance::Placeholder | Provenance::RestorePlaceholder)
    }
}

/// Closed revision range `[from, to]` walked by one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevisionWindow {
    pub from: Revision,
    pub to: Revision,
}

impl RevisionWindow {
    /// Clamp `[earliest, latest]` to `maximum`.
    pub fn clamped(earliest: Revision, latest: Revision, maximum: Revision) -> Self {
        RevisionWindow {
            from: earliest,
            to: latest.min(maximum),
        }
    }

    /// Revisions in ascending order. Empty when `from > to`.
    pub fn revisions(&self) -> std::ops::RangeInclusive<Revision> {
        self.from..=self.to
    }

    pub fn is_empty(&self) -> bool {
        self.from > self.to
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_clamps_to_maximum() {
        let window = RevisionWindow::clamped(0, 10, 4);
        assert_eq!(window, RevisionWindow { from: 0, to: 4 });
        assert_eq!(window.revisions().count(), 5);
    }

    #[test]
    fn test_window_latest_is_unbounded() {
        let window = RevisionWindow::clamped(3, 7, LATEST);
        assert_eq!(window.to, 7);
    }

    #[test]
    fn test_window_reaches_max_revision_without_overflow() {
        let window = RevisionWindow::clamped(Revision::MAX - 1, Revision::MAX, LATEST);
        let revisions: Vec<_> = window.revisions().collect();
        assert_eq!(revisions, vec![Revision::MAX - 1, Revision::MAX]);
    }

    #[test]
    fn test_empty_window() {
        let window = RevisionWindow::clamped(5, 9, 2);
        assert!(window.is_empty());
        assert_eq!(window.revisions().count(), 0);
    }

    #[test]
    fn test_provenance_placeholder_kinds() {
        assert!(!Provenance::Fresh.is_placeholder());
        assert!(Provenance::Placeholder.is_placeholder());
        assert!(Provenance::RestorePlaceholder.is_placeholder());
        assert_eq!(Provenance::default(), Provenance::Fresh);
    }
}
