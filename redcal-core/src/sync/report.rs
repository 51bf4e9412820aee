//! Outcome summaries for bulk save and revert runs.

/// What happened to a single appointment during a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Created,
    Updated,
    Deleted,
    /// Project or activity could not be resolved; the item stays `Modified`.
    Deferred,
    /// The issue could not be resolved; the item is now `SyncError`.
    Unresolved,
    /// Nothing to push for the item's state.
    Skipped,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SaveReport {
    pub outcomes: Vec<SaveOutcome>,
    /// Items that failed and were marked or restored.
    pub failed: usize,
    pub errors: Vec<String>,
}

impl SaveReport {
    fn count(&self, outcome: SaveOutcome) -> usize {
        self.outcomes.iter().filter(|o| **o == outcome).count()
    }

    /// (created, updated, deleted)
    pub fn push_counts(&self) -> (usize, usize, usize) {
        (
            self.count(SaveOutcome::Created),
            self.count(SaveOutcome::Updated),
            self.count(SaveOutcome::Deleted),
        )
    }

    pub fn deferred(&self) -> usize {
        self.count(SaveOutcome::Deferred)
    }

    pub fn unresolved(&self) -> usize {
        self.count(SaveOutcome::Unresolved)
    }

    pub fn skipped(&self) -> usize {
        self.count(SaveOutcome::Skipped)
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.errors.is_empty()
    }
}

/// Local changes made while resetting a window to the tracker's state.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ResetReport {
    /// Local items overwritten with remote values.
    pub updated: usize,
    /// Local items already matching the remote entry.
    pub unchanged: usize,
    /// New local items for remote entries.
    pub imported: usize,
    /// Unsynced or copied local items that were dropped.
    pub discarded: usize,
    /// Local items whose remote entry no longer exists.
    pub removed: usize,
}

impl ResetReport {
    pub fn total_changes(&self) -> usize {
        self.updated + self.imported + self.discarded + self.removed
    }
}
