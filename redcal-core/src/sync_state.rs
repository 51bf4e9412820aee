//! Sync states an appointment can be in.

use std::fmt;

use serde::{Deserialize, Serialize};

/// State of an appointment relative to its remote time entry.
///
/// An appointment that was never touched by the engine has no state at all,
/// which is modeled as `Option<SyncState>::None` by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncState {
    Modified,
    Deleted,
    Synchronized,
    SynchronizedOvertime,
    SyncError,
}

impl SyncState {
    pub const ALL: [SyncState; 5] = [
        SyncState::Modified,
        SyncState::Deleted,
        SyncState::Synchronized,
        SyncState::SynchronizedOvertime,
        SyncState::SyncError,
    ];

    /// Category token shown by the host calendar.
    pub fn name(&self) -> &'static str {
        match self {
            SyncState::Modified => "Redmine Modified",
            SyncState::Deleted => "Redmine Deleted",
            SyncState::Synchronized => "Redmine Synchronized",
            SyncState::SynchronizedOvertime => "Redmine Overtime",
            SyncState::SyncError => "Redmine Sync Error",
        }
    }

    /// Stable value persisted in the state custom field.
    pub fn value(&self) -> i64 {
        match self {
            SyncState::Modified => 1,
            SyncState::Deleted => 2,
            SyncState::Synchronized => 3,
            SyncState::SynchronizedOvertime => 4,
            SyncState::SyncError => 5,
        }
    }

    pub fn from_value(value: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.value() == value)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    pub fn is_state_name(name: &str) -> bool {
        Self::from_name(name).is_some()
    }

    /// The change still waiting to be pushed, if this state carries one.
    pub fn pending(&self) -> Option<PendingChange> {
        match self {
            SyncState::Modified => Some(PendingChange::Modified),
            SyncState::Deleted => Some(PendingChange::Deleted),
            _ => None,
        }
    }

    /// State after a successful push or pull for the given issue.
    pub fn synchronized_for(issue_id: i64, overtime_issue_id: Option<i64>) -> Self {
        if Some(issue_id) == overtime_issue_id {
            SyncState::SynchronizedOvertime
        } else {
            SyncState::Synchronized
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A local change the outbound path knows how to push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingChange {
    Modified,
    Deleted,
}

impl From<PendingChange> for SyncState {
    fn from(change: PendingChange) -> Self {
        match change {
            PendingChange::Modified => SyncState::Modified,
            PendingChange::Deleted => SyncState::Deleted,
        }
    }
}
