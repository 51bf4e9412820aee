//! Sync state transitions on appointments.

use chrono::Local;
use tracing::warn;

use crate::appointment::Appointment;
use crate::constants::{FIELD_PREVIOUS_STATE, FIELD_STATE};
use crate::sync_state::{PendingChange, SyncState};

impl Appointment {
    /// Current state, read from the state field.
    pub fn state(&self) -> Option<SyncState> {
        self.custom_id(FIELD_STATE).and_then(SyncState::from_value)
    }

    pub fn previous_state(&self) -> Option<SyncState> {
        self.custom_id(FIELD_PREVIOUS_STATE)
            .and_then(SyncState::from_value)
    }

    /// Move to `state`.
    ///
    /// Recognized state categories are replaced by the new one at the front,
    /// all other categories are kept in order. The prior state is remembered
    /// unless it was `SyncError`.
    pub fn set_state(&mut self, state: SyncState) {
        if state == SyncState::Modified {
            self.set_modification_date(Local::now().naive_local());
        }
        self.restore_state(state);
    }

    /// Move to `state` without stamping the modification date.
    pub fn restore_state(&mut self, state: SyncState) {
        let mut categories: Vec<String> = self
            .categories
            .iter()
            .filter(|c| !SyncState::is_state_name(c))
            .cloned()
            .collect();
        categories.insert(0, state.name().to_string());
        self.categories = categories;

        if let Some(prior) = self.custom_id(FIELD_STATE)
            && prior != SyncState::SyncError.value()
        {
            self.set_custom_id(FIELD_PREVIOUS_STATE, Some(prior));
        }

        self.set_custom_id(FIELD_STATE, Some(state.value()));
    }

    /// Re-apply the remembered state, typically to retry after a `SyncError`.
    ///
    /// A remembered `Synchronized` is never restored: that would make an item
    /// look clean that failed to sync. Returns the state that was applied.
    pub fn reset_previous_state(&mut self) -> Option<SyncState> {
        let state = self.previous_state()?;

        if state == SyncState::Synchronized {
            warn!(
                appointment = %self,
                categories = ?self.categories,
                "Previous state is synchronized, not restoring it"
            );
            return None;
        }

        self.set_state(state);
        Some(state)
    }

    pub fn is_category_set(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }

    pub fn is_modified_set(&self) -> bool {
        self.is_category_set(SyncState::Modified.name())
    }

    pub fn is_deleted_set(&self) -> bool {
        self.is_category_set(SyncState::Deleted.name())
    }

    pub fn is_sync_error_set(&self) -> bool {
        self.is_category_set(SyncState::SyncError.name())
    }

    pub fn is_synchronized_set(&self) -> bool {
        self.is_category_set(SyncState::Synchronized.name())
    }

    pub fn is_synchronized_overtime_set(&self) -> bool {
        self.is_category_set(SyncState::SynchronizedOvertime.name())
    }

    /// The change the outbound path should push, judged by the state category.
    pub fn pending_change(&self) -> Option<PendingChange> {
        if self.is_modified_set() {
            Some(PendingChange::Modified)
        } else if self.is_deleted_set() {
            Some(PendingChange::Deleted)
        } else {
            None
        }
    }

    /// Whether the item still has something to push (or failed to).
    pub fn needs_sync(&self) -> bool {
        self.is_modified_set() || self.is_deleted_set() || self.is_sync_error_set()
    }
}
