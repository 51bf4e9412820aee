//! Change tracking for appointments.
//!
//! The host reports item additions, property changes and delete attempts.
//! Only registered appointments are tracked; the registrar turns their events
//! into state transitions.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::appointment::{Appointment, IssueIdCache};
use crate::calendar::CalendarStore;
use crate::error::RedcalResult;
use crate::observer::SyncObserver;
use crate::sync_state::SyncState;

/// A changed appointment property, as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangedProperty {
    Subject,
    Start,
    End,
    Other(String),
}

impl ChangedProperty {
    pub fn from_name(name: &str) -> Self {
        match name {
            "Subject" => ChangedProperty::Subject,
            "Start" => ChangedProperty::Start,
            "End" => ChangedProperty::End,
            other => ChangedProperty::Other(other.to_string()),
        }
    }

    fn is_time(&self) -> bool {
        matches!(self, ChangedProperty::Start | ChangedProperty::End)
    }
}

/// Answer to a delete attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteDecision {
    /// Delete the item now.
    Proceed,
    /// Keep the item; it was marked `Deleted` and is removed once the remote entry is gone.
    Cancel,
}

#[derive(Debug, Default)]
pub struct Registrar {
    tracked: Mutex<HashSet<String>>,
}

impl Registrar {
    /// Start tracking an appointment. Returns false if it already was tracked.
    pub fn register(&self, appt: &Appointment) -> bool {
        if appt.entry_id.is_empty() {
            return false;
        }

        let added = self.lock().insert(appt.entry_id.clone());
        if added {
            debug!(entry_id = %appt.entry_id, "Tracking appointment");
        }
        added
    }

    pub fn unregister(&self, entry_id: &str) {
        self.lock().remove(entry_id);
    }

    pub fn is_registered(&self, entry_id: &str) -> bool {
        self.lock().contains(entry_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Handle a newly added item.
    ///
    /// An item that already carries an issue id and was not imported from the
    /// tracker is a user copy or a prepared entry, so it becomes `Modified`.
    pub fn item_added(
        &self,
        appt: &mut Appointment,
        store: &dyn CalendarStore,
        issue_ids: &IssueIdCache,
    ) -> RedcalResult<()> {
        appt.reminder_set = false;

        if issue_ids.issue_id(appt).is_some() && !appt.is_imported() {
            appt.set_state(SyncState::Modified);
        } else {
            appt.clear_imported();
        }

        store.save(appt)?;
        self.register(appt);
        Ok(())
    }

    /// Handle a property change on a tracked item.
    pub fn property_changed(
        &self,
        appt: &mut Appointment,
        property: &ChangedProperty,
        store: &dyn CalendarStore,
        observer: &dyn SyncObserver,
    ) -> RedcalResult<()> {
        if !self.is_registered(&appt.entry_id) {
            return Ok(());
        }

        if !matches!(
            property,
            ChangedProperty::Subject | ChangedProperty::Start | ChangedProperty::End
        ) {
            return Ok(());
        }

        if !appt.is_modified_set() {
            appt.set_state(SyncState::Modified);
            store.save(appt)?;
        }

        // Subject changes do not move the item in the calendar
        if property.is_time() {
            observer.appointment_changed();
        }

        Ok(())
    }

    /// Handle a delete attempt on an item.
    ///
    /// A tracked item with a remote time entry is not deleted; it is marked
    /// `Deleted` so the next save removes the remote entry first. A copy
    /// carries the original's entry id and is deleted right away.
    pub fn before_delete(
        &self,
        appt: &mut Appointment,
        store: &dyn CalendarStore,
    ) -> RedcalResult<DeleteDecision> {
        if self.is_registered(&appt.entry_id) && appt.has_remote_entry() && !appt.is_copied() {
            appt.set_state(SyncState::Deleted);
            store.save(appt)?;
            return Ok(DeleteDecision::Cancel);
        }

        Ok(DeleteDecision::Proceed)
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.tracked
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::FolderCalendar;
    use crate::constants::FIELD_ISSUE_ID;
    use chrono::NaiveDate;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingObserver {
        changed: AtomicUsize,
    }

    impl SyncObserver for CountingObserver {
        fn appointment_changed(&self) {
            self.changed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn stored(calendar: &FolderCalendar) -> Appointment {
        let at = NaiveDate::from_ymd_opt(2024, 7, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        calendar
            .add(Appointment::new("Support", at, at + chrono::Duration::hours(1)))
            .unwrap()
    }

    #[test]
    fn test_registration_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let calendar = FolderCalendar::open(dir.path()).unwrap();
        let registrar = Registrar::default();
        let appt = stored(&calendar);

        assert!(registrar.register(&appt));
        assert!(!registrar.register(&appt));
        assert_eq!(registrar.len(), 1);
    }

    #[test]
    fn test_concurrent_registration_tracks_once() {
        let dir = tempfile::tempdir().unwrap();
        let calendar = FolderCalendar::open(dir.path()).unwrap();
        let registrar = Arc::new(Registrar::default());
        let appt = stored(&calendar);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registrar = Arc::clone(&registrar);
                let appt = appt.clone();
                std::thread::spawn(move || registrar.register(&appt))
            })
            .collect();

        let newly_added = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|added| *added)
            .count();
        assert_eq!(newly_added, 1);
        assert_eq!(registrar.len(), 1);
    }

    #[test]
    fn test_delete_with_remote_entry_is_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let calendar = FolderCalendar::open(dir.path()).unwrap();
        let registrar = Registrar::default();

        let mut appt = stored(&calendar);
        appt.set_time_entry_id(Some(17));
        registrar.register(&appt);

        let decision = registrar.before_delete(&mut appt, &calendar).unwrap();
        assert_eq!(decision, DeleteDecision::Cancel);
        assert!(appt.is_deleted_set());

        let saved = calendar.get(&appt.entry_id).unwrap().unwrap();
        assert!(saved.is_deleted_set());
    }

    #[test]
    fn test_delete_of_copy_proceeds() {
        let dir = tempfile::tempdir().unwrap();
        let calendar = FolderCalendar::open(dir.path()).unwrap();
        let registrar = Registrar::default();

        let mut original = stored(&calendar);
        original.set_time_entry_id(Some(17));
        original.mark_as_not_copied();
        calendar.save(&original).unwrap();

        let mut duplicate = original.clone();
        duplicate.entry_id.clear();
        let mut copy = calendar.add(duplicate).unwrap();
        registrar.register(&copy);
        assert!(copy.is_copied());

        assert_eq!(
            registrar.before_delete(&mut copy, &calendar).unwrap(),
            DeleteDecision::Proceed
        );
        assert!(!copy.is_deleted_set());
    }

    #[test]
    fn test_delete_without_remote_entry_proceeds() {
        let dir = tempfile::tempdir().unwrap();
        let calendar = FolderCalendar::open(dir.path()).unwrap();
        let registrar = Registrar::default();

        let mut appt = stored(&calendar);
        registrar.register(&appt);
        assert_eq!(
            registrar.before_delete(&mut appt, &calendar).unwrap(),
            DeleteDecision::Proceed
        );

        appt.set_time_entry_id(Some(-3));
        assert_eq!(
            registrar.before_delete(&mut appt, &calendar).unwrap(),
            DeleteDecision::Proceed
        );
    }

    #[test]
    fn test_property_change_marks_modified_and_refreshes_on_time_change() {
        let dir = tempfile::tempdir().unwrap();
        let calendar = FolderCalendar::open(dir.path()).unwrap();
        let registrar = Registrar::default();
        let observer = CountingObserver::default();

        let mut appt = stored(&calendar);
        registrar.register(&appt);

        registrar
            .property_changed(&mut appt, &ChangedProperty::Subject, &calendar, &observer)
            .unwrap();
        assert!(appt.is_modified_set());
        assert_eq!(observer.changed.load(Ordering::SeqCst), 0);

        registrar
            .property_changed(&mut appt, &ChangedProperty::End, &calendar, &observer)
            .unwrap();
        assert_eq!(observer.changed.load(Ordering::SeqCst), 1);

        let mut other = stored(&calendar);
        registrar
            .property_changed(
                &mut other,
                &ChangedProperty::from_name("Location"),
                &calendar,
                &observer,
            )
            .unwrap();
        assert!(!other.is_modified_set());
    }

    #[test]
    fn test_untracked_items_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let calendar = FolderCalendar::open(dir.path()).unwrap();
        let registrar = Registrar::default();
        let observer = CountingObserver::default();

        let mut appt = stored(&calendar);
        appt.set_time_entry_id(Some(5));
        registrar
            .property_changed(&mut appt, &ChangedProperty::Start, &calendar, &observer)
            .unwrap();
        assert!(!appt.is_modified_set());
        assert_eq!(
            registrar.before_delete(&mut appt, &calendar).unwrap(),
            DeleteDecision::Proceed
        );
    }

    #[test]
    fn test_added_item_with_issue_becomes_modified_unless_imported() {
        let dir = tempfile::tempdir().unwrap();
        let calendar = FolderCalendar::open(dir.path()).unwrap();
        let registrar = Registrar::default();
        let issue_ids = IssueIdCache::default();

        let mut copy = stored(&calendar);
        copy.set_custom_id(FIELD_ISSUE_ID, Some(8));
        copy.reminder_set = true;
        registrar.item_added(&mut copy, &calendar, &issue_ids).unwrap();
        assert!(copy.is_modified_set());
        assert!(!copy.reminder_set);
        assert!(registrar.is_registered(&copy.entry_id));

        let mut imported = stored(&calendar);
        imported.set_custom_id(FIELD_ISSUE_ID, Some(8));
        imported.set_imported(true);
        registrar
            .item_added(&mut imported, &calendar, &issue_ids)
            .unwrap();
        assert!(!imported.is_modified_set());
        assert!(!imported.is_imported());
    }
}
