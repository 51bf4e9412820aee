//! Entry id to issue id lookups.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::appointment::Appointment;
use crate::constants::FIELD_ISSUE_ID;

/// Remembers which issue an appointment belongs to, keyed by its entry id,
/// so repeated lookups skip the custom field read.
///
/// Owned by the engine. Writing an issue id through [`IssueIdCache::set_issue_id`]
/// overwrites the cached value.
#[derive(Debug, Default)]
pub struct IssueIdCache {
    by_entry_id: Mutex<HashMap<String, Option<i64>>>,
}

impl IssueIdCache {
    pub fn issue_id(&self, appt: &Appointment) -> Option<i64> {
        if appt.entry_id.is_empty() {
            return appt.custom_id(FIELD_ISSUE_ID);
        }

        let mut cache = self.lock();
        *cache
            .entry(appt.entry_id.clone())
            .or_insert_with(|| appt.custom_id(FIELD_ISSUE_ID))
    }

    pub fn set_issue_id(&self, appt: &mut Appointment, issue_id: Option<i64>) {
        if !appt.entry_id.is_empty() {
            self.lock().insert(appt.entry_id.clone(), issue_id);
        }
        appt.set_custom_id(FIELD_ISSUE_ID, issue_id);
    }

    pub fn invalidate(&self, entry_id: &str) {
        self.lock().remove(entry_id);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Option<i64>>> {
        // A poisoned lock only means another thread panicked mid-insert; the map is still usable.
        self.by_entry_id
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn appointment(entry_id: &str) -> Appointment {
        let at = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let mut appt = Appointment::new("Work", at, at);
        appt.entry_id = entry_id.to_string();
        appt
    }

    #[test]
    fn test_cached_value_wins_over_field_until_set() {
        let cache = IssueIdCache::default();
        let mut appt = appointment("e1");
        appt.set_custom_id(FIELD_ISSUE_ID, Some(10));
        assert_eq!(cache.issue_id(&appt), Some(10));

        // Raw field writes bypass the cache
        appt.set_custom_id(FIELD_ISSUE_ID, Some(11));
        assert_eq!(cache.issue_id(&appt), Some(10));

        cache.set_issue_id(&mut appt, Some(12));
        assert_eq!(cache.issue_id(&appt), Some(12));
        assert_eq!(appt.custom_id(FIELD_ISSUE_ID), Some(12));
    }

    #[test]
    fn test_unsaved_items_are_not_cached() {
        let cache = IssueIdCache::default();
        let mut appt = appointment("");
        appt.set_custom_id(FIELD_ISSUE_ID, Some(3));
        assert_eq!(cache.issue_id(&appt), Some(3));
        appt.set_custom_id(FIELD_ISSUE_ID, Some(4));
        assert_eq!(cache.issue_id(&appt), Some(4));
    }

    #[test]
    fn test_invalidate_rereads_field() {
        let cache = IssueIdCache::default();
        let mut appt = appointment("e2");
        appt.set_custom_id(FIELD_ISSUE_ID, Some(1));
        assert_eq!(cache.issue_id(&appt), Some(1));
        appt.set_custom_id(FIELD_ISSUE_ID, Some(2));
        cache.invalidate("e2");
        assert_eq!(cache.issue_id(&appt), Some(2));
    }
}
