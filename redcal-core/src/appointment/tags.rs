//! Tag access for records that may not exist.
//!
//! Host notifications can refer to items that vanished in the meantime. These
//! helpers log and do nothing instead of failing.

use chrono::NaiveDateTime;
use tracing::error;

use crate::appointment::{Appointment, IssueIdCache};

pub fn custom_id(record: Option<&Appointment>, field: &str) -> Option<i64> {
    match record {
        Some(appt) => appt.custom_id(field),
        None => {
            error!(field, "No appointment given, property cannot be read");
            None
        }
    }
}

pub fn set_custom_id(record: Option<&mut Appointment>, field: &str, value: Option<i64>) {
    match record {
        Some(appt) => appt.set_custom_id(field, value),
        None => error!(field, "No appointment given, property cannot be set"),
    }
}

/// Remote references written onto an appointment after a sync.
#[derive(Debug, Clone, Copy)]
pub struct RemoteFields {
    pub time_entry_id: Option<i64>,
    pub project_id: i64,
    pub issue_id: i64,
    pub activity_id: i64,
    pub last_update: NaiveDateTime,
}

/// Store remote references on the appointment. A missing time entry id
/// leaves any existing one untouched.
pub fn update_fields(appt: &mut Appointment, fields: &RemoteFields, issue_ids: &IssueIdCache) {
    if fields.time_entry_id.is_some() {
        appt.set_time_entry_id(fields.time_entry_id);
    }
    appt.set_project_id(Some(fields.project_id));
    issue_ids.set_issue_id(appt, Some(fields.issue_id));
    appt.set_activity_id(Some(fields.activity_id));
    appt.set_modification_date(fields.last_update);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FIELD_TIME_ENTRY_ID;
    use chrono::NaiveDate;

    #[test]
    fn test_missing_record_is_a_no_op() {
        assert_eq!(custom_id(None, FIELD_TIME_ENTRY_ID), None);
        set_custom_id(None, FIELD_TIME_ENTRY_ID, Some(1));
    }

    #[test]
    fn test_update_fields_keeps_existing_time_entry_id() {
        let at = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let mut appt = Appointment::new("Work", at, at);
        appt.entry_id = "e1".into();
        appt.set_time_entry_id(Some(99));

        let cache = IssueIdCache::default();
        update_fields(
            &mut appt,
            &RemoteFields {
                time_entry_id: None,
                project_id: 3,
                issue_id: 4,
                activity_id: 5,
                last_update: at,
            },
            &cache,
        );

        assert_eq!(appt.time_entry_id(), Some(99));
        assert_eq!(appt.project_id(), Some(3));
        assert_eq!(cache.issue_id(&appt), Some(4));
        assert_eq!(appt.activity_id(), Some(5));
        assert_eq!(appt.modification_date(), Some(at));
    }
}
