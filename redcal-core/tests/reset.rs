mod common;

use common::*;
use redcal_core::constants::{FIELD_ISSUE_ID, NOTE_END_TIME_ADJUSTED};
use redcal_core::{CalendarStore, RecurringRequest, RedcalError, SyncState};

#[tokio::test]
async fn test_reset_reconciles_window() {
    let f = Fixture::connected(FakeTracker::with_defaults()).await;
    let monday = day(2024, 5, 6);

    f.tracker
        .insert_entry(remote_entry(500, at(2024, 5, 6, 9, 0), at(2024, 5, 6, 11, 0), 2.0));
    f.tracker
        .insert_entry(remote_entry(501, at(2024, 5, 6, 13, 0), at(2024, 5, 6, 14, 0), 1.0));
    // Outside the window
    f.tracker
        .insert_entry(remote_entry(502, at(2024, 5, 8, 9, 0), at(2024, 5, 8, 10, 0), 1.0));

    // Mirrors 500 but was edited locally
    let mut edited = add_appointment(&f.calendar, "Edited", at(2024, 5, 6, 9, 0), at(2024, 5, 6, 11, 0));
    edited.set_time_entry_id(Some(500));
    edited.mark_as_not_copied();
    edited.set_state(SyncState::Modified);
    f.calendar.save(&edited).unwrap();

    // Never pushed
    let mut draft = add_appointment(&f.calendar, "Draft", at(2024, 5, 6, 15, 0), at(2024, 5, 6, 16, 0));
    draft.set_state(SyncState::Modified);
    f.calendar.save(&draft).unwrap();

    // Remote entry deleted upstream
    let mut gone = add_appointment(&f.calendar, "Gone", at(2024, 5, 6, 17, 0), at(2024, 5, 6, 18, 0));
    gone.set_time_entry_id(Some(777));
    gone.mark_as_not_copied();
    gone.set_state(SyncState::Synchronized);
    f.calendar.save(&gone).unwrap();

    let report = f.sync.revert(monday, monday).unwrap().wait().await.unwrap();

    assert_eq!(report.updated, 1);
    assert_eq!(report.imported, 1);
    assert_eq!(report.discarded, 1);
    assert_eq!(report.removed, 1);
    assert_eq!(f.tracker.calls("delete"), 0);

    let edited = f.calendar.get(&edited.entry_id).unwrap().unwrap();
    assert_eq!(edited.subject, "Remote 500");
    assert!(edited.is_synchronized_set());
    assert_eq!(edited.location, "#11 - Login page");

    assert!(f.calendar.get(&draft.entry_id).unwrap().is_none());
    assert!(f.calendar.get(&gone.entry_id).unwrap().is_none());

    let imported: Vec<_> = f
        .calendar
        .appointments()
        .unwrap()
        .into_iter()
        .filter(|a| a.time_entry_id() == Some(501))
        .collect();
    assert_eq!(imported.len(), 1);
    let imported = &imported[0];
    assert!(imported.is_imported());
    assert!(imported.is_synchronized_set());
    assert!(!imported.is_copied());
    assert_eq!(imported.custom_id(FIELD_ISSUE_ID), Some(11));
    assert!(f.sync.registrar().is_registered(&imported.entry_id));

    // Nothing left to push after a revert
    assert!(f.sync.modified_appointments().unwrap().is_empty());
}

#[tokio::test]
async fn test_end_time_tolerance() {
    let f = Fixture::connected(FakeTracker::with_defaults()).await;
    let monday = day(2024, 5, 6);

    // 1h recorded, end time 6 minutes later
    f.tracker
        .insert_entry(remote_entry(600, at(2024, 5, 6, 9, 0), at(2024, 5, 6, 10, 6), 1.0));
    // 1h recorded, end time 4 minutes later
    f.tracker
        .insert_entry(remote_entry(601, at(2024, 5, 6, 13, 0), at(2024, 5, 6, 14, 4), 1.0));

    f.sync.revert(monday, monday).unwrap().wait().await.unwrap();

    let by_id = |id: i64| {
        f.calendar
            .appointments()
            .unwrap()
            .into_iter()
            .find(|a| a.time_entry_id() == Some(id))
            .unwrap()
    };

    let drifted = by_id(600);
    assert_eq!(drifted.end, at(2024, 5, 6, 10, 6));
    assert!(drifted.body.contains(NOTE_END_TIME_ADJUSTED));

    let close = by_id(601);
    assert_eq!(close.end, at(2024, 5, 6, 14, 0));
    assert!(!close.body.contains(NOTE_END_TIME_ADJUSTED));

    // Reverting again finds nothing to change
    let report = f.sync.revert(monday, monday).unwrap().wait().await.unwrap();
    assert_eq!(report.updated, 0);
    assert_eq!(report.unchanged, 2);
    assert_eq!(by_id(601).end, at(2024, 5, 6, 14, 0));
    assert_eq!(by_id(600).body.matches(NOTE_END_TIME_ADJUSTED).count(), 1);
}

#[tokio::test]
async fn test_overtime_entries_keep_end_time() {
    let tracker = FakeTracker::with_defaults();
    let f = Fixture::with_settings(tracker, |s| s.overtime_issue_id = Some(42));
    f.sync.connect().wait().await.unwrap();

    let mut entry = remote_entry(700, at(2024, 5, 6, 17, 0), at(2024, 5, 6, 19, 30), 0.0);
    entry.issue = issue(42, "Overtime", 2);
    entry.project = project(2, "Support");
    f.tracker.insert_entry(entry);

    let monday = day(2024, 5, 6);
    f.sync.revert(monday, monday).unwrap().wait().await.unwrap();

    let appt = f
        .calendar
        .appointments()
        .unwrap()
        .into_iter()
        .find(|a| a.time_entry_id() == Some(700))
        .unwrap();
    assert_eq!(appt.end, at(2024, 5, 6, 19, 30));
    assert!(appt.body.is_empty());
    assert!(appt.is_synchronized_overtime_set());
}

#[tokio::test]
async fn test_revert_requires_connection() {
    let f = Fixture::new(FakeTracker::with_defaults());
    let monday = day(2024, 5, 6);

    let result = f.sync.revert(monday, monday).unwrap().wait().await;
    assert!(matches!(result, Err(RedcalError::NotConnected)));
}

#[tokio::test]
async fn test_revert_window_spans_pending_items() {
    let f = Fixture::new(FakeTracker::with_defaults());
    let today = chrono::Local::now().date_naive();
    assert_eq!(f.sync.revert_window().unwrap(), (today, today));

    for (d, state) in [(3, SyncState::Modified), (9, SyncState::Deleted), (20, SyncState::Synchronized)] {
        let mut appt = add_appointment(&f.calendar, "Work", at(2024, 5, d, 9, 0), at(2024, 5, d, 10, 0));
        appt.set_state(state);
        f.calendar.save(&appt).unwrap();
    }

    assert_eq!(
        f.sync.revert_window().unwrap(),
        (day(2024, 5, 3), day(2024, 5, 9))
    );
}

#[tokio::test]
async fn test_recurring_entries_are_created_on_workdays() {
    let f = Fixture::connected(FakeTracker::with_defaults()).await;

    let request = RecurringRequest {
        issue_id: 21,
        description: "Hotline".into(),
        start_date: day(2024, 5, 3),
        end_date: day(2024, 5, 7),
        start_time: chrono::NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        end_time: chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        include_weekends: false,
    };
    let created = f.sync.create_recurring_time_entries(&request).await.unwrap();

    assert_eq!(created.len(), 3);
    for appt in &created {
        assert!(appt.is_modified_set());
        assert_eq!(appt.project_id(), Some(2));
        assert_eq!(appt.activity_id(), Some(9));
        assert_eq!(appt.location, "#21 - Hotline");
        assert!(f.sync.registrar().is_registered(&appt.entry_id));
    }

    let report = f.sync.save_all().unwrap().wait().await.unwrap();
    assert_eq!(report.push_counts(), (3, 0, 0));
}

#[tokio::test]
async fn test_recurring_entries_need_a_known_issue() {
    let f = Fixture::connected(FakeTracker::with_defaults()).await;

    let request = RecurringRequest {
        issue_id: 999,
        description: "Nothing".into(),
        start_date: day(2024, 5, 6),
        end_date: day(2024, 5, 6),
        start_time: chrono::NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        end_time: chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        include_weekends: false,
    };

    let result = f.sync.create_recurring_time_entries(&request).await;
    assert!(matches!(result, Err(RedcalError::Resolution(_))));
    assert!(f.calendar.appointments().unwrap().is_empty());
}
