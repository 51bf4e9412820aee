//! Resetting a date window to the tracker's time entries.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveTime};
use tracing::{info, warn};

use crate::appointment::tags::{RemoteFields, update_fields};
use crate::appointment::{Appointment, IssueIdCache};
use crate::constants::NOTE_END_TIME_ADJUSTED;
use crate::error::{RedcalError, RedcalResult};
use crate::remote::{IssueInfo, Query, TimeEntryInfo};
use crate::sync::Synchronizer;
use crate::sync::report::ResetReport;
use crate::sync_state::SyncState;

impl Synchronizer {
    /// Make the local calendar match the tracker for `from..=to`.
    ///
    /// Local items without a remote entry (or copies) are dropped, items with
    /// a remote entry take its values, items whose entry is gone are removed
    /// and remote entries without a local item are imported.
    pub async fn reset_time_entries(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RedcalResult<ResetReport> {
        let overtime = self.settings.lock().await.overtime_issue_id;

        let mut guard = self.session.lock().await;
        let session = guard.as_mut().ok_or(RedcalError::NotConnected)?;

        let query = Query {
            spent_between: Some((from, to)),
            use_limit: true,
            ..Default::default()
        };
        let progress = |current: usize, total: usize| {
            self.observer.status(&format!(
                "Loading time entries ({}/{})",
                current.min(total),
                total
            ));
        };
        let mut remaining: BTreeMap<i64, TimeEntryInfo> = session
            .tracker
            .time_entries(&query, &progress)
            .await?
            .into_iter()
            .map(|e| (e.id, e))
            .collect();

        let window_start = from.and_time(NaiveTime::MIN);
        let window_end = to.and_time(NaiveTime::MIN) + Duration::days(1) - Duration::seconds(1);
        let locals = self
            .calendar
            .appointments_in_range(window_start, window_end)?;

        let mut report = ResetReport::default();

        for mut appt in locals {
            let remote_id = appt.time_entry_id().filter(|_| !appt.is_copied());

            let Some(remote_id) = remote_id else {
                appt.set_time_entry_id(None);
                self.calendar.save(&appt)?;
                self.delete_local(&mut appt)?;
                report.discarded += 1;
                continue;
            };

            match remaining.remove(&remote_id) {
                Some(entry) => {
                    if appt.differs_from(&entry, self.issue_ids.issue_id(&appt), overtime) {
                        let issue = session.cache.issue(entry.issue.id).cloned();
                        apply_time_entry(
                            &mut appt,
                            &entry,
                            issue.as_ref(),
                            overtime,
                            &self.issue_ids,
                        );
                        report.updated += 1;
                    } else {
                        appt.set_state(SyncState::synchronized_for(entry.issue.id, overtime));
                        report.unchanged += 1;
                    }
                    self.calendar.save(&appt)?;
                }
                None => {
                    // Gone upstream; clear the id so the delete is not intercepted
                    appt.set_time_entry_id(None);
                    self.delete_local(&mut appt)?;
                    report.removed += 1;
                }
            }

            self.observer.appointment_changed();
        }

        for entry in remaining.into_values() {
            let mut appt = Appointment::new(&entry.name, entry.start, entry.end);
            appt.set_imported(true);

            let issue = session.cache.issue(entry.issue.id).cloned();
            apply_time_entry(&mut appt, &entry, issue.as_ref(), overtime, &self.issue_ids);

            let mut appt = self.calendar.add(appt)?;
            // The id cache only keys stored items
            self.issue_ids.set_issue_id(&mut appt, Some(entry.issue.id));
            appt.mark_as_not_copied();
            self.calendar.save(&appt)?;
            self.registrar.register(&appt);

            report.imported += 1;
            self.observer.appointment_changed();
        }

        info!(
            %from,
            %to,
            updated = report.updated,
            imported = report.imported,
            removed = report.removed,
            discarded = report.discarded,
            "Reset time entries"
        );

        Ok(report)
    }
}

/// Overwrite an appointment with a remote time entry and mark it synchronized.
///
/// The end time normally follows the entry's hours. If that is more than a few
/// minutes off the entry's own end time, the end time is kept and a note is
/// added. Entries on the overtime issue always keep their end time.
pub fn apply_time_entry(
    appt: &mut Appointment,
    entry: &TimeEntryInfo,
    issue: Option<&IssueInfo>,
    overtime_issue_id: Option<i64>,
    issue_ids: &IssueIdCache,
) {
    appt.subject = entry.name.clone();
    appt.start = entry.start;

    appt.end = entry.local_end(overtime_issue_id);
    if overtime_issue_id != Some(entry.issue.id) && entry.end_drifts() {
        warn!(
            id = entry.id,
            end = %entry.end,
            implied_end = %entry.implied_end(),
            "Hours do not match the end time, keeping the end time"
        );
        appt.append_to_body(NOTE_END_TIME_ADJUSTED);
    }

    let issue = issue.or(Some(&entry.issue)).filter(|i| !i.name.is_empty());
    appt.set_location_for_issue(entry.issue.id, issue);

    update_fields(
        appt,
        &RemoteFields {
            time_entry_id: Some(entry.id),
            project_id: entry.project.id,
            issue_id: entry.issue.id,
            activity_id: entry.activity.id,
            last_update: entry.updated,
        },
        issue_ids,
    );
    appt.set_state(SyncState::synchronized_for(entry.issue.id, overtime_issue_id));
}
