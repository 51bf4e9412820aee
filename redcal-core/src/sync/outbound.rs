//! Pushing local changes to the tracker.

use std::sync::atomic::Ordering;

use tracing::{error, info, warn};

use crate::appointment::Appointment;
use crate::appointment::tags::{RemoteFields, update_fields};
use crate::constants::NOTE_ISSUE_UNRESOLVED;
use crate::error::{RedcalError, RedcalResult};
use crate::remote::{ActivityInfo, IssueInfo, ProjectInfo, TimeEntryInfo};
use crate::session::Session;
use crate::sync::guess::guess_issue_id;
use crate::sync::report::{SaveOutcome, SaveReport};
use crate::sync::Synchronizer;
use crate::sync_state::{PendingChange, SyncState};

impl Synchronizer {
    /// Push a batch of appointments, one at a time.
    ///
    /// Failures are recorded on the affected appointment and collected in the
    /// report; the batch always runs to the end.
    pub async fn save_time_entries(
        &self,
        appointments: Vec<Appointment>,
    ) -> RedcalResult<SaveReport> {
        let overtime = self.settings.lock().await.overtime_issue_id;

        let mut guard = self.session.lock().await;
        let session = guard.as_mut().ok_or(RedcalError::NotConnected)?;

        let total = appointments.len();
        let mut report = SaveReport::default();

        for (index, mut appt) in appointments.into_iter().enumerate() {
            self.observer
                .status(&format!("Saving {} of {}", index + 1, total));

            match self.save_record(session, &mut appt, overtime).await {
                Ok(SaveOutcome::Unresolved) => {
                    report.outcomes.push(SaveOutcome::Unresolved);
                    report
                        .errors
                        .push(format!("{}: {}", appt, NOTE_ISSUE_UNRESOLVED));
                }
                Ok(outcome) => report.outcomes.push(outcome),
                Err(RedcalError::Connection {
                    message,
                    previous_state,
                }) => {
                    warn!(appointment = %appt, %message, "Connection lost while saving");
                    if let Some(state) = previous_state {
                        appt.restore_state(state);
                    }
                    if let Err(e) = self.calendar.save(&appt) {
                        error!(appointment = %appt, error = %e, "Could not save appointment");
                    }
                    report.failed += 1;
                    report.errors.push(format!(
                        "{}: could not be synchronized, Redmine is not reachable ({})",
                        appt, message
                    ));
                }
                Err(e) => {
                    error!(appointment = %appt, error = %e, "Error while saving time entry");
                    appt.append_to_body(&e.to_string());
                    appt.set_state(SyncState::SyncError);
                    if let Err(e) = self.calendar.save(&appt) {
                        error!(appointment = %appt, error = %e, "Could not save appointment");
                    }
                    report.failed += 1;
                    report.errors.push(format!("{}: {}", appt, e));
                }
            }

            self.observer.appointment_changed();
        }

        if !report.errors.is_empty() {
            self.observer.errors(&report.errors);
        }

        let (created, updated, deleted) = report.push_counts();
        info!(created, updated, deleted, failed = report.failed, "Saved time entries");

        Ok(report)
    }

    /// Push a single appointment.
    pub async fn save_time_entry(&self, appt: &mut Appointment) -> RedcalResult<SaveOutcome> {
        let overtime = self.settings.lock().await.overtime_issue_id;

        let mut guard = self.session.lock().await;
        let session = guard.as_mut().ok_or(RedcalError::NotConnected)?;

        self.push_change(session, appt, overtime).await
    }

    /// Build the time entry an appointment would be pushed as.
    ///
    /// `None` means the entry cannot be built yet. An unresolvable issue also
    /// moves the appointment to `SyncError`.
    pub async fn create_time_entry_from_appointment(
        &self,
        appt: &mut Appointment,
    ) -> RedcalResult<Option<TimeEntryInfo>> {
        let mut guard = self.session.lock().await;
        let session = guard.as_mut().ok_or(RedcalError::NotConnected)?;

        self.build_time_entry(session, appt).await
    }

    async fn save_record(
        &self,
        session: &mut Session,
        appt: &mut Appointment,
        overtime: Option<i64>,
    ) -> RedcalResult<SaveOutcome> {
        // Retry what failed last time
        if appt.is_sync_error_set() && appt.reset_previous_state().is_some() {
            self.calendar.save(appt)?;
        }

        self.push_change(session, appt, overtime).await
    }

    async fn push_change(
        &self,
        session: &mut Session,
        appt: &mut Appointment,
        overtime: Option<i64>,
    ) -> RedcalResult<SaveOutcome> {
        match appt.pending_change() {
            Some(PendingChange::Modified) => {
                let outcome = if appt.has_remote_entry() && !appt.is_copied() {
                    self.update_in_tracker(session, appt, overtime).await
                } else {
                    self.create_in_tracker(session, appt, overtime).await
                };
                outcome.map_err(|e| e.with_previous_state(SyncState::Modified))
            }
            Some(PendingChange::Deleted) => self
                .delete_in_tracker(session, appt)
                .await
                .map_err(|e| e.with_previous_state(SyncState::Deleted)),
            None => {
                warn!(
                    appointment = %appt,
                    state = ?appt.state(),
                    "Appointment has no pending change, not saving"
                );
                Ok(SaveOutcome::Skipped)
            }
        }
    }

    async fn create_in_tracker(
        &self,
        session: &mut Session,
        appt: &mut Appointment,
        overtime: Option<i64>,
    ) -> RedcalResult<SaveOutcome> {
        let Some(mut entry) = self.build_time_entry(session, appt).await? else {
            return Ok(not_built(appt));
        };

        // A copy carries the original's remote id; it becomes a new entry
        if !entry.is_placeholder() {
            entry.id = self.placeholder_id();
        }

        let created = session.tracker.create_time_entry(&entry).await?;
        info!(id = created.id, appointment = %appt, "Created time entry");

        self.write_back(appt, &created, overtime);
        appt.mark_as_not_copied();
        self.calendar.save(appt)?;

        Ok(SaveOutcome::Created)
    }

    async fn update_in_tracker(
        &self,
        session: &mut Session,
        appt: &mut Appointment,
        overtime: Option<i64>,
    ) -> RedcalResult<SaveOutcome> {
        let Some(entry) = self.build_time_entry(session, appt).await? else {
            return Ok(not_built(appt));
        };

        let updated = session.tracker.update_time_entry(&entry).await?;
        info!(id = updated.id, appointment = %appt, "Updated time entry");

        self.write_back(appt, &updated, overtime);
        self.calendar.save(appt)?;

        Ok(SaveOutcome::Updated)
    }

    /// Remove the remote entry, then the local item.
    ///
    /// A copy only carries the original's entry id, so only the local item goes.
    async fn delete_in_tracker(
        &self,
        session: &mut Session,
        appt: &mut Appointment,
    ) -> RedcalResult<SaveOutcome> {
        if let Some(id) = appt
            .time_entry_id()
            .filter(|id| *id > 0 && !appt.is_copied())
        {
            session.tracker.delete_time_entry(id).await?;
            info!(id, appointment = %appt, "Deleted time entry");
        }

        appt.set_time_entry_id(None);
        self.delete_local(appt)?;

        Ok(SaveOutcome::Deleted)
    }

    fn write_back(&self, appt: &mut Appointment, entry: &TimeEntryInfo, overtime: Option<i64>) {
        update_fields(
            appt,
            &RemoteFields {
                time_entry_id: Some(entry.id),
                project_id: entry.project.id,
                issue_id: entry.issue.id,
                activity_id: entry.activity.id,
                last_update: entry.updated,
            },
            &self.issue_ids,
        );
        appt.set_state(SyncState::synchronized_for(entry.issue.id, overtime));
    }

    async fn build_time_entry(
        &self,
        session: &mut Session,
        appt: &mut Appointment,
    ) -> RedcalResult<Option<TimeEntryInfo>> {
        let activity = self.resolve_activity(session, appt)?;
        let Some(issue) = self.resolve_issue(session, appt).await? else {
            return Ok(None);
        };
        let project = self.resolve_project(session, appt, &issue)?;

        let (Some(activity), Some(project)) = (activity, project) else {
            return Ok(None);
        };

        let id = appt
            .time_entry_id()
            .filter(|id| *id > 0)
            .unwrap_or_else(|| self.placeholder_id());

        Ok(Some(TimeEntryInfo {
            id,
            start: appt.start,
            end: appt.end,
            hours: TimeEntryInfo::hours_between(appt.start, appt.end),
            name: appt.subject.clone(),
            updated: appt.modification_date().unwrap_or(appt.start),
            issue,
            project,
            activity,
        }))
    }

    fn resolve_activity(
        &self,
        session: &Session,
        appt: &mut Appointment,
    ) -> RedcalResult<Option<ActivityInfo>> {
        let id = match appt.activity_id() {
            Some(id) => id,
            None => {
                let Some(default) = session.default_activity() else {
                    error!(appointment = %appt, "No activities available");
                    return Ok(None);
                };
                appt.set_activity_id(Some(default.id));
                self.calendar.save(appt)?;
                default.id
            }
        };

        let activity = session.cache.activity(id).cloned();
        if activity.is_none() {
            error!(activity_id = id, appointment = %appt, "Unknown activity");
        }
        Ok(activity)
    }

    async fn resolve_issue(
        &self,
        session: &mut Session,
        appt: &mut Appointment,
    ) -> RedcalResult<Option<IssueInfo>> {
        let (id, guessed) = match self.issue_ids.issue_id(appt) {
            Some(id) => (Some(id), false),
            None => (guess_issue_id(&appt.subject), true),
        };

        let issue = match id {
            Some(id) => session.reload_issue_by_id(id, &self.local).await,
            None => None,
        };

        match issue {
            Some(issue) => {
                if guessed {
                    info!(issue_id = issue.id, appointment = %appt, "Issue taken from subject");
                    self.issue_ids.set_issue_id(appt, Some(issue.id));
                    self.calendar.save(appt)?;
                }
                Ok(Some(issue))
            }
            None => {
                warn!(issue_id = ?id, appointment = %appt, "Issue could not be determined");
                appt.append_to_body(NOTE_ISSUE_UNRESOLVED);
                appt.set_state(SyncState::SyncError);
                self.calendar.save(appt)?;
                Ok(None)
            }
        }
    }

    fn resolve_project(
        &self,
        session: &Session,
        appt: &mut Appointment,
        issue: &IssueInfo,
    ) -> RedcalResult<Option<ProjectInfo>> {
        let id = match appt.project_id() {
            Some(id) => id,
            None => {
                appt.set_project_id(Some(issue.project_id));
                self.calendar.save(appt)?;
                issue.project_id
            }
        };

        let project = session.cache.project(id).cloned();
        if project.is_none() {
            error!(project_id = id, appointment = %appt, "Unknown project");
        }
        Ok(project)
    }

    fn placeholder_id(&self) -> i64 {
        -self.next_placeholder.fetch_add(1, Ordering::Relaxed)
    }
}

fn not_built(appt: &Appointment) -> SaveOutcome {
    if appt.is_sync_error_set() {
        SaveOutcome::Unresolved
    } else {
        SaveOutcome::Deferred
    }
}
