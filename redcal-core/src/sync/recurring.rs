//! Booking the same issue on a range of days.

use chrono::{Datelike, Local, NaiveDate, NaiveTime, Weekday};
use tracing::{error, info};

use crate::appointment::Appointment;
use crate::appointment::tags::{RemoteFields, update_fields};
use crate::error::{RedcalError, RedcalResult};
use crate::sync::Synchronizer;
use crate::sync_state::SyncState;

#[derive(Debug, Clone)]
pub struct RecurringRequest {
    pub issue_id: i64,
    pub description: String,
    pub start_date: NaiveDate,
    /// Inclusive.
    pub end_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub include_weekends: bool,
}

impl RecurringRequest {
    /// Days that get an appointment.
    pub fn days(&self) -> Vec<NaiveDate> {
        self.start_date
            .iter_days()
            .take_while(|d| *d <= self.end_date)
            .filter(|d| self.include_weekends || is_workday(*d))
            .collect()
    }
}

fn is_workday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

impl Synchronizer {
    /// Create one `Modified` appointment per requested day.
    ///
    /// Days that fail are logged and skipped; the created appointments are returned.
    pub async fn create_recurring_time_entries(
        &self,
        request: &RecurringRequest,
    ) -> RedcalResult<Vec<Appointment>> {
        let (issue, project, activity) = {
            let mut guard = self.session.lock().await;
            let session = guard.as_mut().ok_or(RedcalError::NotConnected)?;

            let issue = session
                .reload_issue_by_id(request.issue_id, &self.local)
                .await
                .ok_or_else(|| RedcalError::Resolution(format!("issue #{}", request.issue_id)))?;
            let project = session
                .cache
                .project(issue.project_id)
                .cloned()
                .ok_or_else(|| RedcalError::Resolution(format!("project {}", issue.project_id)))?;
            let activity = session
                .default_activity()
                .cloned()
                .ok_or_else(|| RedcalError::Resolution("default activity".into()))?;

            (issue, project, activity)
        };

        let mut created = Vec::new();

        for day in request.days() {
            let mut appt = Appointment::new(
                &request.description,
                day.and_time(request.start_time),
                day.and_time(request.end_time),
            );
            appt.set_imported(false);
            appt.set_location_for_issue(issue.id, Some(&issue));

            let stored = self.calendar.add(appt).and_then(|mut appt| {
                update_fields(
                    &mut appt,
                    &RemoteFields {
                        time_entry_id: None,
                        project_id: project.id,
                        issue_id: issue.id,
                        activity_id: activity.id,
                        last_update: Local::now().naive_local(),
                    },
                    &self.issue_ids,
                );
                appt.set_state(SyncState::Modified);
                appt.mark_as_not_copied();
                self.calendar.save(&appt)?;
                Ok(appt)
            });

            match stored {
                Ok(appt) => {
                    self.registrar.register(&appt);
                    created.push(appt);
                }
                Err(e) => error!(%day, error = %e, "Could not create recurring appointment"),
            }
        }

        info!(count = created.len(), issue_id = issue.id, "Created recurring appointments");
        self.observer.appointment_changed();

        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(include_weekends: bool) -> RecurringRequest {
        RecurringRequest {
            issue_id: 1,
            description: "Standup".into(),
            // Friday to Tuesday
            start_date: NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 5, 7).unwrap(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(9, 15, 0).unwrap(),
            include_weekends,
        }
    }

    #[test]
    fn test_weekends_are_skipped_by_default() {
        let days: Vec<u32> = request(false).days().iter().map(|d| d.day()).collect();
        assert_eq!(days, vec![3, 6, 7]);
    }

    #[test]
    fn test_weekends_on_request() {
        assert_eq!(request(true).days().len(), 5);
    }
}
