//! The synchronizer: owns the session and drives saves and reverts.
//!
//! Host calendar events go through the [`Registrar`]; bulk operations run on
//! background tasks and only one of them may run at a time.

mod guess;
mod inbound;
mod outbound;
mod recurring;
mod report;

pub use guess::guess_issue_id;
pub use inbound::apply_time_entry;
pub use recurring::RecurringRequest;
pub use report::{ResetReport, SaveOutcome, SaveReport};

use std::sync::Arc;
use std::sync::atomic::AtomicI64;

use chrono::{Local, NaiveDate};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::appointment::{Appointment, IssueIdCache};
use crate::cache::{LocalCache, RemoteCache};
use crate::calendar::CalendarStore;
use crate::config::Settings;
use crate::error::{RedcalError, RedcalResult};
use crate::observer::SyncObserver;
use crate::registrar::{ChangedProperty, DeleteDecision, Registrar};
use crate::remote::{TimeTracker, UserInfo};
use crate::session::Session;
use crate::sync_state::SyncState;
use crate::task::{BackgroundTask, SyncGate};

/// A link into the Redmine web UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub url: String,
    pub label: String,
}

pub struct Synchronizer {
    calendar: Arc<dyn CalendarStore>,
    tracker: Arc<dyn TimeTracker>,
    observer: Arc<dyn SyncObserver>,
    local: LocalCache,
    // Never held together with `session`.
    settings: Mutex<Settings>,
    session: Mutex<Option<Session>>,
    registrar: Registrar,
    issue_ids: IssueIdCache,
    gate: Arc<SyncGate>,
    next_placeholder: AtomicI64,
}

impl Synchronizer {
    /// Create the synchronizer and start tracking every appointment already
    /// in the calendar.
    pub fn new(
        settings: Settings,
        tracker: Arc<dyn TimeTracker>,
        calendar: Arc<dyn CalendarStore>,
        observer: Arc<dyn SyncObserver>,
    ) -> RedcalResult<Self> {
        let local = LocalCache::new(settings.cache_path()?);

        let synchronizer = Synchronizer {
            calendar,
            tracker,
            observer,
            local,
            settings: Mutex::new(settings),
            session: Mutex::new(None),
            registrar: Registrar::default(),
            issue_ids: IssueIdCache::default(),
            gate: Arc::new(SyncGate::default()),
            next_placeholder: AtomicI64::new(1),
        };
        synchronizer.register_existing()?;

        Ok(synchronizer)
    }

    fn register_existing(&self) -> RedcalResult<usize> {
        let mut count = 0;
        for appt in self.calendar.appointments()? {
            if self.registrar.register(&appt) {
                count += 1;
            }
        }
        info!(count, "Tracking existing appointments");
        Ok(count)
    }

    pub fn calendar(&self) -> &dyn CalendarStore {
        &*self.calendar
    }

    pub fn registrar(&self) -> &Registrar {
        &self.registrar
    }

    pub fn issue_ids(&self) -> &IssueIdCache {
        &self.issue_ids
    }

    pub async fn settings(&self) -> Settings {
        self.settings.lock().await.clone()
    }

    // CONNECTION:

    /// Connect in the background. Any previous session is dropped first.
    pub fn connect(self: &Arc<Self>) -> BackgroundTask<()> {
        let this = Arc::clone(self);
        BackgroundTask::spawn(async move { this.run_connect().await })
    }

    async fn run_connect(&self) -> RedcalResult<()> {
        self.disconnect().await;

        let connected = {
            let mut settings = self.settings.lock().await;
            Session::connect(
                Arc::clone(&self.tracker),
                &mut settings,
                &self.local,
                &*self.observer,
            )
            .await
        };

        match connected {
            Ok(session) => {
                self.observer
                    .status(&format!("Connected as {}", session.user.name));
                *self.session.lock().await = Some(session);
                self.observer.connection_changed(true);
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Could not connect to Redmine");
                self.observer.status("Not connected");
                self.observer.connection_changed(false);
                Err(e)
            }
        }
    }

    pub async fn disconnect(&self) {
        if self.session.lock().await.take().is_some() {
            info!("Disconnected from Redmine");
        }
        self.observer.connection_changed(false);
    }

    pub async fn is_connected(&self) -> bool {
        self.session.lock().await.is_some()
    }

    pub async fn current_user(&self) -> Option<UserInfo> {
        self.session.lock().await.as_ref().map(|s| s.user.clone())
    }

    /// Run `f` on the downloaded data. `None` while not connected.
    pub async fn with_cache<R>(&self, f: impl FnOnce(&RemoteCache) -> R) -> Option<R> {
        self.session.lock().await.as_ref().map(|s| f(&s.cache))
    }

    // HOST EVENTS:

    pub fn item_added(&self, appt: &mut Appointment) -> RedcalResult<()> {
        self.registrar
            .item_added(appt, &*self.calendar, &self.issue_ids)
    }

    pub fn property_changed(
        &self,
        appt: &mut Appointment,
        property: &ChangedProperty,
    ) -> RedcalResult<()> {
        self.registrar
            .property_changed(appt, property, &*self.calendar, &*self.observer)
    }

    /// Delete an appointment, unless it still has a remote time entry: then it
    /// is marked `Deleted` and removed by the next save.
    pub fn delete_appointment(&self, appt: &mut Appointment) -> RedcalResult<DeleteDecision> {
        let decision = self.registrar.before_delete(appt, &*self.calendar)?;

        if decision == DeleteDecision::Proceed {
            self.calendar.delete(&appt.entry_id)?;
            self.registrar.unregister(&appt.entry_id);
            self.issue_ids.invalidate(&appt.entry_id);
        }

        Ok(decision)
    }

    /// Local delete done by the engine. The remote id must be cleared already.
    fn delete_local(&self, appt: &mut Appointment) -> RedcalResult<()> {
        if self.delete_appointment(appt)? == DeleteDecision::Cancel {
            warn!(appointment = %appt, "Local delete was intercepted, remote id still set");
        }
        Ok(())
    }

    // BULK OPERATIONS:

    pub fn is_syncing(&self) -> bool {
        self.gate.is_running()
    }

    /// Push every pending appointment. `None` if a save or revert is running.
    pub fn save_all(self: &Arc<Self>) -> Option<BackgroundTask<SaveReport>> {
        let Some(guard) = self.gate.try_acquire() else {
            info!("Synchronization already running, save request ignored");
            return None;
        };

        let this = Arc::clone(self);
        Some(BackgroundTask::spawn(async move {
            let _guard = guard;
            this.observer.status("Saving changes...");

            let appointments = this.modified_appointments()?;
            let report = this.save_time_entries(appointments).await;

            this.observer.status("Ready");
            report
        }))
    }

    /// Reset `from..=to` to the tracker's state. `None` if a save or revert is running.
    pub fn revert(
        self: &Arc<Self>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Option<BackgroundTask<ResetReport>> {
        let Some(guard) = self.gate.try_acquire() else {
            info!("Synchronization already running, revert request ignored");
            return None;
        };

        let this = Arc::clone(self);
        Some(BackgroundTask::spawn(async move {
            let _guard = guard;
            this.observer.status("Loading time entries...");

            let result = this.reset_time_entries(from, to).await;
            if let Err(e) = &result {
                error!(%from, %to, error = %e, "Time entries could not be reset");
                this.observer
                    .errors(&[format!("Time entries could not be reset: {}", e)]);
            }

            this.observer.status("Ready");
            result
        }))
    }

    /// Appointments that still need to be pushed, or failed to.
    pub fn modified_appointments(&self) -> RedcalResult<Vec<Appointment>> {
        Ok(self
            .calendar
            .appointments()?
            .into_iter()
            .filter(Appointment::needs_sync)
            .collect())
    }

    /// Default revert window: the days spanned by pending appointments, or today.
    pub fn revert_window(&self) -> RedcalResult<(NaiveDate, NaiveDate)> {
        let pending = self.modified_appointments()?;

        let from = pending.iter().map(|a| a.start.date()).min();
        let to = pending.iter().map(|a| a.end.date()).max();

        match (from, to) {
            (Some(from), Some(to)) => Ok((from, to)),
            _ => {
                let today = Local::now().date_naive();
                Ok((today, today))
            }
        }
    }

    // ISSUES:

    /// Assign an issue to an appointment and mark it `Modified`.
    ///
    /// Returns false when nothing changed: same issue, or the issue is unknown.
    pub async fn update_appointment_issue(
        &self,
        appt: &mut Appointment,
        issue_id: i64,
    ) -> RedcalResult<bool> {
        if self.issue_ids.issue_id(appt) == Some(issue_id) {
            return Ok(false);
        }

        let limit = self.settings.lock().await.number_last_used_issues;

        let last_used = {
            let mut guard = self.session.lock().await;
            let session = guard.as_mut().ok_or(RedcalError::NotConnected)?;

            let Some(issue) = session.reload_issue_by_id(issue_id, &self.local).await else {
                warn!(issue_id, "Unknown issue, appointment left unchanged");
                return Ok(false);
            };

            appt.set_project_id(Some(issue.project_id));
            self.issue_ids.set_issue_id(appt, Some(issue.id));
            appt.set_location_for_issue(issue.id, Some(&issue));
            appt.set_state(SyncState::Modified);
            self.calendar.save(appt)?;

            session.cache.touch_last_used(issue, limit);
            session.cache.last_used_issue_ids()
        };

        let mut settings = self.settings.lock().await;
        settings.set_last_used_issue_ids(&last_used);
        if let Err(e) = settings.save() {
            error!(error = %e, "Could not save last used issues");
        }

        self.observer.appointment_changed();
        Ok(true)
    }

    pub async fn update_favorite_issues(&self, ids: &[i64]) -> RedcalResult<()> {
        {
            let mut settings = self.settings.lock().await;
            settings.set_favorite_issue_ids(ids);
            settings.save()?;
        }

        if let Some(session) = self.session.lock().await.as_mut() {
            session.cache.favorite_issues = session.cache.resolve_issues(ids);
        }
        Ok(())
    }

    pub async fn issue_link(&self, id: i64) -> Link {
        let name = self
            .with_cache(|c| c.issue(id).map(|i| i.to_string()))
            .await
            .flatten();

        Link {
            url: format!("{}/issues/{}", self.base_url().await, id),
            label: name.unwrap_or_else(|| format!("Issue {}", id)),
        }
    }

    pub async fn project_link(&self, id: i64) -> Link {
        let name = self
            .with_cache(|c| c.project(id).map(|p| p.name.clone()))
            .await
            .flatten();

        Link {
            url: format!("{}/projects/{}", self.base_url().await, id),
            label: name.unwrap_or_else(|| format!("Project {}", id)),
        }
    }

    async fn base_url(&self) -> String {
        self.settings.lock().await.connection_url().to_string()
    }
}
