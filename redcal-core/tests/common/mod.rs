//! In-memory tracker and fixtures shared by the integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use tokio::sync::Notify;

use redcal_core::remote::Progress;
use redcal_core::{
    ActivityInfo, Appointment, FolderCalendar, IssueInfo, NoopObserver, ProjectInfo, Query,
    RedcalError, RedcalResult, Settings, Synchronizer, TimeEntryInfo, TimeTracker, UserInfo,
};

/// How mutating calls fail while a failure is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Offline,
    Reject,
}

#[derive(Default)]
pub struct FakeState {
    pub activities: Vec<ActivityInfo>,
    pub projects: Vec<ProjectInfo>,
    /// Issues with their last update date.
    pub issues: Vec<(IssueInfo, NaiveDate)>,
    pub entries: BTreeMap<i64, TimeEntryInfo>,
    pub next_id: i64,
    pub calls: Vec<String>,
    pub failure: Option<Failure>,
}

#[derive(Default)]
pub struct FakeTracker {
    pub state: Mutex<FakeState>,
    /// Creates wait for `release` while set.
    pub hold_creates: AtomicBool,
    pub release: Notify,
}

impl FakeTracker {
    pub fn with_defaults() -> Arc<Self> {
        let tracker = FakeTracker::default();
        {
            let mut state = tracker.state.lock().unwrap();
            state.next_id = 1000;
            state.activities = vec![
                activity(8, "Meeting", false),
                activity(9, "Development", true),
            ];
            state.projects = vec![project(1, "Platform"), project(2, "Support")];
            state.issues = vec![
                (issue(11, "Login page", 1), day(2024, 5, 1)),
                (issue(12, "Search", 1), day(2024, 5, 2)),
                (issue(21, "Hotline", 2), day(2024, 5, 2)),
                (issue(42, "Overtime", 2), day(2024, 1, 1)),
            ];
        }
        Arc::new(tracker)
    }

    pub fn set_failure(&self, failure: Option<Failure>) {
        self.state.lock().unwrap().failure = failure;
    }

    pub fn calls(&self, prefix: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn entry(&self, id: i64) -> Option<TimeEntryInfo> {
        self.state.lock().unwrap().entries.get(&id).cloned()
    }

    pub fn entries(&self) -> Vec<TimeEntryInfo> {
        self.state.lock().unwrap().entries.values().cloned().collect()
    }

    pub fn insert_entry(&self, entry: TimeEntryInfo) {
        self.state.lock().unwrap().entries.insert(entry.id, entry);
    }

    fn record(&self, call: String) -> RedcalResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        match state.failure {
            Some(Failure::Offline) => Err(RedcalError::connection("connection refused")),
            Some(Failure::Reject) => Err(RedcalError::Remote("422 Unprocessable Entity".into())),
            None => Ok(()),
        }
    }

    fn filtered_issues(&self, query: &Query) -> Vec<IssueInfo> {
        let state = self.state.lock().unwrap();
        state
            .issues
            .iter()
            .filter(|(i, _)| query.project_id.is_none_or(|p| i.project_id == p))
            .filter(|(i, _)| query.issue_id.is_none_or(|id| i.id == id))
            .filter(|(_, updated)| query.updated_since.is_none_or(|since| *updated >= since))
            .map(|(i, _)| i.clone())
            .collect()
    }
}

#[async_trait]
impl TimeTracker for FakeTracker {
    async fn current_user(&self) -> RedcalResult<UserInfo> {
        Ok(UserInfo {
            id: 5,
            name: "Jordan Doe".into(),
        })
    }

    async fn activities(&self, _query: &Query) -> RedcalResult<Vec<ActivityInfo>> {
        Ok(self.state.lock().unwrap().activities.clone())
    }

    async fn projects(
        &self,
        _query: &Query,
        progress: Progress<'_>,
    ) -> RedcalResult<Vec<ProjectInfo>> {
        let projects = self.state.lock().unwrap().projects.clone();
        progress(projects.len(), projects.len());
        Ok(projects)
    }

    async fn issues(&self, query: &Query) -> RedcalResult<Vec<IssueInfo>> {
        self.state
            .lock()
            .unwrap()
            .calls
            .push(format!("issues {:?}", query.updated_since));
        Ok(self.filtered_issues(query))
    }

    async fn all_issues(
        &self,
        query: &Query,
        progress: Progress<'_>,
    ) -> RedcalResult<Vec<IssueInfo>> {
        let issues = self.filtered_issues(query);
        progress(issues.len(), issues.len());
        Ok(issues)
    }

    async fn time_entries(
        &self,
        query: &Query,
        progress: Progress<'_>,
    ) -> RedcalResult<Vec<TimeEntryInfo>> {
        let entries: Vec<TimeEntryInfo> = self
            .entries()
            .into_iter()
            .filter(|e| {
                query
                    .spent_between
                    .is_none_or(|(from, to)| (from..=to).contains(&e.start.date()))
            })
            .collect();
        progress(entries.len(), entries.len());
        Ok(entries)
    }

    async fn create_time_entry(&self, entry: &TimeEntryInfo) -> RedcalResult<TimeEntryInfo> {
        if self.hold_creates.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        self.record(format!("create {}", entry.name))?;

        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let mut created = entry.clone();
        created.id = state.next_id;
        created.updated = at(2024, 5, 6, 18, 0);
        state.entries.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_time_entry(&self, entry: &TimeEntryInfo) -> RedcalResult<TimeEntryInfo> {
        self.record(format!("update {}", entry.id))?;

        let mut state = self.state.lock().unwrap();
        if !state.entries.contains_key(&entry.id) {
            return Err(RedcalError::Remote(format!("404 time entry {}", entry.id)));
        }
        let mut updated = entry.clone();
        updated.updated = at(2024, 5, 6, 18, 30);
        state.entries.insert(updated.id, updated.clone());
        Ok(updated)
    }

    async fn delete_time_entry(&self, id: i64) -> RedcalResult<()> {
        self.record(format!("delete {}", id))?;
        self.state.lock().unwrap().entries.remove(&id);
        Ok(())
    }
}

pub struct Fixture {
    pub tracker: Arc<FakeTracker>,
    pub calendar: Arc<FolderCalendar>,
    pub sync: Arc<Synchronizer>,
    pub dir: tempfile::TempDir,
}

impl Fixture {
    pub fn new(tracker: Arc<FakeTracker>) -> Self {
        Self::with_settings(tracker, |_| {})
    }

    pub fn with_settings(tracker: Arc<FakeTracker>, configure: impl FnOnce(&mut Settings)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let calendar = Arc::new(FolderCalendar::open(dir.path().join("calendar")).unwrap());

        let mut settings = Settings::default();
        settings.redmine_url = "https://redmine.example.com/".into();
        settings.api_key = "secret".into();
        settings.cache_dir = Some(dir.path().join("cache"));
        configure(&mut settings);

        let sync = Synchronizer::new(
            settings,
            tracker.clone(),
            calendar.clone(),
            Arc::new(NoopObserver),
        )
        .unwrap();

        Fixture {
            tracker,
            calendar,
            sync: Arc::new(sync),
            dir,
        }
    }

    pub fn cache_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("cache")
    }

    pub async fn connected(tracker: Arc<FakeTracker>) -> Self {
        let fixture = Self::new(tracker);
        fixture.sync.connect().wait().await.unwrap();
        fixture
    }
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    day(y, m, d).and_hms_opt(h, min, 0).unwrap()
}

pub fn activity(id: i64, name: &str, is_default: bool) -> ActivityInfo {
    ActivityInfo {
        id,
        name: name.into(),
        is_default,
    }
}

pub fn project(id: i64, name: &str) -> ProjectInfo {
    ProjectInfo {
        id,
        name: name.into(),
    }
}

pub fn issue(id: i64, name: &str, project_id: i64) -> IssueInfo {
    IssueInfo {
        id,
        name: name.into(),
        project_id,
    }
}

/// A remote entry on issue 11 with the given end time and hours.
pub fn remote_entry(id: i64, start: NaiveDateTime, end: NaiveDateTime, hours: f64) -> TimeEntryInfo {
    TimeEntryInfo {
        id,
        start,
        end,
        hours,
        name: format!("Remote {}", id),
        updated: at(2024, 5, 6, 20, 0),
        issue: issue(11, "", 1),
        project: project(1, "Platform"),
        activity: activity(9, "Development", true),
    }
}

/// A stored appointment.
pub fn add_appointment(
    calendar: &FolderCalendar,
    subject: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Appointment {
    use redcal_core::CalendarStore;
    calendar
        .add(Appointment::new(subject, start, end))
        .unwrap()
}
