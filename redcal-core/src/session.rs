//! A connected session: tracker handle, current user and downloaded data.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Local};
use tracing::{error, info, warn};

use crate::cache::{LocalCache, RemoteCache, merge_issues, new_projects};
use crate::config::Settings;
use crate::constants::ISSUE_SYNC_BACKDATE_DAYS;
use crate::error::{RedcalError, RedcalResult};
use crate::observer::SyncObserver;
use crate::remote::{ActivityInfo, IssueInfo, ProjectInfo, Query, TimeTracker, UserInfo};

pub struct Session {
    pub tracker: Arc<dyn TimeTracker>,
    pub user: UserInfo,
    pub cache: RemoteCache,
}

impl Session {
    /// Connect and download activities, projects and issues, in that order.
    ///
    /// Issues depend on projects: a project not seen before gets all of its
    /// issues downloaded, not only recently updated ones.
    pub async fn connect(
        tracker: Arc<dyn TimeTracker>,
        settings: &mut Settings,
        local: &LocalCache,
        observer: &dyn SyncObserver,
    ) -> RedcalResult<Session> {
        if settings.api_key.trim().is_empty() {
            return Err(RedcalError::Config(
                "No API key configured, cannot connect to Redmine".into(),
            ));
        }

        observer.status("Connecting...");
        let user = tracker.current_user().await?;
        info!(user = %user.name, "Connected to Redmine");

        let mut session = Session {
            tracker,
            user,
            cache: RemoteCache::default(),
        };

        session.download_activities().await?;

        observer.status("Loading projects...");
        let new_projects = session.download_projects(local, observer).await?;

        observer.status("Loading issues...");
        session
            .download_issues(&new_projects, settings, local, observer)
            .await;

        session.cache.last_used_issues = session
            .cache
            .resolve_issues(&settings.last_used_issue_ids());
        session.cache.favorite_issues = session
            .cache
            .resolve_issues(&settings.favorite_issue_ids());
        session.trim_last_used_issues(settings);

        Ok(session)
    }

    pub async fn download_activities(&mut self) -> RedcalResult<()> {
        let query = Query {
            use_limit: true,
            ..Default::default()
        };
        let activities = self.tracker.activities(&query).await?;
        self.cache.set_activities(activities);
        Ok(())
    }

    /// Fetch all projects and return those missing from the persisted list.
    /// The persisted list is replaced by the fresh one either way.
    pub async fn download_projects(
        &mut self,
        local: &LocalCache,
        observer: &dyn SyncObserver,
    ) -> RedcalResult<Vec<ProjectInfo>> {
        let progress = |current: usize, total: usize| {
            observer.status(&format!(
                "Loading projects ({}/{})",
                current.min(total),
                total
            ));
        };
        let projects = self
            .tracker
            .projects(&Query::default(), &progress)
            .await?;

        let known = local.known_projects();
        let fresh = new_projects(&projects, &known);

        if let Err(e) = local.write_known_projects(&projects) {
            error!(error = %e, "Could not persist known projects");
        }

        self.cache.set_projects(projects);
        Ok(fresh)
    }

    /// Every issue of each new project, regardless of when it was last updated.
    /// A project that fails to load is logged and skipped.
    pub async fn download_all_issues_for_new_projects(
        &self,
        new_projects: &[ProjectInfo],
        observer: &dyn SyncObserver,
    ) -> HashMap<i64, IssueInfo> {
        let mut lists = Vec::new();

        for project in new_projects {
            let progress = |current: usize, total: usize| {
                observer.status(&format!(
                    "Loading issues for new project {} ({}/{})",
                    project.name,
                    current.min(total),
                    total
                ));
            };

            match self
                .tracker
                .all_issues(&Query::project_issues(project.id), &progress)
                .await
            {
                Ok(issues) => lists.push(issues),
                Err(e) => error!(project = %project.name, error = %e, "Error while loading project issues"),
            }
        }

        merge_issues(lists)
    }

    /// Incremental issue download.
    ///
    /// Fetches issues updated since two days before the last sync, unions them
    /// with the persisted issues and the full backfill for new projects, and
    /// persists the result. The sync date only advances when both the fetch
    /// and the write succeeded, so a failure retries the same window.
    pub async fn download_issues(
        &mut self,
        new_projects: &[ProjectInfo],
        settings: &mut Settings,
        local: &LocalCache,
        observer: &dyn SyncObserver,
    ) {
        let known = local.known_issues();

        let mut query = Query {
            use_limit: true,
            any_status: true,
            ..Default::default()
        };
        if !known.is_empty() {
            query.updated_since = settings
                .last_issue_sync_date
                .map(|d| d - Duration::days(ISSUE_SYNC_BACKDATE_DAYS));
        }

        observer.status("Loading issues");
        let (fetched, fetch_ok) = match self.tracker.issues(&query).await {
            Ok(issues) => (issues, true),
            Err(e) => {
                error!(error = %e, "Error while loading updated issues");
                (vec![], false)
            }
        };

        let backfill = self
            .download_all_issues_for_new_projects(new_projects, observer)
            .await;

        // Fresh data first so it wins over the persisted copy
        self.cache.issues = merge_issues([fetched, known, backfill.into_values().collect()]);

        let mut issues: Vec<IssueInfo> = self.cache.issues.values().cloned().collect();
        issues.sort_by_key(|i| i.id);

        match local.write_known_issues(&issues) {
            Ok(()) if fetch_ok => {
                settings.last_issue_sync_date = Some(Local::now().date_naive());
                if let Err(e) = settings.save() {
                    error!(error = %e, "Could not save last issue sync date");
                }
            }
            Ok(()) => warn!("Issue fetch failed, keeping last issue sync date"),
            Err(e) => error!(error = %e, "Could not persist known issues"),
        }
    }

    pub fn default_activity(&self) -> Option<&ActivityInfo> {
        self.cache.default_activity()
    }

    /// Look up an issue, fetching it from the tracker if it is not cached.
    ///
    /// `None` means the issue could not be resolved, not that it does not exist.
    pub async fn reload_issue_by_id(&mut self, id: i64, local: &LocalCache) -> Option<IssueInfo> {
        if let Some(issue) = self.cache.issue(id) {
            return Some(issue.clone());
        }

        let issue = match self.tracker.issues(&Query::issue(id)).await {
            Ok(issues) => issues.into_iter().find(|i| i.id == id)?,
            Err(e) => {
                error!(issue_id = id, error = %e, "Error while reloading issue");
                return None;
            }
        };

        self.cache.issues.insert(id, issue.clone());

        let mut issues: Vec<IssueInfo> = self.cache.issues.values().cloned().collect();
        issues.sort_by_key(|i| i.id);
        if let Err(e) = local.write_known_issues(&issues) {
            error!(error = %e, "Could not persist known issues");
        }

        Some(issue)
    }

    /// Cut the last-used list to the configured size, in memory and in settings.
    pub fn trim_last_used_issues(&mut self, settings: &mut Settings) {
        let limit = settings.number_last_used_issues;
        self.cache.last_used_issues.truncate(limit);

        let persisted = settings.last_used_issue_ids();
        if persisted.len() > limit {
            settings.set_last_used_issue_ids(&persisted[..limit]);
            if let Err(e) = settings.save() {
                error!(error = %e, "Could not save last used issues");
            }
        }
    }
}
