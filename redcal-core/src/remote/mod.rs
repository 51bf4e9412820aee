//! The remote time tracker seam.
//!
//! The engine never talks HTTP itself. Anything that implements
//! [`TimeTracker`] can act as the remote side: the Redmine REST client in
//! `redcal-cli`, or an in-memory fake in tests.

mod types;

pub use types::{ActivityInfo, IssueInfo, ProjectInfo, TimeEntryInfo, UserInfo};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::RedcalResult;

/// Progress callback for paged downloads: `(fetched, total)`.
pub type Progress<'a> = &'a (dyn Fn(usize, usize) + Send + Sync);

/// Filter parameters for tracker queries. Unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub project_id: Option<i64>,
    pub issue_id: Option<i64>,
    /// Include closed issues as well as open ones.
    pub any_status: bool,
    pub updated_since: Option<NaiveDate>,
    /// Inclusive spent-on date range for time entries.
    pub spent_between: Option<(NaiveDate, NaiveDate)>,
    /// Time entries of all users instead of only the current one.
    pub any_user: bool,
    /// Apply the configured page size to a single request.
    pub use_limit: bool,
}

impl Query {
    pub fn issue(id: i64) -> Self {
        Query {
            issue_id: Some(id),
            any_status: true,
            ..Default::default()
        }
    }

    pub fn project_issues(project_id: i64) -> Self {
        Query {
            project_id: Some(project_id),
            any_status: true,
            ..Default::default()
        }
    }
}

/// Operations the engine needs from the remote tracker.
///
/// Implementations must report an unreachable tracker as
/// [`RedcalError::Connection`](crate::error::RedcalError::Connection) so the
/// engine can tell it apart from a rejected request.
#[async_trait]
pub trait TimeTracker: Send + Sync {
    async fn current_user(&self) -> RedcalResult<UserInfo>;

    async fn activities(&self, query: &Query) -> RedcalResult<Vec<ActivityInfo>>;

    async fn projects(&self, query: &Query, progress: Progress<'_>)
        -> RedcalResult<Vec<ProjectInfo>>;

    /// A single page of issues.
    async fn issues(&self, query: &Query) -> RedcalResult<Vec<IssueInfo>>;

    /// All pages of issues.
    async fn all_issues(&self, query: &Query, progress: Progress<'_>)
        -> RedcalResult<Vec<IssueInfo>>;

    async fn time_entries(
        &self,
        query: &Query,
        progress: Progress<'_>,
    ) -> RedcalResult<Vec<TimeEntryInfo>>;

    async fn create_time_entry(&self, entry: &TimeEntryInfo) -> RedcalResult<TimeEntryInfo>;

    async fn update_time_entry(&self, entry: &TimeEntryInfo) -> RedcalResult<TimeEntryInfo>;

    async fn delete_time_entry(&self, id: i64) -> RedcalResult<()>;
}

/// Progress callback that ignores updates.
pub fn no_progress(_: usize, _: usize) {}
