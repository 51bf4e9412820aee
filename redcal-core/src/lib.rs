//! Core of redcal: keeps calendar appointments and Redmine time entries in sync.
//!
//! - `appointment`: local records and the sync tags stored on them
//! - `session` and `cache`: the connection to Redmine and downloaded data
//! - `sync`: the [`Synchronizer`] that pushes changes and resets date windows
//! - `registrar`: change tracking for host calendar events

pub mod appointment;
pub mod cache;
pub mod calendar;
pub mod config;
pub mod constants;
pub mod error;
pub mod observer;
pub mod registrar;
pub mod remote;
pub mod session;
pub mod sync;
pub mod sync_state;
pub mod task;

pub use appointment::{Appointment, CustomValue, IssueIdCache};
pub use calendar::{CalendarStore, FolderCalendar};
pub use config::Settings;
pub use error::{RedcalError, RedcalResult};
pub use observer::{NoopObserver, SyncObserver};
pub use registrar::{ChangedProperty, DeleteDecision, Registrar};
pub use remote::{
    ActivityInfo, IssueInfo, ProjectInfo, Query, TimeEntryInfo, TimeTracker, UserInfo,
};
pub use sync::{
    Link, RecurringRequest, ResetReport, SaveOutcome, SaveReport, Synchronizer, guess_issue_id,
};
pub use sync_state::{PendingChange, SyncState};
pub use task::BackgroundTask;
