/// Custom field holding the remote time entry id.
pub const FIELD_TIME_ENTRY_ID: &str = "RedmineTimeEntryId";
pub const FIELD_ISSUE_ID: &str = "RedmineIssueId";
pub const FIELD_PROJECT_ID: &str = "RedmineProjectId";
pub const FIELD_ACTIVITY_ID: &str = "RedmineActivityId";
/// Last modification, local or remote, as a date field.
pub const FIELD_LAST_UPDATE: &str = "RedmineLastUpdate";
pub const FIELD_STATE: &str = "RedmineState";
pub const FIELD_PREVIOUS_STATE: &str = "RedminePreviousState";
/// Entry id the appointment had when it was last synced; differs on copies.
pub const FIELD_ENTRY_ID_COPY: &str = "RedmineEntryIdCopy";
pub const FIELD_IMPORTED: &str = "RedmineImported";

/// Issues updated within this many days before the last sync are fetched again.
pub const ISSUE_SYNC_BACKDATE_DAYS: i64 = 2;

/// Allowed gap in minutes between a remote entry's end time and the end implied by its hours.
pub const END_TIME_TOLERANCE_MINUTES: i64 = 5;

pub const DEFAULT_NUMBER_LAST_USED_ISSUES: usize = 10;

pub const DEFAULT_PAGE_SIZE: usize = 100;

pub const NOTE_ISSUE_UNRESOLVED: &str = "The issue for this entry could not be determined.";

pub const NOTE_END_TIME_ADJUSTED: &str =
    "The end time of this entry was kept because it did not match the hours recorded in Redmine.";
