//! Tracker-neutral types for Redmine entities.
//!
//! Issues, projects, activities and users compare and hash by id only, so a
//! renamed issue fetched later still matches the cached one.

use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::constants::END_TIME_TOLERANCE_MINUTES;

macro_rules! identity_by_id {
    ($ty:ty) => {
        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                self.id == other.id
            }
        }

        impl Eq for $ty {}

        impl Hash for $ty {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.id.hash(state);
            }
        }
    };
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueInfo {
    pub id: i64,
    pub name: String,
    pub project_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityInfo {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub is_default: bool,
}

identity_by_id!(UserInfo);
identity_by_id!(ProjectInfo);
identity_by_id!(IssueInfo);
identity_by_id!(ActivityInfo);

impl fmt::Display for IssueInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.id, self.name)
    }
}

impl fmt::Display for ProjectInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A remote record of work performed, mirrored locally by one appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeEntryInfo {
    /// Remote id; negative for entries that only exist locally so far.
    pub id: i64,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// The tracker's duration field. Not meaningful for the overtime issue.
    pub hours: f64,
    pub name: String,
    pub updated: NaiveDateTime,
    pub issue: IssueInfo,
    pub project: ProjectInfo,
    pub activity: ActivityInfo,
}

impl TimeEntryInfo {
    pub fn is_placeholder(&self) -> bool {
        self.id < 0
    }

    /// End time derived from the duration field.
    pub fn implied_end(&self) -> NaiveDateTime {
        self.start + Duration::seconds((self.hours * 3600.0).round() as i64)
    }

    /// Whether hours and end time disagree by more than the tolerance.
    pub fn end_drifts(&self) -> bool {
        (self.implied_end() - self.end).num_seconds().abs() > END_TIME_TOLERANCE_MINUTES * 60
    }

    /// End time an appointment mirroring this entry gets.
    ///
    /// Follows the hours unless they drift from the end time. Entries on the
    /// overtime issue always keep their end time.
    pub fn local_end(&self, overtime_issue_id: Option<i64>) -> NaiveDateTime {
        if overtime_issue_id == Some(self.issue.id) || self.end_drifts() {
            self.end
        } else {
            self.implied_end()
        }
    }

    pub fn hours_between(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
        (end - start).num_seconds() as f64 / 3600.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashSet;

    #[test]
    fn test_issue_identity_is_the_id() {
        let a = IssueInfo {
            id: 5,
            name: "Old title".into(),
            project_id: 1,
        };
        let b = IssueInfo {
            id: 5,
            name: "New title".into(),
            project_id: 2,
        };
        assert_eq!(a, b);

        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_implied_end_uses_hours() {
        let start = NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let entry = TimeEntryInfo {
            id: 1,
            start,
            end: start,
            hours: 1.5,
            name: "Review".into(),
            updated: start,
            issue: IssueInfo {
                id: 1,
                name: "i".into(),
                project_id: 1,
            },
            project: ProjectInfo {
                id: 1,
                name: "p".into(),
            },
            activity: ActivityInfo {
                id: 1,
                name: "a".into(),
                is_default: true,
            },
        };

        assert_eq!(
            entry.implied_end(),
            start + Duration::minutes(90)
        );
        assert_eq!(TimeEntryInfo::hours_between(start, entry.implied_end()), 1.5);
    }
}
