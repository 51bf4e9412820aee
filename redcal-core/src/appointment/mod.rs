//! Local appointment records and the sync tags stored on them.
//!
//! An [`Appointment`] is the engine's view of a host calendar item. Everything
//! the engine needs to remember about the remote side (ids, state, copy and
//! import markers) lives in its named custom fields.

mod issue_cache;
mod state;
pub mod tags;

pub use issue_cache::IssueIdCache;

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::constants::{
    FIELD_ACTIVITY_ID, FIELD_ENTRY_ID_COPY, FIELD_IMPORTED, FIELD_LAST_UPDATE, FIELD_PROJECT_ID,
    FIELD_TIME_ENTRY_ID,
};
use crate::remote::{IssueInfo, TimeEntryInfo};

/// A typed custom field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CustomValue {
    Int(i64),
    Date(NaiveDateTime),
    Text(String),
}

/// A calendar item as seen by the sync engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    /// Stable id assigned by the calendar store. Empty until the item is added.
    #[serde(default)]
    pub entry_id: String,
    pub subject: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub reminder_set: bool,
    #[serde(default)]
    pub fields: BTreeMap<String, CustomValue>,
}

impl Appointment {
    pub fn new(subject: &str, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Appointment {
            entry_id: String::new(),
            subject: subject.to_string(),
            start,
            end,
            location: String::new(),
            body: String::new(),
            categories: Vec::new(),
            reminder_set: false,
            fields: BTreeMap::new(),
        }
    }

    // CUSTOM FIELDS:

    /// Read an integer field. Missing, blank or non-numeric values read as `None`.
    pub fn custom_id(&self, field: &str) -> Option<i64> {
        match self.fields.get(field)? {
            CustomValue::Int(v) => Some(*v),
            CustomValue::Text(s) => s.trim().parse().ok(),
            CustomValue::Date(_) => None,
        }
    }

    /// Write an integer field, creating it if absent. `None` clears it.
    pub fn set_custom_id(&mut self, field: &str, value: Option<i64>) {
        match value {
            Some(v) => {
                self.fields.insert(field.to_string(), CustomValue::Int(v));
            }
            None => {
                self.fields.remove(field);
            }
        }
    }

    pub fn date_field(&self, field: &str) -> Option<NaiveDateTime> {
        match self.fields.get(field)? {
            CustomValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn set_date_field(&mut self, field: &str, value: NaiveDateTime) {
        self.fields
            .insert(field.to_string(), CustomValue::Date(value));
    }

    pub fn text_field(&self, field: &str) -> Option<&str> {
        match self.fields.get(field)? {
            CustomValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn set_text_field(&mut self, field: &str, value: &str) {
        self.fields
            .insert(field.to_string(), CustomValue::Text(value.to_string()));
    }

    // REMOTE IDS:

    pub fn time_entry_id(&self) -> Option<i64> {
        self.custom_id(FIELD_TIME_ENTRY_ID)
    }

    pub fn set_time_entry_id(&mut self, id: Option<i64>) {
        self.set_custom_id(FIELD_TIME_ENTRY_ID, id);
    }

    pub fn project_id(&self) -> Option<i64> {
        self.custom_id(FIELD_PROJECT_ID)
    }

    pub fn set_project_id(&mut self, id: Option<i64>) {
        self.set_custom_id(FIELD_PROJECT_ID, id);
    }

    pub fn activity_id(&self) -> Option<i64> {
        self.custom_id(FIELD_ACTIVITY_ID)
    }

    pub fn set_activity_id(&mut self, id: Option<i64>) {
        self.set_custom_id(FIELD_ACTIVITY_ID, id);
    }

    /// Whether the item has a time entry that exists on the remote side.
    pub fn has_remote_entry(&self) -> bool {
        self.time_entry_id().is_some_and(|id| id > 0)
    }

    // MARKERS:

    /// True when the host duplicated a synced item: the stored entry id no
    /// longer matches, so the remote id belongs to the original.
    pub fn is_copied(&self) -> bool {
        match self.fields.get(FIELD_ENTRY_ID_COPY) {
            Some(CustomValue::Text(original)) => original != &self.entry_id,
            Some(_) => true,
            None => false,
        }
    }

    pub fn mark_as_not_copied(&mut self) {
        let entry_id = self.entry_id.clone();
        self.set_text_field(FIELD_ENTRY_ID_COPY, &entry_id);
    }

    pub fn is_imported(&self) -> bool {
        self.custom_id(FIELD_IMPORTED).unwrap_or(0) == 1
    }

    pub fn set_imported(&mut self, imported: bool) {
        self.set_custom_id(FIELD_IMPORTED, Some(i64::from(imported)));
    }

    pub fn clear_imported(&mut self) {
        self.set_custom_id(FIELD_IMPORTED, None);
    }

    pub fn modification_date(&self) -> Option<NaiveDateTime> {
        self.date_field(FIELD_LAST_UPDATE)
    }

    pub fn set_modification_date(&mut self, date: NaiveDateTime) {
        self.set_date_field(FIELD_LAST_UPDATE, date);
    }

    // CONTENT:

    pub fn append_to_body(&mut self, message: &str) {
        if self.body.trim().is_empty() {
            self.body = message.to_string();
        } else {
            self.body.push('\n');
            self.body.push_str(message);
        }
    }

    /// Location shown in the calendar: `#<issue> - <issue name>`.
    pub fn set_location_for_issue(&mut self, issue_id: i64, issue: Option<&IssueInfo>) {
        let name = issue.map(|i| i.name.as_str()).unwrap_or("???");
        self.location = format!("#{} - {}", issue_id, name);
    }

    /// Whether subject, times or issue differ from the remote entry.
    ///
    /// The end time is compared with the one applying the entry would write.
    pub fn differs_from(
        &self,
        entry: &TimeEntryInfo,
        issue_id: Option<i64>,
        overtime_issue_id: Option<i64>,
    ) -> bool {
        self.subject != entry.name
            || self.start != entry.start
            || self.end != entry.local_end(overtime_issue_id)
            || issue_id != Some(entry.issue.id)
    }

    pub fn overlaps(&self, from: NaiveDateTime, to: NaiveDateTime) -> bool {
        self.start <= to && self.end >= from
    }
}

impl fmt::Display for Appointment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}, {}: {}",
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%Y-%m-%d %H:%M"),
            self.location,
            self.subject
        )
    }
}
