//! Redmine REST client.
//!
//! Start and end times are not part of Redmine's time entry model. They are
//! kept in two optional time entry custom fields (`HH:MM`); without them an
//! entry starts at 09:00 and lasts its hours.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, Utc};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use redcal_core::remote::Progress;
use redcal_core::{
    ActivityInfo, IssueInfo, ProjectInfo, Query, RedcalError, RedcalResult, Settings,
    TimeEntryInfo, TimeTracker, UserInfo,
};

const API_KEY_HEADER: &str = "X-Redmine-API-Key";

fn default_start() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN)
}

pub struct RedmineClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
    page_size: usize,
    start_field: Option<i64>,
    end_field: Option<i64>,
}

impl RedmineClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let base_url = Url::parse(&format!("{}/", settings.connection_url()))
            .with_context(|| format!("Invalid Redmine URL: \"{}\"", settings.redmine_url))?;

        Ok(RedmineClient {
            http: reqwest::Client::new(),
            base_url,
            api_key: settings.api_key.clone(),
            page_size: settings.limit_for_issue_number.max(1),
            start_field: settings.start_time_field_id,
            end_field: settings.end_time_field_id,
        })
    }

    fn request(&self, method: Method, path: &str) -> RedcalResult<RequestBuilder> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| RedcalError::Config(format!("Invalid Redmine URL: {}", e)))?;

        Ok(self
            .http
            .request(method, url)
            .header(API_KEY_HEADER, &self.api_key))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&'static str, String)],
    ) -> RedcalResult<T> {
        let response = self
            .request(Method::GET, path)?
            .query(params)
            .send()
            .await
            .map_err(transport_error)?;

        check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| RedcalError::Serialization(e.to_string()))
    }

    /// Fetch every page of a listing.
    async fn get_all<P: Page>(
        &self,
        path: &str,
        params: &[(&'static str, String)],
        progress: Progress<'_>,
    ) -> RedcalResult<Vec<P::Item>> {
        let mut items = Vec::new();

        loop {
            let mut page_params = params.to_vec();
            page_params.push(("offset", items.len().to_string()));
            page_params.push(("limit", self.page_size.to_string()));

            let page: P = self.get(path, &page_params).await?;
            let total = page.total_count();
            let batch = page.into_items();
            let exhausted = batch.is_empty();

            items.extend(batch);
            progress(items.len(), total.max(items.len()));

            if exhausted || items.len() >= total {
                break;
            }
        }

        Ok(items)
    }

    fn issue_params(&self, query: &Query) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if query.any_status {
            params.push(("status_id", "*".to_string()));
        }
        if let Some(project_id) = query.project_id {
            params.push(("project_id", project_id.to_string()));
        }
        if let Some(issue_id) = query.issue_id {
            params.push(("issue_id", issue_id.to_string()));
        }
        if let Some(since) = query.updated_since {
            params.push(("updated_on", format!(">={}", since.format("%Y-%m-%d"))));
        }
        params
    }

    fn time_entry_params(&self, query: &Query) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some((from, to)) = query.spent_between {
            params.push(("from", from.format("%Y-%m-%d").to_string()));
            params.push(("to", to.format("%Y-%m-%d").to_string()));
        }
        if !query.any_user {
            params.push(("user_id", "me".to_string()));
        }
        if let Some(project_id) = query.project_id {
            params.push(("project_id", project_id.to_string()));
        }
        params
    }

    fn field_time(&self, fields: &[WireCustomField], id: Option<i64>) -> Option<NaiveTime> {
        let id = id?;
        let value = fields.iter().find(|f| f.id == id)?.value.as_ref()?.as_str()?;
        NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
    }

    fn to_time_entry(&self, wire: WireTimeEntry) -> Option<TimeEntryInfo> {
        let Some(issue) = wire.issue else {
            debug!(id = wire.id, "Skipping time entry without issue");
            return None;
        };

        let start_time = self
            .field_time(&wire.custom_fields, self.start_field)
            .unwrap_or_else(default_start);
        let start = wire.spent_on.and_time(start_time);
        let end = self
            .field_time(&wire.custom_fields, self.end_field)
            .map(|t| wire.spent_on.and_time(t))
            .unwrap_or_else(|| start + Duration::seconds((wire.hours * 3600.0).round() as i64));

        Some(TimeEntryInfo {
            id: wire.id,
            start,
            end,
            hours: wire.hours,
            name: wire.comments.unwrap_or_default(),
            updated: wire.updated_on.with_timezone(&Local).naive_local(),
            issue: IssueInfo {
                id: issue.id,
                name: issue.name,
                project_id: wire.project.id,
            },
            project: ProjectInfo {
                id: wire.project.id,
                name: wire.project.name,
            },
            activity: ActivityInfo {
                id: wire.activity.id,
                name: wire.activity.name,
                is_default: false,
            },
        })
    }

    fn payload<'a>(&self, entry: &'a TimeEntryInfo) -> TimeEntryRequest<'a> {
        let mut custom_fields = Vec::new();
        if let Some(id) = self.start_field {
            custom_fields.push(CustomFieldValue {
                id,
                value: entry.start.format("%H:%M").to_string(),
            });
        }
        if let Some(id) = self.end_field {
            custom_fields.push(CustomFieldValue {
                id,
                value: entry.end.format("%H:%M").to_string(),
            });
        }

        TimeEntryRequest {
            time_entry: TimeEntryPayload {
                issue_id: entry.issue.id,
                spent_on: entry.start.date(),
                hours: (entry.hours * 100.0).round() / 100.0,
                activity_id: entry.activity.id,
                comments: &entry.name,
                custom_fields,
            },
        }
    }
}

/// Unreachable server and 5xx answers are connection failures, the rest are rejections.
fn transport_error(e: reqwest::Error) -> RedcalError {
    if e.is_connect() || e.is_timeout() || e.is_request() {
        RedcalError::connection(e.to_string())
    } else {
        RedcalError::Remote(e.to_string())
    }
}

async fn check_status(response: Response) -> RedcalResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    if status.is_server_error() {
        Err(RedcalError::connection(format!("Redmine answered {}", status)))
    } else {
        Err(RedcalError::Remote(format!("{}: {}", status, body.trim())))
    }
}

#[async_trait]
impl TimeTracker for RedmineClient {
    async fn current_user(&self) -> RedcalResult<UserInfo> {
        let envelope: UserEnvelope = self.get("users/current.json", &[]).await?;
        let user = envelope.user;

        let full_name = format!("{} {}", user.firstname, user.lastname);
        let name = match full_name.trim() {
            "" => user.login,
            name => name.to_string(),
        };

        Ok(UserInfo { id: user.id, name })
    }

    async fn activities(&self, _query: &Query) -> RedcalResult<Vec<ActivityInfo>> {
        let envelope: ActivitiesEnvelope = self
            .get("enumerations/time_entry_activities.json", &[])
            .await?;

        Ok(envelope
            .time_entry_activities
            .into_iter()
            .map(|a| ActivityInfo {
                id: a.id,
                name: a.name,
                is_default: a.is_default,
            })
            .collect())
    }

    async fn projects(
        &self,
        _query: &Query,
        progress: Progress<'_>,
    ) -> RedcalResult<Vec<ProjectInfo>> {
        let projects = self
            .get_all::<ProjectsPage>("projects.json", &[], progress)
            .await?;

        Ok(projects
            .into_iter()
            .map(|p| ProjectInfo {
                id: p.id,
                name: p.name,
            })
            .collect())
    }

    async fn issues(&self, query: &Query) -> RedcalResult<Vec<IssueInfo>> {
        let mut params = self.issue_params(query);
        if query.use_limit {
            params.push(("limit", self.page_size.to_string()));
        }

        let page: IssuesPage = self.get("issues.json", &params).await?;
        Ok(page.into_items().into_iter().map(WireIssue::into_info).collect())
    }

    async fn all_issues(
        &self,
        query: &Query,
        progress: Progress<'_>,
    ) -> RedcalResult<Vec<IssueInfo>> {
        let issues = self
            .get_all::<IssuesPage>("issues.json", &self.issue_params(query), progress)
            .await?;

        Ok(issues.into_iter().map(WireIssue::into_info).collect())
    }

    async fn time_entries(
        &self,
        query: &Query,
        progress: Progress<'_>,
    ) -> RedcalResult<Vec<TimeEntryInfo>> {
        let entries = self
            .get_all::<TimeEntriesPage>("time_entries.json", &self.time_entry_params(query), progress)
            .await?;

        Ok(entries
            .into_iter()
            .filter_map(|e| self.to_time_entry(e))
            .collect())
    }

    async fn create_time_entry(&self, entry: &TimeEntryInfo) -> RedcalResult<TimeEntryInfo> {
        let response = self
            .request(Method::POST, "time_entries.json")?
            .json(&self.payload(entry))
            .send()
            .await
            .map_err(transport_error)?;

        let envelope: TimeEntryEnvelope = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| RedcalError::Serialization(e.to_string()))?;

        let mut created = entry.clone();
        created.id = envelope.time_entry.id;
        created.updated = envelope
            .time_entry
            .updated_on
            .with_timezone(&Local)
            .naive_local();
        Ok(created)
    }

    async fn update_time_entry(&self, entry: &TimeEntryInfo) -> RedcalResult<TimeEntryInfo> {
        let response = self
            .request(Method::PUT, &format!("time_entries/{}.json", entry.id))?
            .json(&self.payload(entry))
            .send()
            .await
            .map_err(transport_error)?;
        check_status(response).await?;

        // Redmine answers updates with an empty body
        let mut updated = entry.clone();
        updated.updated = Local::now().naive_local();
        Ok(updated)
    }

    async fn delete_time_entry(&self, id: i64) -> RedcalResult<()> {
        let response = self
            .request(Method::DELETE, &format!("time_entries/{}.json", id))?
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(id, "Time entry already gone");
            return Ok(());
        }

        check_status(response).await?;
        Ok(())
    }
}

// WIRE FORMAT:

trait Page: DeserializeOwned {
    type Item;
    fn total_count(&self) -> usize;
    fn into_items(self) -> Vec<Self::Item>;
}

macro_rules! page {
    ($name:ident, $field:ident, $item:ty) => {
        #[derive(Deserialize)]
        struct $name {
            $field: Vec<$item>,
            #[serde(default)]
            total_count: usize,
        }

        impl Page for $name {
            type Item = $item;

            fn total_count(&self) -> usize {
                self.total_count
            }

            fn into_items(self) -> Vec<$item> {
                self.$field
            }
        }
    };
}

page!(ProjectsPage, projects, WireProject);
page!(IssuesPage, issues, WireIssue);
page!(TimeEntriesPage, time_entries, WireTimeEntry);

#[derive(Deserialize)]
struct Reference {
    id: i64,
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: WireUser,
}

#[derive(Deserialize)]
struct WireUser {
    id: i64,
    #[serde(default)]
    login: String,
    #[serde(default)]
    firstname: String,
    #[serde(default)]
    lastname: String,
}

#[derive(Deserialize)]
struct ActivitiesEnvelope {
    time_entry_activities: Vec<WireActivity>,
}

#[derive(Deserialize)]
struct WireActivity {
    id: i64,
    name: String,
    #[serde(default)]
    is_default: bool,
}

#[derive(Deserialize)]
struct WireProject {
    id: i64,
    name: String,
}

#[derive(Deserialize)]
struct WireIssue {
    id: i64,
    subject: String,
    project: Reference,
}

impl WireIssue {
    fn into_info(self) -> IssueInfo {
        IssueInfo {
            id: self.id,
            name: self.subject,
            project_id: self.project.id,
        }
    }
}

#[derive(Deserialize)]
struct WireCustomField {
    id: i64,
    #[serde(default)]
    value: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct WireTimeEntry {
    id: i64,
    project: Reference,
    #[serde(default)]
    issue: Option<Reference>,
    activity: Reference,
    hours: f64,
    #[serde(default)]
    comments: Option<String>,
    spent_on: NaiveDate,
    updated_on: DateTime<Utc>,
    #[serde(default)]
    custom_fields: Vec<WireCustomField>,
}

#[derive(Deserialize)]
struct TimeEntryEnvelope {
    time_entry: WireTimeEntry,
}

#[derive(Serialize)]
struct TimeEntryRequest<'a> {
    time_entry: TimeEntryPayload<'a>,
}

#[derive(Serialize)]
struct TimeEntryPayload<'a> {
    issue_id: i64,
    spent_on: NaiveDate,
    hours: f64,
    activity_id: i64,
    comments: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    custom_fields: Vec<CustomFieldValue>,
}

#[derive(Serialize)]
struct CustomFieldValue {
    id: i64,
    value: String,
}
