use anyhow::{Result, bail};
use owo_colors::OwoColorize;
use redcal_core::{CalendarStore, ChangedProperty, SyncState};

use crate::app::App;
use crate::render::Render;
use crate::utils::parse::{parse_datetime, parse_end};

pub struct Changes {
    pub subject: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub issue: Option<i64>,
    pub activity: Option<i64>,
}

pub async fn run(app: &App, id: &str, changes: Changes) -> Result<()> {
    let mut appt = app.find(id)?;

    if appt.is_deleted_set() {
        bail!("'{}' is marked for deletion", appt.subject);
    }

    let mut changed = Vec::new();

    if let Some(subject) = changes.subject {
        appt.subject = subject;
        changed.push(ChangedProperty::Subject);
    }

    if let Some(start) = changes.start {
        // Moving the start keeps the duration unless a new end is given
        let duration = appt.end - appt.start;
        appt.start = parse_datetime(&start)?;
        appt.end = appt.start + duration;
        changed.push(ChangedProperty::Start);
    }

    if let Some(end) = changes.end {
        appt.end = parse_end(&end, appt.start)?;
        changed.push(ChangedProperty::End);
    }

    if appt.end <= appt.start {
        bail!("End {} is not after start {}", appt.end, appt.start);
    }

    if !changed.is_empty() {
        app.calendar.save(&appt)?;
    }
    for property in &changed {
        app.sync.property_changed(&mut appt, property)?;
    }

    if let Some(activity_id) = changes.activity {
        appt.set_activity_id(Some(activity_id));
        appt.set_state(SyncState::Modified);
        app.calendar.save(&appt)?;
    }

    if let Some(issue_id) = changes.issue {
        app.connect().await?;
        if !app.sync.update_appointment_issue(&mut appt, issue_id).await? {
            eprintln!("  {}", format!("Issue #{} unchanged", issue_id).yellow());
        }
    }

    println!("{}", format!("  Updated: {}", appt.render()).yellow());
    Ok(())
}
