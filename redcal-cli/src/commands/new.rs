use anyhow::{Result, bail};
use chrono::{Duration, NaiveDateTime};
use dialoguer::Input;
use owo_colors::OwoColorize;
use redcal_core::{Appointment, CalendarStore, ChangedProperty};

use crate::app::App;
use crate::render::Render;
use crate::utils::parse::{apply_duration, parse_datetime, parse_end};

pub struct NewEntry {
    pub subject: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub duration: Option<String>,
    pub issue: Option<i64>,
}

pub async fn run(app: &App, entry: NewEntry) -> Result<()> {
    let interactive = entry.subject.is_none() || entry.start.is_none();

    // --- Subject ---
    let subject = match entry.subject {
        Some(s) => s,
        None => Input::<String>::new()
            .with_prompt("  What? (\"#123\" picks the issue)")
            .interact_text()?,
    };

    // --- Start ---
    let start = match entry.start {
        Some(s) => parse_datetime(&s)?,
        None => prompt_with_retry("  When?", parse_datetime)?,
    };

    // --- Duration / End ---
    let end = if let Some(end) = entry.end {
        parse_end(&end, start)?
    } else if let Some(duration) = entry.duration {
        apply_duration(start, &duration)?
    } else if interactive {
        prompt_with_retry("  How long? (1 hour)", |input| {
            if input.is_empty() {
                Ok(start + Duration::hours(1))
            } else {
                parse_end(input, start)
            }
        })?
    } else {
        start + Duration::hours(1)
    };

    if end <= start {
        bail!("End {} is not after start {}", end, start);
    }

    let mut appt = app.calendar.add(Appointment::new(&subject, start, end))?;
    app.sync.item_added(&mut appt)?;

    match entry.issue {
        Some(issue_id) => {
            app.connect().await?;
            if !app.sync.update_appointment_issue(&mut appt, issue_id).await? {
                eprintln!("  {}", format!("Unknown issue #{}", issue_id).yellow());
                app.sync
                    .property_changed(&mut appt, &ChangedProperty::Subject)?;
            }
        }
        // The issue is taken from the subject when pushing
        None => app
            .sync
            .property_changed(&mut appt, &ChangedProperty::Subject)?,
    }

    if interactive {
        println!();
    }
    println!("{}", format!("  Created: {}", appt.render()).green());

    Ok(())
}

/// Prompt the user with retry on parse errors.
fn prompt_with_retry<F>(prompt: &str, parse: F) -> Result<NaiveDateTime>
where
    F: Fn(&str) -> Result<NaiveDateTime>,
{
    loop {
        let input: String = Input::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?;
        match parse(input.trim()) {
            Ok(result) => return Ok(result),
            Err(e) => eprintln!("  {}", e.to_string().red()),
        }
    }
}
