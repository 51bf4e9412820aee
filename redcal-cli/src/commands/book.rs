use anyhow::{Result, bail};
use owo_colors::OwoColorize;
use redcal_core::RecurringRequest;

use crate::app::App;
use crate::render::{Render, pluralize};
use crate::utils::parse::{parse_date, parse_time};

pub struct Booking {
    pub issue: i64,
    pub description: String,
    pub from: String,
    pub to: String,
    pub start_time: String,
    pub end_time: String,
    pub weekends: bool,
}

/// Book the same time slot on every day of a range.
pub async fn run(app: &App, booking: Booking) -> Result<()> {
    let request = RecurringRequest {
        issue_id: booking.issue,
        description: booking.description,
        start_date: parse_date(&booking.from)?,
        end_date: parse_date(&booking.to)?,
        start_time: parse_time(&booking.start_time)?,
        end_time: parse_time(&booking.end_time)?,
        include_weekends: booking.weekends,
    };

    if request.end_time <= request.start_time {
        bail!("End time must be after start time");
    }
    if request.days().is_empty() {
        bail!("No days to book between {} and {}", request.start_date, request.end_date);
    }

    app.connect().await?;
    let created = app.sync.create_recurring_time_entries(&request).await?;

    for appt in &created {
        println!("   {}", appt.render());
    }
    println!(
        "{}",
        format!(
            "  Booked {} {}, run `redcal push` to save them in Redmine",
            created.len(),
            pluralize("appointment", created.len())
        )
        .green()
    );

    Ok(())
}
