use anyhow::Result;
use chrono::{Duration, Local, NaiveTime};
use redcal_core::CalendarStore;

use super::LIST_DAYS;
use crate::app::App;
use crate::render::render_appointments;
use crate::utils::parse::parse_date;

/// Show appointments in a date range, the last week by default.
pub fn run(app: &App, from: Option<String>, to: Option<String>, verbose: bool) -> Result<()> {
    let today = Local::now().date_naive();
    let from = match from {
        Some(s) => parse_date(&s)?,
        None => today - Duration::days(LIST_DAYS - 1),
    };
    let to = match to {
        Some(s) => parse_date(&s)?,
        None => today,
    };

    let start = from.and_time(NaiveTime::MIN);
    let end = (to + Duration::days(1)).and_time(NaiveTime::MIN) - Duration::seconds(1);
    let appointments = app.calendar.appointments_in_range(start, end)?;

    println!("{}", render_appointments(&appointments, verbose));
    Ok(())
}
