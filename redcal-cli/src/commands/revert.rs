use anyhow::{Result, bail};
use dialoguer::Confirm;

use crate::app::App;
use crate::render::render_reset_report;
use crate::utils::parse::parse_date;

/// Replace local appointments in a date range with what Redmine has.
pub async fn run(app: &App, from: Option<String>, to: Option<String>, yes: bool) -> Result<()> {
    let (pending_from, pending_to) = app.sync.revert_window()?;
    let from = match from {
        Some(s) => parse_date(&s)?,
        None => pending_from,
    };
    let to = match to {
        Some(s) => parse_date(&s)?,
        None => pending_to,
    };

    if to < from {
        bail!("--to ({}) is before --from ({})", to, from);
    }

    if !yes
        && !Confirm::new()
            .with_prompt(format!(
                "Discard local changes between {} and {}?",
                from, to
            ))
            .default(false)
            .interact()?
    {
        return Ok(());
    }

    app.connect().await?;

    let Some(task) = app.sync.revert(from, to) else {
        bail!("Another save or revert is running");
    };
    let report = app.track("Loading time entries", task).await?;

    println!("{}", render_reset_report(&report));
    Ok(())
}
