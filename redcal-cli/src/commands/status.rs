use anyhow::Result;
use owo_colors::OwoColorize;

use crate::app::App;
use crate::render::{pluralize, render_appointments};

/// Show appointments waiting to be pushed.
pub fn run(app: &App, verbose: bool) -> Result<()> {
    let pending = app.sync.modified_appointments()?;

    if pending.is_empty() {
        println!("{}", "Nothing to push".dimmed());
        return Ok(());
    }

    println!(
        "{} {} to push",
        pending.len(),
        pluralize("appointment", pending.len())
    );
    println!("{}", render_appointments(&pending, verbose));

    Ok(())
}
