use anyhow::{Result, bail};
use dialoguer::Confirm;
use owo_colors::OwoColorize;

use crate::app::App;
use crate::render::{pluralize, render_appointments, render_save_report};

pub async fn run(app: &App, yes: bool, verbose: bool) -> Result<()> {
    let pending = app.sync.modified_appointments()?;

    if pending.is_empty() {
        println!("{}", "Nothing to push".dimmed());
        return Ok(());
    }

    println!("{}", render_appointments(&pending, verbose));

    let deletions = pending.iter().filter(|a| a.is_deleted_set()).count();
    if deletions > 0
        && !yes
        && !Confirm::new()
            .with_prompt(format!(
                "Delete {} time {} in Redmine?",
                deletions,
                if deletions == 1 { "entry" } else { "entries" }
            ))
            .default(false)
            .interact()?
    {
        return Ok(());
    }

    app.connect().await?;

    let Some(task) = app.sync.save_all() else {
        bail!("Another save or revert is running");
    };
    let report = app
        .track(
            &format!("Saving {} {}", pending.len(), pluralize("appointment", pending.len())),
            task,
        )
        .await?;

    println!("\n{}", render_save_report(&report));
    Ok(())
}
