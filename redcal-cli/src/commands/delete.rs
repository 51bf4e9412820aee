use anyhow::Result;
use owo_colors::OwoColorize;
use redcal_core::DeleteDecision;

use crate::app::App;

pub fn run(app: &App, id: &str) -> Result<()> {
    let mut appt = app.find(id)?;

    match app.sync.delete_appointment(&mut appt)? {
        DeleteDecision::Proceed => {
            println!("{}", format!("  Deleted: {}", appt.subject).red());
        }
        DeleteDecision::Cancel => {
            println!(
                "{}",
                format!("  Marked for deletion: {}", appt.subject).yellow()
            );
            println!("{}", "  Run `redcal push` to delete the time entry in Redmine".dimmed());
        }
    }

    Ok(())
}
