use anyhow::{Context, Result};

use crate::app::App;

pub async fn run(app: &App, issue_id: Option<i64>, project_id: Option<i64>) -> Result<()> {
    let link = match (issue_id, project_id) {
        (_, Some(project_id)) => app.sync.project_link(project_id).await,
        (Some(issue_id), None) => app.sync.issue_link(issue_id).await,
        (None, None) => anyhow::bail!("Give an issue id or --project"),
    };

    println!("  {} {}", link.label, link.url);
    open::that(&link.url).with_context(|| format!("Could not open {}", link.url))?;

    Ok(())
}
