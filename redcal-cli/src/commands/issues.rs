use anyhow::Result;
use owo_colors::OwoColorize;
use redcal_core::IssueInfo;

use crate::app::App;
use crate::render::Render;

pub async fn run(app: &App, search: Option<String>, favorites: Option<Vec<i64>>) -> Result<()> {
    app.connect().await?;

    if let Some(ids) = favorites {
        app.sync.update_favorite_issues(&ids).await?;
    }

    let Some((favorites, last_used, matches)) = app
        .sync
        .with_cache(|cache| {
            let matches: Vec<IssueInfo> = match &search {
                Some(term) => {
                    let term = term.to_lowercase();
                    cache
                        .all_issues()
                        .into_iter()
                        .filter(|i| {
                            i.name.to_lowercase().contains(&term) || i.id.to_string() == term
                        })
                        .cloned()
                        .collect()
                }
                None => Vec::new(),
            };
            (
                cache.favorite_issues.clone(),
                cache.last_used_issues.clone(),
                matches,
            )
        })
        .await
    else {
        return Ok(());
    };

    if search.is_some() {
        print_section("Matching", &matches);
    } else {
        print_section("Favorites", &favorites);
        print_section("Last used", &last_used);
    }

    Ok(())
}

fn print_section(title: &str, issues: &[IssueInfo]) {
    println!("{}", title.bold());
    if issues.is_empty() {
        println!("   {}", "None".dimmed());
    }
    for issue in issues {
        println!("   {}", issue.render());
    }
}

pub async fn run_activities(app: &App) -> Result<()> {
    app.connect().await?;

    let activities = app
        .sync
        .with_cache(|cache| cache.activities.values().cloned().collect::<Vec<_>>())
        .await
        .unwrap_or_default();

    for activity in activities {
        let marker = if activity.is_default { " (default)" } else { "" };
        println!("   {} {}{}", activity.id.cyan(), activity.name, marker.dimmed());
    }

    Ok(())
}
