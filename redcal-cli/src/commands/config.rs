use anyhow::Result;
use owo_colors::OwoColorize;
use redcal_core::Settings;

pub fn run() -> Result<()> {
    let config_path = Settings::config_path()?;
    let settings = Settings::load()?;

    println!("{}", "Paths".bold());
    println!("  Config:     {}", config_path.display());
    println!("  Calendar:   {}", settings.calendar_path().display());
    println!("  Cache:      {}", settings.cache_path()?.display());

    println!();
    println!("{}", "Redmine".bold());
    let url = match settings.connection_url() {
        "" => "(not set)".dimmed().to_string(),
        url => url.to_string(),
    };
    println!("  URL:        {}", url);
    let key = if settings.api_key.is_empty() {
        "(not set)".dimmed().to_string()
    } else {
        "(set)".to_string()
    };
    println!("  API key:    {}", key);
    if let Some(id) = settings.overtime_issue_id {
        println!("  Overtime:   #{}", id);
    }
    if let Some(date) = settings.last_issue_sync_date {
        println!("  Last sync:  {}", date);
    }

    Ok(())
}
