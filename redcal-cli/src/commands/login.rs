use anyhow::Result;
use dialoguer::Input;
use owo_colors::OwoColorize;
use redcal_core::Settings;

use crate::app::App;

pub async fn run(url: Option<String>) -> Result<()> {
    let mut settings = Settings::load()?;

    settings.redmine_url = match url {
        Some(url) => url,
        None => Input::<String>::new()
            .with_prompt("  Redmine URL")
            .with_initial_text(settings.redmine_url.clone())
            .interact_text()?,
    };

    // Validates the URL before anything is written
    url::Url::parse(settings.connection_url())?;

    let key = rpassword::prompt_password("  API key (My account > API access key): ")?;
    settings.api_key = key.trim().to_string();
    settings.save()?;

    let app = App::open()?;
    app.connect().await?;
    println!("{}", "  Saved".green());

    Ok(())
}
