//! Wiring of the sync engine for one CLI invocation.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use owo_colors::OwoColorize;

use redcal_core::{Appointment, BackgroundTask, CalendarStore, FolderCalendar, Settings, Synchronizer};

use crate::redmine::RedmineClient;
use crate::utils::tui::TerminalObserver;

pub struct App {
    pub sync: Arc<Synchronizer>,
    pub calendar: Arc<FolderCalendar>,
    observer: Arc<TerminalObserver>,
}

impl App {
    pub fn open() -> Result<Self> {
        let settings = Settings::load()?;
        let calendar = Arc::new(FolderCalendar::open(settings.calendar_path())?);
        let tracker = Arc::new(RedmineClient::new(&settings)?);
        let observer = Arc::new(TerminalObserver::default());

        let sync = Synchronizer::new(settings, tracker, calendar.clone(), observer.clone())?;

        Ok(App {
            sync: Arc::new(sync),
            calendar,
            observer,
        })
    }

    pub async fn connect(&self) -> Result<()> {
        let task = self.sync.connect();
        self.track("Connecting to Redmine", task)
            .await
            .context("Could not connect to Redmine")?;

        if let Some(user) = self.sync.current_user().await {
            println!("{}", format!("Connected as {}", user.name).dimmed());
        }
        Ok(())
    }

    /// Wait for a background task with a spinner showing the engine's status.
    pub async fn track<T: Send + 'static>(
        &self,
        message: &str,
        task: BackgroundTask<T>,
    ) -> Result<T> {
        self.observer.start(message);
        let result = task.wait().await;
        self.observer.finish();
        Ok(result?)
    }

    /// Find an appointment by (a prefix of) its id.
    pub fn find(&self, id: &str) -> Result<Appointment> {
        let mut matches: Vec<Appointment> = self
            .calendar
            .appointments()?
            .into_iter()
            .filter(|a| a.entry_id.starts_with(id))
            .collect();

        match matches.len() {
            0 => bail!("No appointment '{}'", id),
            1 => Ok(matches.remove(0)),
            n => bail!("'{}' matches {} appointments, use a longer id", id, n),
        }
    }
}
