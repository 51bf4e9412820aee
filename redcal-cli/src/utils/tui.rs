use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tracing::debug;

use redcal_core::SyncObserver;

pub fn create_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["-", "\\", "|", "/"])
            .template("{msg} {spinner}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}

/// Shows engine status on a spinner while a command waits for it.
#[derive(Default)]
pub struct TerminalObserver {
    spinner: Mutex<Option<ProgressBar>>,
}

impl TerminalObserver {
    pub fn start(&self, message: &str) {
        if let Ok(mut spinner) = self.spinner.lock() {
            if let Some(old) = spinner.take() {
                old.finish_and_clear();
            }
            *spinner = Some(create_spinner(message.to_string()));
        }
    }

    pub fn finish(&self) {
        if let Ok(mut spinner) = self.spinner.lock()
            && let Some(spinner) = spinner.take()
        {
            spinner.finish_and_clear();
        }
    }

    /// Print above the spinner without garbling it.
    fn print(&self, line: String) {
        match self.spinner.lock().ok().as_deref().and_then(Option::as_ref) {
            Some(spinner) => spinner.suspend(|| eprintln!("{}", line)),
            None => eprintln!("{}", line),
        }
    }
}

impl SyncObserver for TerminalObserver {
    fn status(&self, message: &str) {
        debug!(message, "Status");
        if let Ok(spinner) = self.spinner.lock()
            && let Some(spinner) = spinner.as_ref()
        {
            spinner.set_message(message.to_string());
        }
    }

    fn connection_changed(&self, connected: bool) {
        debug!(connected, "Connection changed");
    }

    fn errors(&self, messages: &[String]) {
        for message in messages {
            self.print(format!("   {}", message.red()));
        }
    }
}
