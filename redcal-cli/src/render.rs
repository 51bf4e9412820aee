//! Terminal rendering for redcal types.
//!
//! Extension traits that add colored output to redcal-core types using owo_colors.

use owo_colors::OwoColorize;

use redcal_core::{Appointment, IssueInfo, ResetReport, SaveReport, SyncState};

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for Option<SyncState> {
    fn render(&self) -> String {
        match self {
            Some(SyncState::Modified) => "~".yellow().to_string(),
            Some(SyncState::Deleted) => "-".red().to_string(),
            Some(SyncState::Synchronized) => "✓".green().to_string(),
            Some(SyncState::SynchronizedOvertime) => "✓".cyan().to_string(),
            Some(SyncState::SyncError) => "!".red().bold().to_string(),
            None => "·".dimmed().to_string(),
        }
    }
}

/// Short handle for an appointment, accepted by the commands that take one.
pub fn short_id(appt: &Appointment) -> &str {
    appt.entry_id.get(..8).unwrap_or(&appt.entry_id)
}

impl Render for Appointment {
    fn render(&self) -> String {
        let time = format!(
            "{} {}-{}",
            self.start.format("%a %d.%m."),
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        );

        let subject = match self.state() {
            Some(SyncState::Deleted) => self.subject.strikethrough().to_string(),
            Some(SyncState::SyncError) => self.subject.red().to_string(),
            _ => self.subject.clone(),
        };

        let mut line = format!(
            "{} {} {} {}",
            self.state().render(),
            short_id(self).dimmed(),
            time,
            subject
        );
        if !self.location.is_empty() {
            line.push_str(&format!("  {}", self.location.dimmed()));
        }
        line
    }
}

impl Render for IssueInfo {
    fn render(&self) -> String {
        format!("{} {}", format!("#{}", self.id).cyan(), self.name)
    }
}

/// Threshold for compact view (show counts instead of individual appointments)
const COMPACT_THRESHOLD: usize = 10;

pub fn render_appointments(appointments: &[Appointment], verbose: bool) -> String {
    if appointments.is_empty() {
        return "   No appointments".dimmed().to_string();
    }

    if verbose || appointments.len() <= COMPACT_THRESHOLD {
        return appointments
            .iter()
            .map(|a| format!("   {}", a.render()))
            .collect::<Vec<_>>()
            .join("\n");
    }

    let mut lines = Vec::new();
    for state in SyncState::ALL {
        let count = appointments
            .iter()
            .filter(|a| a.state() == Some(state))
            .count();
        if count > 0 {
            lines.push(format!(
                "   {} {} {}",
                Some(state).render(),
                count,
                state.name().dimmed()
            ));
        }
    }
    lines.join("\n")
}

pub fn render_save_report(report: &SaveReport) -> String {
    let (created, updated, deleted) = report.push_counts();
    let mut lines = vec![format!(
        "Pushed: {} created, {} updated, {} deleted",
        created, updated, deleted
    )];

    if report.unresolved() > 0 {
        lines.push(
            format!(
                "   {} {} without issue",
                report.unresolved(),
                pluralize("appointment", report.unresolved())
            )
            .yellow()
            .to_string(),
        );
    }
    if report.deferred() > 0 {
        lines.push(
            format!("   {} deferred", report.deferred())
                .dimmed()
                .to_string(),
        );
    }
    if report.failed > 0 {
        lines.push(format!("   {} failed", report.failed).red().to_string());
    }

    lines.join("\n")
}

pub fn render_reset_report(report: &ResetReport) -> String {
    if report.total_changes() == 0 && report.unchanged == 0 {
        return "   No time entries in range".dimmed().to_string();
    }

    format!(
        "Reverted: {} updated, {} imported, {} discarded, {} removed {}",
        report.updated,
        report.imported,
        report.discarded,
        report.removed,
        format!("({} unchanged)", report.unchanged).dimmed()
    )
}

/// Simple pluralization helper
pub fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}
