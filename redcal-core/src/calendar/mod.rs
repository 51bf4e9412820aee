//! The host calendar seam.

mod folder;

pub use folder::FolderCalendar;

use chrono::NaiveDateTime;

use crate::appointment::Appointment;
use crate::error::RedcalResult;

/// Storage for appointments, provided by whatever hosts the calendar.
///
/// Saving and deleting are explicit: the engine mutates an owned
/// [`Appointment`] and hands it back with [`CalendarStore::save`].
pub trait CalendarStore: Send + Sync {
    fn appointments(&self) -> RedcalResult<Vec<Appointment>>;

    /// Appointments overlapping `[from, to]`.
    fn appointments_in_range(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> RedcalResult<Vec<Appointment>> {
        Ok(self
            .appointments()?
            .into_iter()
            .filter(|a| a.overlaps(from, to))
            .collect())
    }

    fn get(&self, entry_id: &str) -> RedcalResult<Option<Appointment>>;

    /// Store a new appointment and return it with its assigned entry id.
    fn add(&self, appt: Appointment) -> RedcalResult<Appointment>;

    fn save(&self, appt: &Appointment) -> RedcalResult<()>;

    fn delete(&self, entry_id: &str) -> RedcalResult<()>;
}
