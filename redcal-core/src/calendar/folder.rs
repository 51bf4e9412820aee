//! A calendar kept as one JSON file per appointment.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::appointment::Appointment;
use crate::calendar::CalendarStore;
use crate::error::{RedcalError, RedcalResult};

#[derive(Debug, Clone)]
pub struct FolderCalendar {
    dir: PathBuf,
}

impl FolderCalendar {
    pub fn open(dir: impl Into<PathBuf>) -> RedcalResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(FolderCalendar { dir })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, entry_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", entry_id))
    }

    fn read(path: &Path) -> RedcalResult<Appointment> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            RedcalError::Calendar(format!("Failed to parse {}: {}", path.display(), e))
        })
    }
}

impl CalendarStore for FolderCalendar {
    fn appointments(&self) -> RedcalResult<Vec<Appointment>> {
        let entries = std::fs::read_dir(&self.dir)?;

        let mut appointments: Vec<Appointment> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|e| e == "json"))
            .filter_map(|path| match Self::read(&path) {
                Ok(appt) => Some(appt),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable appointment");
                    None
                }
            })
            .collect();

        appointments.sort_by(|a, b| a.start.cmp(&b.start));
        Ok(appointments)
    }

    fn get(&self, entry_id: &str) -> RedcalResult<Option<Appointment>> {
        let path = self.path_for(entry_id);
        if !path.exists() {
            return Ok(None);
        }
        Self::read(&path).map(Some)
    }

    fn add(&self, mut appt: Appointment) -> RedcalResult<Appointment> {
        appt.entry_id = Uuid::new_v4().simple().to_string();
        self.save(&appt)?;
        Ok(appt)
    }

    fn save(&self, appt: &Appointment) -> RedcalResult<()> {
        if appt.entry_id.is_empty() {
            return Err(RedcalError::Calendar(
                "Cannot save an appointment without entry id".into(),
            ));
        }

        let path = self.path_for(&appt.entry_id);
        let temp = path.with_extension("json.tmp");

        let content = serde_json::to_string_pretty(appt)?;
        std::fs::write(&temp, content)?;
        std::fs::rename(&temp, &path)?;
        Ok(())
    }

    fn delete(&self, entry_id: &str) -> RedcalResult<()> {
        let path = self.path_for(entry_id);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        Ok(())
    }
}
