//! User settings.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use config::{Config, File};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_NUMBER_LAST_USED_ISSUES, DEFAULT_PAGE_SIZE};
use crate::error::{RedcalError, RedcalResult};

static DEFAULT_CALENDAR_PATH: &str = "~/redcal";

fn default_calendar_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CALENDAR_PATH)
}

fn is_default_calendar_dir(p: &PathBuf) -> bool {
    *p == default_calendar_dir()
}

fn default_number_last_used_issues() -> usize {
    DEFAULT_NUMBER_LAST_USED_ISSUES
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

/// Settings at ~/.config/redcal/config.toml
///
/// Besides credentials this also holds the sync bookkeeping the engine writes
/// back: the last issue sync date and the last-used/favorite issue lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub redmine_url: String,

    #[serde(default)]
    pub api_key: String,

    /// Issue whose hours are not meaningful; entries on it keep their literal times.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overtime_issue_id: Option<i64>,

    #[serde(default = "default_number_last_used_issues")]
    pub number_last_used_issues: usize,

    /// Page size for tracker requests.
    #[serde(default = "default_page_size")]
    pub limit_for_issue_number: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_issue_sync_date: Option<NaiveDate>,

    /// Semicolon-joined issue ids, most recent first.
    #[serde(default)]
    pub last_used_issues: String,

    /// Semicolon-joined issue ids.
    #[serde(default)]
    pub favorite_issues: String,

    /// Time entry custom field holding the start time (`HH:MM`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time_field_id: Option<i64>,

    /// Time entry custom field holding the end time (`HH:MM`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time_field_id: Option<i64>,

    #[serde(default = "default_calendar_dir", skip_serializing_if = "is_default_calendar_dir")]
    pub calendar_dir: PathBuf,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Where these settings were loaded from; `save` is a no-op without it.
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            redmine_url: String::new(),
            api_key: String::new(),
            overtime_issue_id: None,
            number_last_used_issues: DEFAULT_NUMBER_LAST_USED_ISSUES,
            limit_for_issue_number: DEFAULT_PAGE_SIZE,
            last_issue_sync_date: None,
            last_used_issues: String::new(),
            favorite_issues: String::new(),
            start_time_field_id: None,
            end_time_field_id: None,
            calendar_dir: default_calendar_dir(),
            cache_dir: None,
            path: None,
        }
    }
}

impl Settings {
    pub fn config_path() -> RedcalResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| RedcalError::Config("Could not determine config directory".into()))?
            .join("redcal");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location, writing a commented template first if missing.
    pub fn load() -> RedcalResult<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            Self::create_default_config(&path)?;
        }

        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> RedcalResult<Self> {
        let mut settings: Settings = Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .build()
            .map_err(|e| RedcalError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| RedcalError::Config(e.to_string()))?;

        settings.path = Some(path.to_path_buf());
        Ok(settings)
    }

    /// Persist to the file these settings were loaded from.
    pub fn save(&self) -> RedcalResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let content =
            toml::to_string_pretty(self).map_err(|e| RedcalError::Config(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)
            .map_err(|e| RedcalError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    pub fn create_default_config(path: &Path) -> RedcalResult<()> {
        let contents = format!(
            "\
# redcal configuration

# Redmine server and API key (My account > API access key):
# redmine_url = \"https://redmine.example.com\"
# api_key = \"\"

# Issue used for booking overtime; its hours are ignored:
# overtime_issue_id = 1234

# How many recently used issues to remember:
# number_last_used_issues = {}

# Where appointments are stored:
# calendar_dir = \"{}\"
",
            DEFAULT_NUMBER_LAST_USED_ISSUES, DEFAULT_CALENDAR_PATH
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                RedcalError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| RedcalError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Redmine base URL without a trailing slash.
    pub fn connection_url(&self) -> &str {
        self.redmine_url.trim_end_matches('/')
    }

    pub fn calendar_path(&self) -> PathBuf {
        expand(&self.calendar_dir)
    }

    pub fn cache_path(&self) -> RedcalResult<PathBuf> {
        match &self.cache_dir {
            Some(dir) => Ok(expand(dir)),
            None => dirs::cache_dir()
                .map(|d| d.join("redcal"))
                .ok_or_else(|| RedcalError::Config("Could not determine cache directory".into())),
        }
    }

    pub fn last_used_issue_ids(&self) -> Vec<i64> {
        parse_id_list(&self.last_used_issues)
    }

    pub fn set_last_used_issue_ids(&mut self, ids: &[i64]) {
        self.last_used_issues = join_id_list(ids);
    }

    pub fn favorite_issue_ids(&self) -> Vec<i64> {
        parse_id_list(&self.favorite_issues)
    }

    pub fn set_favorite_issue_ids(&mut self, ids: &[i64]) {
        self.favorite_issues = join_id_list(ids);
    }
}

fn expand(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}

/// Parse a semicolon-joined id list, skipping entries that are not numbers.
pub fn parse_id_list(list: &str) -> Vec<i64> {
    list.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse() {
            Ok(id) => Some(id),
            Err(_) => {
                tracing::error!(value = s, "Could not parse issue id from list");
                None
            }
        })
        .collect()
}

pub fn join_id_list(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(";")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_list_roundtrip_skips_garbage() {
        assert_eq!(parse_id_list("3;1; 2 ;x;"), vec![3, 1, 2]);
        assert_eq!(join_id_list(&[3, 1, 2]), "3;1;2");
        assert!(parse_id_list("").is_empty());
    }

    #[test]
    fn test_connection_url_strips_trailing_slash() {
        let settings = Settings {
            redmine_url: "https://redmine.example.com/".into(),
            ..Default::default()
        };
        assert_eq!(settings.connection_url(), "https://redmine.example.com");
    }

    #[test]
    fn test_default_file_loads_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        Settings::create_default_config(&path).unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert!(settings.api_key.is_empty());
        assert_eq!(
            settings.number_last_used_issues,
            DEFAULT_NUMBER_LAST_USED_ISSUES
        );
        assert_eq!(settings.calendar_dir, PathBuf::from(DEFAULT_CALENDAR_PATH));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        Settings::create_default_config(&path).unwrap();

        let mut settings = Settings::load_from(&path).unwrap();
        settings.redmine_url = "https://redmine.example.com".into();
        settings.overtime_issue_id = Some(99);
        settings.last_issue_sync_date = NaiveDate::from_ymd_opt(2024, 2, 29);
        settings.set_favorite_issue_ids(&[5, 6]);
        settings.save().unwrap();

        let reloaded = Settings::load_from(&path).unwrap();
        assert_eq!(reloaded.redmine_url, "https://redmine.example.com");
        assert_eq!(reloaded.overtime_issue_id, Some(99));
        assert_eq!(reloaded.last_issue_sync_date, NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(reloaded.favorite_issue_ids(), vec![5, 6]);
    }

    #[test]
    fn test_unsaved_settings_do_not_write() {
        let settings = Settings::default();
        assert!(settings.save().is_ok());
    }
}
