//! On-disk cache of issues and projects seen in earlier sessions.
//!
//! Only used to bootstrap incremental downloads. The tracker stays the source
//! of truth.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::RedcalResult;
use crate::remote::{IssueInfo, ProjectInfo};

const KNOWN_ISSUES_FILE: &str = "known_issues.json";
const KNOWN_PROJECTS_FILE: &str = "known_projects.json";

#[derive(Debug, Clone)]
pub struct LocalCache {
    dir: PathBuf,
}

impl LocalCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        LocalCache { dir: dir.into() }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn known_issues(&self) -> Vec<IssueInfo> {
        self.read(KNOWN_ISSUES_FILE)
    }

    pub fn write_known_issues(&self, issues: &[IssueInfo]) -> RedcalResult<()> {
        self.write(KNOWN_ISSUES_FILE, issues)
    }

    pub fn known_projects(&self) -> Vec<ProjectInfo> {
        self.read(KNOWN_PROJECTS_FILE)
    }

    pub fn write_known_projects(&self, projects: &[ProjectInfo]) -> RedcalResult<()> {
        self.write(KNOWN_PROJECTS_FILE, projects)
    }

    // A missing or unreadable blob reads as empty: the next download starts from scratch.
    fn read<T: DeserializeOwned>(&self, name: &str) -> Vec<T> {
        let path = self.dir.join(name);

        if !path.exists() {
            return vec![];
        }

        let parsed = std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()));

        match parsed {
            Ok(items) => items,
            Err(error) => {
                warn!(file = %path.display(), %error, "Ignoring unreadable cache file");
                vec![]
            }
        }
    }

    fn write<T: Serialize>(&self, name: &str, items: &[T]) -> RedcalResult<()> {
        std::fs::create_dir_all(&self.dir)?;

        let path = self.dir.join(name);
        let temp = self.dir.join(format!("{}.tmp", name));

        let content = serde_json::to_string(items)?;
        std::fs::write(&temp, content)?;
        std::fs::rename(&temp, &path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_files_read_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path().join("nested"));
        assert!(cache.known_issues().is_empty());
        assert!(cache.known_projects().is_empty());
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path().join("nested"));

        let issues = vec![IssueInfo {
            id: 1,
            name: "Crash on start".into(),
            project_id: 2,
        }];
        cache.write_known_issues(&issues).unwrap();
        let read = cache.known_issues();
        assert_eq!(read, issues);
        assert_eq!(read[0].name, "Crash on start");
    }

    #[test]
    fn test_corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(KNOWN_PROJECTS_FILE), "not json").unwrap();
        let cache = LocalCache::new(dir.path());
        assert!(cache.known_projects().is_empty());
    }
}
