//! In-memory caches of tracker data for one connection session.

mod local_cache;

pub use local_cache::LocalCache;

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::remote::{ActivityInfo, IssueInfo, ProjectInfo};

#[derive(Debug, Default, Clone)]
pub struct RemoteCache {
    pub issues: HashMap<i64, IssueInfo>,
    pub projects: HashMap<i64, ProjectInfo>,
    /// Ordered by id so the default-activity fallback is stable.
    pub activities: BTreeMap<i64, ActivityInfo>,
    /// Most recent first, bounded by the configured size.
    pub last_used_issues: Vec<IssueInfo>,
    pub favorite_issues: Vec<IssueInfo>,
}

impl RemoteCache {
    pub fn issue(&self, id: i64) -> Option<&IssueInfo> {
        self.issues.get(&id)
    }

    pub fn project(&self, id: i64) -> Option<&ProjectInfo> {
        self.projects.get(&id)
    }

    pub fn activity(&self, id: i64) -> Option<&ActivityInfo> {
        self.activities.get(&id)
    }

    /// All known issues sorted by id.
    pub fn all_issues(&self) -> Vec<&IssueInfo> {
        let mut issues: Vec<_> = self.issues.values().collect();
        issues.sort_by_key(|i| i.id);
        issues
    }

    pub fn set_activities(&mut self, activities: Vec<ActivityInfo>) {
        self.activities = activities.into_iter().map(|a| (a.id, a)).collect();
    }

    pub fn set_projects(&mut self, projects: Vec<ProjectInfo>) {
        self.projects = projects.into_iter().map(|p| (p.id, p)).collect();
    }

    /// The activity flagged default, else the first one. `None` only when there are no activities.
    pub fn default_activity(&self) -> Option<&ActivityInfo> {
        self.activities
            .values()
            .find(|a| a.is_default)
            .or_else(|| self.activities.values().next())
    }

    /// Resolve ids against the issue cache, dropping unknown ones.
    pub fn resolve_issues(&self, ids: &[i64]) -> Vec<IssueInfo> {
        ids.iter()
            .filter_map(|id| self.issues.get(id).cloned())
            .collect()
    }

    /// Move `issue` to the front of the last-used list, keeping at most `limit` entries.
    pub fn touch_last_used(&mut self, issue: IssueInfo, limit: usize) {
        self.last_used_issues.retain(|i| i != &issue);
        self.last_used_issues.insert(0, issue);
        self.last_used_issues.truncate(limit);
    }

    pub fn last_used_issue_ids(&self) -> Vec<i64> {
        self.last_used_issues.iter().map(|i| i.id).collect()
    }

    pub fn favorite_issue_ids(&self) -> Vec<i64> {
        self.favorite_issues.iter().map(|i| i.id).collect()
    }
}

/// Projects in `fresh` that are not in `known`.
pub fn new_projects(fresh: &[ProjectInfo], known: &[ProjectInfo]) -> Vec<ProjectInfo> {
    let known: HashSet<&ProjectInfo> = known.iter().collect();
    fresh
        .iter()
        .filter(|p| !known.contains(p))
        .cloned()
        .collect()
}

/// Union of issue lists, keeping the first occurrence of each id.
pub fn merge_issues<I>(lists: I) -> HashMap<i64, IssueInfo>
where
    I: IntoIterator<Item = Vec<IssueInfo>>,
{
    let mut merged = HashMap::new();
    for issue in lists.into_iter().flatten() {
        merged.entry(issue.id).or_insert(issue);
    }
    merged
}
