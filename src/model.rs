//! Data shared by the aggregator, the resolver and the scorers.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Version-control author → bug-tracker account.
pub type IdentityMap = BTreeMap<String, String>;

/// Bug-tracker account → display names seen for it.
pub type RealNameIndex = BTreeMap<String, BTreeSet<String>>;

/// File → (account → ownership score).
pub type FileScores = BTreeMap<String, BTreeMap<String, f64>>;

/// Candidate identifier → number of times it was seen in a role.
pub type Counts = BTreeMap<String, usize>;

pub type BugId = u64;

/// Everything known about how one version-control author took part in
/// bugs: who the bugs were assigned to, who attached patches, who asked for
/// review, who commented.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipationRecord {
    #[serde(default)]
    pub assignees: Counts,
    #[serde(default)]
    pub attachers: Counts,
    #[serde(default)]
    pub reviewees: Counts,
    #[serde(default)]
    pub commenters: Counts,
    #[serde(default)]
    pub last_patch_date: Option<NaiveDate>,
}

impl ParticipationRecord {
    /// Union of the identifiers across the four roles, in key order.
    pub fn participants(&self) -> BTreeSet<&str> {
        self.role_maps()
            .into_iter()
            .flat_map(|m| m.keys().map(String::as_str))
            .collect()
    }

    pub fn role_maps(&self) -> [&Counts; 4] {
        [
            &self.assignees,
            &self.attachers,
            &self.reviewees,
            &self.commenters,
        ]
    }

    fn role_maps_mut(&mut self) -> [&mut Counts; 4] {
        [
            &mut self.assignees,
            &mut self.attachers,
            &mut self.reviewees,
            &mut self.commenters,
        ]
    }

    /// Drop `id` from every role.
    pub fn forget(&mut self, id: &str) {
        for map in self.role_maps_mut() {
            map.remove(id);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.role_maps().iter().all(|m| m.is_empty())
    }
}

/// Files touched by one patch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFiles {
    #[serde(default)]
    pub touched: Vec<String>,
    #[serde(default)]
    pub added: Vec<String>,
    #[serde(default)]
    pub deleted: Vec<String>,
    /// `(old path, new path)` pairs.
    #[serde(default)]
    pub moved: Vec<(String, String)>,
}

impl ChangedFiles {
    /// Files whose pre-patch ownership matters when ranking reviewers:
    /// touched files and the sources of moves.
    pub fn ranking_files(&self) -> Vec<String> {
        let mut files: Vec<String> = self.touched.clone();
        for (old, _) in &self.moved {
            if !files.contains(old) {
                files.push(old.clone());
            }
        }
        files
    }

    /// Every path whose score row an update may read.
    pub fn all_paths(&self) -> BTreeSet<String> {
        self.touched
            .iter()
            .chain(&self.added)
            .chain(self.moved.iter().flat_map(|(o, n)| [o, n]))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patch {
    pub author: String,
    pub date: NaiveDate,
    pub files: ChangedFiles,
    pub bug_id: BugId,
}

/// Participation data for one bug, as delivered by the bug tracker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugInfo {
    #[serde(default)]
    pub assignee: String,
    #[serde(default)]
    pub attachers: Counts,
    #[serde(default)]
    pub commenters: Counts,
    #[serde(default)]
    pub reviewees: Counts,
    #[serde(default)]
    pub reviewers: Vec<String>,
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub component: String,
}

/// Long-lived aggregator state carried from one run to the next.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorStats {
    #[serde(default)]
    pub last_rev: Option<String>,
    #[serde(default)]
    pub stats: BTreeMap<String, ParticipationRecord>,
    #[serde(default)]
    pub mailnames: RealNameIndex,
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
