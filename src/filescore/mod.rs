//! Per-file ownership scores.
//!
//! Every patch with bug info credits its reviewers and its (resolved)
//! author on each file it touches. Scores only grow, except that a moved
//! file takes over the row of its source.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::model::{BugId, BugInfo, FileScores, IdentityMap, Patch};
use crate::policy::Policy;

/// Every path whose current row an update over `patches` reads.
pub fn paths_of(patches: &[Patch]) -> Vec<String> {
    let all: BTreeSet<String> = patches.iter().flat_map(|p| p.files.all_paths()).collect();
    all.into_iter().collect()
}

/// Working copy of the rows a batch touches, plus the entries it changed.
struct Update<'a> {
    rows: FileScores,
    changed: BTreeMap<String, BTreeSet<String>>,
    policy: &'a Policy,
}

impl Update<'_> {
    fn add(&mut self, file: &str, account: &str, weight: f64) {
        *self
            .rows
            .entry(file.to_string())
            .or_default()
            .entry(account.to_string())
            .or_insert(0.0) += weight;
        self.mark(file, account);
    }

    fn mark(&mut self, file: &str, account: &str) {
        self.changed
            .entry(file.to_string())
            .or_default()
            .insert(account.to_string());
    }

    fn inherit(&mut self, from: &str, to: &str) {
        let row = self.rows.get(from).cloned().unwrap_or_default();
        for account in row.keys() {
            self.mark(to, account);
        }
        self.rows.insert(to.to_string(), row);
    }

    fn apply(&mut self, patch: &Patch, info: &BugInfo, mapping: &IdentityMap) {
        for (old, new) in &patch.files.moved {
            self.inherit(old, new);
        }

        let mut files: Vec<&String> = Vec::new();
        let working = patch
            .files
            .touched
            .iter()
            .chain(&patch.files.added)
            .chain(patch.files.moved.iter().map(|(_, new)| new));
        for file in working {
            if !files.contains(&file) {
                files.push(file);
            }
        }

        let author = mapping.get(&patch.author);
        if author.is_none() {
            debug!(author = %patch.author, "patch author has no account");
        }

        for file in files {
            for reviewer in &info.reviewers {
                self.add(file, reviewer, self.policy.reviewer_weight);
            }
            if let Some(account) = author {
                self.add(file, account, self.policy.author_weight);
            }
        }
    }

    fn into_delta(self) -> FileScores {
        let mut delta = FileScores::new();
        for (file, accounts) in self.changed {
            let Some(row) = self.rows.get(&file) else {
                continue;
            };
            let out: BTreeMap<String, f64> = accounts
                .into_iter()
                .filter_map(|acc| row.get(&acc).map(|v| (acc, *v)))
                .collect();
            if !out.is_empty() {
                delta.insert(file, out);
            }
        }
        delta
    }
}

/// Score a batch of patches, oldest first, on top of `current` (the rows
/// returned by [`paths_of`]). Returns only the entries that changed, with
/// their new absolute values.
pub fn update(
    current: &FileScores,
    patches: &[Patch],
    bugs: &BTreeMap<BugId, BugInfo>,
    mapping: &IdentityMap,
    policy: &Policy,
) -> FileScores {
    let mut update = Update {
        rows: current.clone(),
        changed: BTreeMap::new(),
        policy,
    };

    for patch in patches {
        let Some(info) = bugs.get(&patch.bug_id) else {
            debug!(bug = patch.bug_id, author = %patch.author, "no bug info, patch skipped");
            continue;
        };
        update.apply(patch, info, mapping);
    }

    update.into_delta()
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
