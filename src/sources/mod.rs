//! Where revisions, bug data and line attribution come from.
//!
//! The update run only sees the traits. The JSON snapshot types below are
//! what the command line feeds it: exports of a revision log and of bug
//! tracker data, read from disk.

use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::{BugId, BugInfo, ChangedFiles, Patch, RealNameIndex};
use crate::store::load_json;

/// New revisions since the last processed one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RevisionBatch {
    /// Newest revision in the batch; the next run starts after it.
    pub revision: String,
    pub per_author_bug_ids: BTreeMap<String, BTreeSet<BugId>>,
    pub bug_ids: BTreeSet<BugId>,
    /// Oldest first.
    pub patches: Vec<Patch>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BugBatch {
    pub info: BTreeMap<BugId, BugInfo>,
    pub mailnames: RealNameIndex,
}

pub trait RevisionSource {
    /// `None` when nothing happened after `since`.
    fn fetch(&self, since: Option<&str>) -> Result<Option<RevisionBatch>, Box<dyn Error>>;
}

pub trait BugTrackerSource {
    fn fetch(&self, bug_ids: &BTreeSet<BugId>) -> Result<BugBatch, Box<dyn Error>>;
}

/// Line attribution at the current head: entry `i` is the author of line
/// `i + 1`.
pub trait BlameSource {
    fn blame_lines(&self, path: &str) -> Result<Vec<String>, Box<dyn Error>>;
}

/// One entry of an exported revision log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedRevision {
    pub rev: String,
    pub author: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub bug_id: Option<BugId>,
    #[serde(default)]
    pub files: ChangedFiles,
}

/// Revision log snapshot, oldest revision first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevisionLog {
    #[serde(default)]
    pub revisions: Vec<LoggedRevision>,
}

impl RevisionLog {
    pub fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        load_json(path)
    }

    fn after(&self, since: Option<&str>) -> &[LoggedRevision] {
        let Some(since) = since else {
            return &self.revisions;
        };
        match self.revisions.iter().position(|r| r.rev == since) {
            Some(i) => &self.revisions[i + 1..],
            None => {
                warn!(rev = %since, "last processed revision not in log, reading all of it");
                &self.revisions
            }
        }
    }
}

impl RevisionSource for RevisionLog {
    fn fetch(&self, since: Option<&str>) -> Result<Option<RevisionBatch>, Box<dyn Error>> {
        let fresh = self.after(since);
        let Some(last) = fresh.last() else {
            return Ok(None);
        };

        let mut batch = RevisionBatch {
            revision: last.rev.clone(),
            ..Default::default()
        };
        for entry in fresh {
            let Some(bug_id) = entry.bug_id else {
                debug!(rev = %entry.rev, "revision without bug");
                continue;
            };
            batch
                .per_author_bug_ids
                .entry(entry.author.clone())
                .or_default()
                .insert(bug_id);
            batch.bug_ids.insert(bug_id);
            batch.patches.push(Patch {
                author: entry.author.clone(),
                date: entry.date,
                files: entry.files.clone(),
                bug_id,
            });
        }
        Ok(Some(batch))
    }
}

/// Bug tracker snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BugSnapshot {
    #[serde(default)]
    pub bugs: BTreeMap<BugId, BugInfo>,
    #[serde(default)]
    pub mailnames: RealNameIndex,
}

impl BugSnapshot {
    pub fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        load_json(path)
    }
}

fn people(info: &BugInfo) -> impl Iterator<Item = &String> {
    std::iter::once(&info.assignee)
        .chain(info.attachers.keys())
        .chain(info.commenters.keys())
        .chain(info.reviewees.keys())
        .chain(&info.reviewers)
}

impl BugTrackerSource for BugSnapshot {
    /// Info for the requested bugs that the snapshot knows, and the display
    /// names of everybody taking part in them.
    fn fetch(&self, bug_ids: &BTreeSet<BugId>) -> Result<BugBatch, Box<dyn Error>> {
        let info: BTreeMap<BugId, BugInfo> = bug_ids
            .iter()
            .filter_map(|id| self.bugs.get(id).map(|b| (*id, b.clone())))
            .collect();

        let involved: BTreeSet<&String> = info.values().flat_map(people).collect();
        let mailnames = self
            .mailnames
            .iter()
            .filter(|(account, _)| involved.contains(account))
            .map(|(account, names)| (account.clone(), names.clone()))
            .collect();

        debug!(requested = bug_ids.len(), found = info.len(), "bug snapshot fetch");
        Ok(BugBatch { info, mailnames })
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
