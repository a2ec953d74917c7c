//! Reviewer ranking.
//!
//! Candidates for a patch are scored from three signals, each normalised
//! to sum to one before they are added up:
//!
//! - who last wrote the lines the patch removes,
//! - who last wrote any line of the files whose lines are removed,
//! - accumulated ownership of the changed files.
//!
//! The first two need line attribution and are optional. Ties keep the
//! order in which candidates were first seen.

pub mod report;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::error::Error;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::{FileScores, IdentityMap};
use crate::patch::PatchAnalysis;
use crate::sources::BlameSource;
use crate::store::FileScoreTable;

/// Insertion-ordered accumulator of scores per candidate.
#[derive(Debug, Clone, Default)]
pub struct ScoreVector {
    entries: Vec<(String, f64)>,
    index: HashMap<String, usize>,
}

impl ScoreVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str, score: f64) {
        match self.index.get(name) {
            Some(&i) => self.entries[i].1 += score,
            None => {
                self.index.insert(name.to_string(), self.entries.len());
                self.entries.push((name.to_string(), score));
            }
        }
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.index.get(name).map(|&i| self.entries[i].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(n, s)| (n.as_str(), *s))
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, s)| s).sum()
    }

    /// Keep only the candidates for which `keep` holds, order preserved.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.entries.retain(|(n, _)| keep(n));
        self.reindex();
    }

    pub fn remove(&mut self, name: &str) -> Option<f64> {
        let i = self.index.remove(name)?;
        let (_, score) = self.entries.remove(i);
        self.reindex();
        Some(score)
    }

    fn reindex(&mut self) {
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, (n, _))| (n.clone(), i))
            .collect();
    }

    /// Each score divided by the total. Empty when the total is not
    /// positive.
    pub fn percent(&self) -> ScoreVector {
        let total = self.total();
        if total <= 0.0 {
            return ScoreVector::new();
        }
        self.iter().map(|(n, s)| (n.to_string(), s / total)).collect()
    }

    /// Add every score of `other`, appending unseen candidates.
    pub fn merge(&mut self, other: &ScoreVector) {
        for (name, score) in other.iter() {
            self.add(name, score);
        }
    }

    /// Best `count` candidates, highest first, ties in first-seen order.
    pub fn ranked(mut self, count: usize) -> Vec<RankedAuthor> {
        self.entries.sort_by(|a, b| b.1.total_cmp(&a.1));
        self.entries.truncate(count);
        self.entries
            .into_iter()
            .map(|(name, score)| RankedAuthor {
                name,
                score: display_score(score),
            })
            .collect()
    }
}

impl FromIterator<(String, f64)> for ScoreVector {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut v = ScoreVector::new();
        for (name, score) in iter {
            v.add(&name, score);
        }
        v
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedAuthor {
    pub name: String,
    pub score: f64,
}

/// A fraction as a percentage truncated to one decimal: `0.6789` → `67.8`.
pub fn display_score(score: f64) -> f64 {
    (score * 1000.0).floor() / 10.0
}

/// Accounts that currently have at least one alias.
pub fn active_accounts(mapping: &IdentityMap) -> BTreeSet<&str> {
    mapping.values().map(String::as_str).collect()
}

/// Ownership share of every account over `files`, restricted to `accounts`.
///
/// Shares are computed before the restriction, so retired accounts still
/// dilute the others.
pub fn gathered_stats(rows: &FileScores, files: &[String], accounts: &BTreeSet<&str>) -> ScoreVector {
    let mut sums = ScoreVector::new();
    for row in files.iter().filter_map(|f| rows.get(f)) {
        for (account, score) in row {
            sums.add(account, *score);
        }
    }
    let mut shares = sums.percent();
    shares.retain(|account| accounts.contains(account));
    shares
}

/// Raw line attribution for a patch, keyed by version-control author.
#[derive(Debug, Clone, Default)]
pub struct BlameStats {
    pub deleted: ScoreVector,
    pub all_lines: ScoreVector,
}

impl BlameStats {
    /// Blame every file with removed lines. Files that cannot be blamed are
    /// skipped.
    pub fn collect(source: &dyn BlameSource, removed: &BTreeMap<String, Vec<u32>>) -> Self {
        let mut stats = BlameStats::default();
        for (path, lines) in removed {
            let authors = match source.blame_lines(path) {
                Ok(authors) => authors,
                Err(err) => {
                    warn!(path = %path, error = %err, "cannot blame file");
                    continue;
                }
            };
            for n in lines {
                match (*n as usize).checked_sub(1).and_then(|i| authors.get(i)) {
                    Some(author) => stats.deleted.add(author, 1.0),
                    None => debug!(path = %path, line = n, "removed line beyond blame"),
                }
            }
            for author in &authors {
                stats.all_lines.add(author, 1.0);
            }
        }
        stats
    }

    /// Both tallies normalised, then expressed in accounts.
    pub fn to_accounts(&self, mapping: &IdentityMap) -> (ScoreVector, ScoreVector) {
        (
            remap(&self.deleted.percent(), mapping),
            remap(&self.all_lines.percent(), mapping),
        )
    }
}

/// Author scores expressed per account. Unmapped authors are dropped and
/// aliases of one account are summed.
pub fn remap(scores: &ScoreVector, mapping: &IdentityMap) -> ScoreVector {
    let mut out = ScoreVector::new();
    for (author, score) in scores.iter() {
        if let Some(account) = mapping.get(author) {
            out.add(account, score);
        }
    }
    out
}

/// Ranking against the current identity map and score table.
pub struct Ranker<'a> {
    pub mapping: &'a IdentityMap,
    pub scores: &'a dyn FileScoreTable,
    pub blame: Option<&'a dyn BlameSource>,
}

impl Ranker<'_> {
    /// Suggested reviewers for a patch. `exclude` is the patch author's
    /// account.
    pub fn reviewers(
        &self,
        analysis: &PatchAnalysis,
        exclude: Option<&str>,
        count: usize,
    ) -> Result<Vec<RankedAuthor>, Box<dyn Error>> {
        let files = analysis.files.ranking_files();
        let rows = self.scores.get(&files)?;
        let accounts = active_accounts(self.mapping);

        let mut combined = ScoreVector::new();
        if let Some(source) = self.blame {
            let stats = BlameStats::collect(source, &analysis.removed_lines);
            let (deleted, all_lines) = stats.to_accounts(self.mapping);
            combined.merge(&deleted);
            combined.merge(&all_lines);
        }
        combined.merge(&gathered_stats(&rows, &files, &accounts));

        if let Some(author) = exclude {
            combined.remove(author);
        }
        debug!(files = files.len(), candidates = combined.len(), "ranked reviewers");
        Ok(combined.ranked(count))
    }

    /// Main contributors to `files`, by accumulated ownership only.
    pub fn top(&self, files: &[String], count: usize) -> Result<Vec<RankedAuthor>, Box<dyn Error>> {
        let rows = self.scores.get(files)?;
        let accounts = active_accounts(self.mapping);
        Ok(gathered_stats(&rows, files, &accounts).ranked(count))
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
