//! Tunable constants for identity resolution and scoring.
//!
//! Every number the cascade or the scorers depend on lives here, either as
//! a named constant or as a field of [`Policy`] whose default is that
//! constant. A `revisor.toml` file can override any field:
//!
//! ```toml
//! similarity_threshold = 0.5
//! stale_after_days = 120
//! ignored_authors = ["ffxbld", "cltbld"]
//! ```

use std::collections::BTreeSet;
use std::error::Error;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Default config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "revisor.toml";

/// Cosine similarity an author must strictly exceed to match a candidate.
pub const SIMILARITY_THRESHOLD: f64 = 0.4;

/// Score credited per file to each reviewer of the patch's bug.
pub const REVIEWER_WEIGHT: f64 = 0.4;

/// Score credited per file to the patch author.
pub const AUTHOR_WEIGHT: f64 = 0.6;

/// An alias whose last patch is older than this is eligible for expiry.
pub const STALE_AFTER_DAYS: i64 = 92;

/// Number of ranked authors returned when a request does not say.
pub const DEFAULT_COUNT: usize = 5;

/// Author strings this short (in chars) or shorter are ignored.
pub const MIN_AUTHOR_LEN: usize = 3;

/// Stage 1 needs at least this many assignments to trust a unique maximum.
pub const MIN_ASSIGNMENT_MAJORITY: usize = 2;

/// Character n-gram size used by the similarity tokenizer.
pub const NGRAM_SIZE: usize = 3;

/// Assignee value the bug tracker uses for "nobody".
pub const UNASSIGNED_ACCOUNT: &str = "nobody@mozilla.org";

/// Substrings stripped before tokenizing, in match priority order.
/// Dots and spaces come after the mail domains so `.co.uk` wins over `.`.
pub const DENYLIST: &[&str] = &[
    "<", ">", "@", ".com", ".de", ".fr", ".co.uk", ".net", ".org", ".", " ", "bugzilla", "bugs",
    "bug", "gmail", "yahoo", "mozilla", "gentoo",
];

/// Runtime policy, loaded from TOML with every field defaulting to the
/// constants above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    pub similarity_threshold: f64,
    pub reviewer_weight: f64,
    pub author_weight: f64,
    pub stale_after_days: i64,
    pub default_count: usize,
    pub min_author_len: usize,
    pub unassigned_account: String,
    /// Version-control authors never aggregated (bots, release accounts).
    pub ignored_authors: BTreeSet<String>,
    /// Stage 4 worker count; `None` means `max(cpus - 1, 1)`.
    pub workers: Option<usize>,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            similarity_threshold: SIMILARITY_THRESHOLD,
            reviewer_weight: REVIEWER_WEIGHT,
            author_weight: AUTHOR_WEIGHT,
            stale_after_days: STALE_AFTER_DAYS,
            default_count: DEFAULT_COUNT,
            min_author_len: MIN_AUTHOR_LEN,
            unassigned_account: UNASSIGNED_ACCOUNT.to_string(),
            ignored_authors: BTreeSet::new(),
            workers: None,
        }
    }
}

impl Policy {
    /// Parse a policy from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, Box<dyn Error>> {
        let policy: Policy = toml::from_str(text)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Load the policy from `path`, or from `revisor.toml` in the current
    /// directory when no path is given. A missing default file yields the
    /// built-in policy; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, Box<dyn Error>> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (Path::new(CONFIG_FILE_NAME).to_path_buf(), false),
        };

        if !explicit && !path.exists() {
            return Ok(Self::default());
        }

        let text = fs::read_to_string(&path)
            .map_err(|e| format!("cannot read config {}: {e}", path.display()))?;
        Self::from_toml(&text).map_err(|e| format!("invalid config {}: {e}", path.display()).into())
    }

    fn validate(&self) -> Result<(), Box<dyn Error>> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(format!(
                "similarity_threshold must be within [0, 1], got {}",
                self.similarity_threshold
            )
            .into());
        }
        if self.reviewer_weight < 0.0 || self.author_weight < 0.0 {
            return Err("score weights must be non-negative".into());
        }
        if self.workers == Some(0) {
            return Err("workers must be at least 1".into());
        }
        Ok(())
    }

    /// Worker count for the parallel resolution stage.
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            let cpus = std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1);
            cpus.saturating_sub(1).max(1)
        })
    }

    pub fn is_ignored_author(&self, author: &str) -> bool {
        self.ignored_authors.contains(author) || author.chars().count() <= self.min_author_len
    }
}

#[cfg(test)]
#[path = "policy_test.rs"]
mod tests;
