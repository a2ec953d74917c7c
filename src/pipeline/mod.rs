//! One update run: fetch what is new, fold it into the author statistics,
//! re-resolve identities, expire stale ones, score the new patches.
//!
//! A run only computes: the identity-map diff, the score delta and the next
//! aggregator state come back together in an [`Outcome`], and the caller
//! decides when and how to write them.

use std::error::Error;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use crate::contrib::{fold_bugs, merge_names, remove_obsolete, update_last_dates};
use crate::filescore;
use crate::identity;
use crate::model::{AuthorStats, FileScores};
use crate::policy::Policy;
use crate::sources::{BugTrackerSource, RevisionSource};
use crate::store::{AuthorDiff, AuthorMap, FileScoreTable};

#[derive(Debug, Default, Serialize)]
pub struct UpdateSummary {
    pub revision: Option<String>,
    pub patches: usize,
    pub bugs: usize,
    /// Authors whose participation record was created or extended.
    pub folded: usize,
    pub resolved: usize,
    pub unresolved: usize,
    pub expired: usize,
    pub inserted: usize,
    pub removed: usize,
    pub scored_files: usize,
}

pub struct Outcome {
    pub summary: UpdateSummary,
    /// Aggregator state to persist for the next run.
    pub state: AuthorStats,
    pub diff: AuthorDiff,
    /// New absolute values of every (file, account) entry the batch touched.
    pub delta: FileScores,
}

impl Outcome {
    pub fn apply(
        &self,
        authors: &mut dyn AuthorMap,
        scores: &mut dyn FileScoreTable,
    ) -> Result<(), Box<dyn Error>> {
        authors.apply_diff(&self.diff)?;
        scores.apply_diff(&self.delta)?;
        info!(
            inserted = self.summary.inserted,
            removed = self.summary.removed,
            files = self.summary.scored_files,
            "update applied"
        );
        Ok(())
    }
}

pub struct Update<'a> {
    pub revisions: &'a dyn RevisionSource,
    pub bugs: &'a dyn BugTrackerSource,
    pub policy: &'a Policy,
    pub today: NaiveDate,
}

impl Update<'_> {
    pub fn run(
        &self,
        state: &AuthorStats,
        authors: &dyn AuthorMap,
        scores: &dyn FileScoreTable,
    ) -> Result<Outcome, Box<dyn Error>> {
        let Some(batch) = self.revisions.fetch(state.last_rev.as_deref())? else {
            info!("no new revisions");
            return Ok(Outcome {
                summary: UpdateSummary {
                    revision: state.last_rev.clone(),
                    ..Default::default()
                },
                state: state.clone(),
                diff: AuthorDiff::default(),
                delta: FileScores::new(),
            });
        };
        let bugs = self.bugs.fetch(&batch.bug_ids)?;
        info!(
            revision = %batch.revision,
            patches = batch.patches.len(),
            bugs = bugs.info.len(),
            "fetched batch"
        );

        let mut next = state.clone();
        let folded = fold_bugs(&mut next.stats, &batch.per_author_bug_ids, &bugs.info, self.policy);
        merge_names(&mut next.mailnames, &bugs.mailnames);
        update_last_dates(&mut next.stats, &batch.patches);
        next.last_rev = Some(batch.revision.clone());

        let resolution = identity::resolve(next.stats.clone(), &next.mailnames, self.policy)?;
        let kept = remove_obsolete(&resolution.mapping, &next.stats, self.today, self.policy);

        let current = authors.get(&[])?;
        let diff = AuthorDiff::between(&current, &kept);
        if diff.is_empty() {
            debug!("identity map unchanged");
        }

        let rows = scores.get(&filescore::paths_of(&batch.patches))?;
        let delta = filescore::update(
            &rows,
            &batch.patches,
            &bugs.info,
            &resolution.mapping,
            self.policy,
        );

        let summary = UpdateSummary {
            revision: Some(batch.revision),
            patches: batch.patches.len(),
            bugs: bugs.info.len(),
            folded,
            resolved: resolution.mapping.len(),
            unresolved: resolution.unresolved.len(),
            expired: resolution.mapping.len() - kept.len(),
            inserted: diff.toinsert.len(),
            removed: diff.torm.len(),
            scored_files: delta.len(),
        };

        next.stats.extend(resolution.unresolved);

        Ok(Outcome {
            summary,
            state: next,
            diff,
            delta,
        })
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
