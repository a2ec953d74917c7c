//! The five resolution heuristics.
//!
//! Each stage is a thin [`Stage`] wrapper around a per-author picker so the
//! heuristics can be tested on single records.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use super::parallel::parallel_merge;
use super::{Pending, ResolveError, Stage, StageContext};
use crate::model::{Counts, IdentityMap, ParticipationRecord, RealNameIndex};
use crate::policy::MIN_ASSIGNMENT_MAJORITY;
use crate::similarity::is_similar;

static MAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([^>]*)>").expect("mail pattern is valid"));

/// Apply a per-record picker to every pending author.
fn pick_each(
    pending: &Pending,
    mut pick: impl FnMut(&str, &ParticipationRecord) -> Option<String>,
) -> IdentityMap {
    pending
        .iter()
        .filter_map(|(author, record)| pick(author.as_str(), record).map(|acc| (author.clone(), acc)))
        .collect()
}

/// Stage 1: the account the author's bugs were most often assigned to.
pub struct AssignmentMajority;

impl Stage for AssignmentMajority {
    fn name(&self) -> &'static str {
        "assignment-majority"
    }

    fn resolve(
        &self,
        pending: &Pending,
        _ctx: &StageContext<'_>,
    ) -> Result<IdentityMap, ResolveError> {
        Ok(pick_each(pending, |_, record| by_assignment(record)))
    }
}

/// A unique maximum of at least two assignments wins outright. A tied
/// maximum, or a maximum of one, is settled only if exactly one of the tied
/// accounts also attached patches and asked for review.
pub fn by_assignment(record: &ParticipationRecord) -> Option<String> {
    let max = *record.assignees.values().max()?;
    if max == 0 {
        return None;
    }

    let tied: Vec<&String> = record
        .assignees
        .iter()
        .filter(|(_, n)| **n == max)
        .map(|(acc, _)| acc)
        .collect();

    if max >= MIN_ASSIGNMENT_MAJORITY && tied.len() == 1 {
        return Some(tied[0].clone());
    }

    let mut both = tied
        .into_iter()
        .filter(|acc| record.attachers.contains_key(*acc) && record.reviewees.contains_key(*acc));
    let only = both.next()?;
    if both.next().is_some() {
        return None;
    }
    Some(only.clone())
}

/// Stage 2: the author string carries a participant's address.
pub struct DirectMail;

impl Stage for DirectMail {
    fn name(&self) -> &'static str {
        "direct-mail"
    }

    fn resolve(
        &self,
        pending: &Pending,
        _ctx: &StageContext<'_>,
    ) -> Result<IdentityMap, ResolveError> {
        Ok(pick_each(pending, by_mail))
    }
}

/// `"Jane Roe <jane@x.org>"` resolves to `jane@x.org` when that address took
/// part in the author's bugs. An author string without `<...>` that is
/// itself a participant (`"jane@x.org"`) resolves to itself.
pub fn by_mail(author: &str, record: &ParticipationRecord) -> Option<String> {
    let participants = record.participants();
    match MAIL_RE.captures(author) {
        Some(caps) => {
            let email = caps.get(1)?.as_str();
            participants.contains(email).then(|| email.to_string())
        }
        None => participants.contains(author).then(|| author.to_string()),
    }
}

/// Stage 3: fuzzy match against the participants of the author's bugs.
pub struct ParticipantSimilarity;

impl Stage for ParticipantSimilarity {
    fn name(&self) -> &'static str {
        "participant-similarity"
    }

    fn resolve(
        &self,
        pending: &Pending,
        ctx: &StageContext<'_>,
    ) -> Result<IdentityMap, ResolveError> {
        let threshold = ctx.policy.similarity_threshold;
        Ok(pick_each(pending, |author, record| {
            by_participant_similarity(author, record, ctx.mailnames, threshold)
        }))
    }
}

/// First participant (in key order) whose identifier, or failing that one
/// of whose display names, is similar to `author`.
pub fn by_participant_similarity(
    author: &str,
    record: &ParticipationRecord,
    mailnames: &RealNameIndex,
    threshold: f64,
) -> Option<String> {
    record
        .participants()
        .into_iter()
        .find(|participant| {
            is_similar(author, participant, threshold)
                || mailnames
                    .get(*participant)
                    .is_some_and(|names| names.iter().any(|n| is_similar(author, n, threshold)))
        })
        .map(str::to_string)
}

/// Stage 4: fuzzy match against the accounts resolved so far. The only
/// quadratic stage, so it is spread over a worker pool.
pub struct ResolvedSimilarity;

impl Stage for ResolvedSimilarity {
    fn name(&self) -> &'static str {
        "resolved-similarity"
    }

    fn resolve(
        &self,
        pending: &Pending,
        ctx: &StageContext<'_>,
    ) -> Result<IdentityMap, ResolveError> {
        let accounts = resolved_accounts(ctx.mapping);
        if accounts.is_empty() {
            return Ok(IdentityMap::new());
        }

        let threshold = ctx.policy.similarity_threshold;
        let authors: Vec<&str> = pending.keys().map(String::as_str).collect();

        parallel_merge(&authors, ctx.policy.worker_count(), |chunk| {
            chunk
                .iter()
                .filter_map(|author| {
                    by_resolved_similarity(author, &accounts, threshold)
                        .map(|acc| (author.to_string(), acc))
                })
                .collect()
        })
    }
}

/// Accounts present in `mapping`, each once, in map order.
fn resolved_accounts(mapping: &IdentityMap) -> Vec<&str> {
    let mut seen = BTreeSet::new();
    mapping
        .values()
        .map(String::as_str)
        .filter(|acc| seen.insert(*acc))
        .collect()
}

pub fn by_resolved_similarity(author: &str, accounts: &[&str], threshold: f64) -> Option<String> {
    accounts
        .iter()
        .find(|acc| is_similar(author, acc, threshold))
        .map(|acc| acc.to_string())
}

fn count(map: &Counts, id: &str) -> usize {
    map.get(id).copied().unwrap_or(0)
}

/// Stage 5: whoever took part most, with comments as the tie-breaker.
pub struct WeightedFallback;

impl Stage for WeightedFallback {
    fn name(&self) -> &'static str {
        "weighted-fallback"
    }

    fn resolve(
        &self,
        pending: &Pending,
        _ctx: &StageContext<'_>,
    ) -> Result<IdentityMap, ResolveError> {
        Ok(pick_each(pending, |_, record| by_weight(record)))
    }
}

/// A single assignee wins. Otherwise every candidate (the assignees, or the
/// attachers and reviewees when nobody was assigned) is weighted by
/// `assigned + attached + review requests`; a unique maximum wins. Ties,
/// and records with no candidates at all, go to the most frequent commenter
/// among the tied (or among all commenters). Without commenters the author
/// stays unresolved.
pub fn by_weight(record: &ParticipationRecord) -> Option<String> {
    if record.assignees.len() == 1 {
        return record.assignees.keys().next().cloned();
    }

    let candidates: Vec<(&String, usize)> = if record.assignees.is_empty() {
        let people: BTreeSet<&String> = record
            .attachers
            .keys()
            .chain(record.reviewees.keys())
            .collect();
        people.into_iter().map(|p| (p, 0)).collect()
    } else {
        record.assignees.iter().map(|(p, n)| (p, *n)).collect()
    };

    let weighted: Vec<(&String, usize)> = candidates
        .into_iter()
        .map(|(p, base)| (p, base + count(&record.attachers, p) + count(&record.reviewees, p)))
        .collect();

    let tied: Vec<&String> = match weighted.iter().map(|(_, w)| *w).max() {
        Some(max) => {
            let tied: Vec<&String> = weighted
                .iter()
                .filter(|(_, w)| *w == max)
                .map(|(p, _)| *p)
                .collect();
            if tied.len() == 1 {
                return Some(tied[0].clone());
            }
            tied
        }
        None => record.commenters.keys().collect(),
    };

    if record.commenters.is_empty() {
        return None;
    }

    let mut best: Option<(&String, usize)> = None;
    for p in tied {
        let n = count(&record.commenters, p);
        if best.is_none_or(|(_, b)| n > b) {
            best = Some((p, n));
        }
    }
    best.map(|(p, _)| p.clone())
}

#[cfg(test)]
#[path = "stages_test.rs"]
mod tests;
