//! Contribution aggregation: bug participation folded into long-lived
//! per-author counters, plus expiry of identities nobody uses any more.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::model::{BugId, BugInfo, Counts, IdentityMap, ParticipationRecord, Patch, RealNameIndex};
use crate::policy::Policy;

fn add_counts(into: &mut Counts, from: &Counts) {
    for (id, n) in from {
        *into.entry(id.clone()).or_insert(0) += n;
    }
}

/// Fold the participants of each author's bugs into `stats`.
///
/// Ignored and too-short authors are skipped. Bugs without info are
/// skipped. Returns the number of authors whose record was touched.
pub fn fold_bugs(
    stats: &mut BTreeMap<String, ParticipationRecord>,
    per_author_bug_ids: &BTreeMap<String, BTreeSet<BugId>>,
    bugs: &BTreeMap<BugId, BugInfo>,
    policy: &Policy,
) -> usize {
    let mut touched = 0;
    for (author, bug_ids) in per_author_bug_ids {
        if policy.is_ignored_author(author) {
            debug!(author = %author, "ignored author");
            continue;
        }

        let record = stats.entry(author.clone()).or_default();
        touched += 1;

        for info in bug_ids.iter().filter_map(|id| bugs.get(id)) {
            if !info.assignee.is_empty() && info.assignee != policy.unassigned_account {
                *record.assignees.entry(info.assignee.clone()).or_insert(0) += 1;
            }
            add_counts(&mut record.attachers, &info.attachers);
            add_counts(&mut record.commenters, &info.commenters);
            add_counts(&mut record.reviewees, &info.reviewees);
        }
    }
    touched
}

/// Union newly seen display names into the index.
pub fn merge_names(index: &mut RealNameIndex, new: &RealNameIndex) {
    for (account, names) in new {
        index
            .entry(account.clone())
            .or_default()
            .extend(names.iter().cloned());
    }
}

/// Record the most recent patch date of every known author.
pub fn update_last_dates(stats: &mut BTreeMap<String, ParticipationRecord>, patches: &[Patch]) {
    for patch in patches {
        if let Some(record) = stats.get_mut(&patch.author)
            && record.last_patch_date.is_none_or(|last| patch.date > last)
        {
            record.last_patch_date = Some(patch.date);
        }
    }
}

/// True when the last patch is more than `days` before `today`, or unknown.
pub fn is_stale(last: Option<NaiveDate>, today: NaiveDate, days: i64) -> bool {
    match last {
        Some(last) => (today - last).num_days() > days,
        None => true,
    }
}

/// Drop aliases that went quiet, but only when every alias of the same
/// account went quiet too: one active alias keeps all of them.
pub fn remove_obsolete(
    mapping: &IdentityMap,
    stats: &BTreeMap<String, ParticipationRecord>,
    today: NaiveDate,
    policy: &Policy,
) -> IdentityMap {
    let mut aliases: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for (alias, account) in mapping {
        aliases.entry(account).or_default().insert(alias);
    }

    let stale: BTreeSet<&str> = mapping
        .keys()
        .map(String::as_str)
        .filter(|alias| {
            let last = stats.get(*alias).and_then(|r| r.last_patch_date);
            is_stale(last, today, policy.stale_after_days)
        })
        .collect();

    let mut kept = IdentityMap::new();
    for (alias, account) in mapping {
        let all_quiet = aliases
            .get(account.as_str())
            .is_some_and(|group| group.is_subset(&stale));
        if stale.contains(alias.as_str()) && all_quiet {
            info!(alias = %alias, account = %account, "expiring stale identity");
            continue;
        }
        kept.insert(alias.clone(), account.clone());
    }
    kept
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
