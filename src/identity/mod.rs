//! Identity resolution: version-control author → bug-tracker account.
//!
//! Five stages run in a fixed order, from the most confident heuristic to
//! the weakest. Each stage looks at an immutable snapshot of the authors
//! still pending and returns only the ones it resolved; the orchestrator
//! removes those from the pending set and adds them to the map before the
//! next stage starts. A resolved author is never looked at again.
//!
//! 1. assignment majority
//! 2. mail address found among the bug participants
//! 3. fuzzy match against bug participants (and their display names)
//! 4. fuzzy match against accounts already resolved, in parallel
//! 5. participation-weighted fallback

pub mod parallel;
pub mod stages;

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;
use tracing::{debug, info};

use crate::model::{IdentityMap, ParticipationRecord, RealNameIndex};
use crate::policy::Policy;

/// Authors still waiting for an account, with their participation data.
pub type Pending = BTreeMap<String, ParticipationRecord>;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("author {0} was resolved by more than one partition")]
    OverlappingPartitions(String),
    #[error("stage {stage} resolved {author:?}, which was not pending")]
    NotPending { stage: &'static str, author: String },
    #[error("cannot build resolver worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Read-only inputs a stage may consult besides the pending snapshot.
pub struct StageContext<'a> {
    pub mapping: &'a IdentityMap,
    pub mailnames: &'a RealNameIndex,
    pub policy: &'a Policy,
}

/// One step of the cascade.
pub trait Stage {
    fn name(&self) -> &'static str;

    /// Return the authors of `pending` this stage can resolve. Must not
    /// return authors outside `pending`.
    fn resolve(
        &self,
        pending: &Pending,
        ctx: &StageContext<'_>,
    ) -> Result<IdentityMap, ResolveError>;
}

/// The stages, in precedence order.
pub fn cascade() -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(stages::AssignmentMajority),
        Box::new(stages::DirectMail),
        Box::new(stages::ParticipantSimilarity),
        Box::new(stages::ResolvedSimilarity),
        Box::new(stages::WeightedFallback),
    ]
}

/// What a single stage did: the authors it resolved and the rest.
pub struct StageOutcome {
    pub resolved: IdentityMap,
    pub unresolved: Pending,
}

/// Final result of a cascade. Every input author is a key of exactly one
/// of the two maps.
#[derive(Debug, Default)]
pub struct Resolution {
    pub mapping: IdentityMap,
    pub unresolved: Pending,
}

/// Run `stage` over `pending`, merge its resolutions into `mapping`, and
/// hand back what is left.
pub fn run_stage(
    stage: &dyn Stage,
    pending: Pending,
    mapping: &mut IdentityMap,
    mailnames: &RealNameIndex,
    policy: &Policy,
) -> Result<StageOutcome, ResolveError> {
    let resolved = {
        let ctx = StageContext {
            mapping: &*mapping,
            mailnames,
            policy,
        };
        stage.resolve(&pending, &ctx)?
    };

    if let Some(author) = resolved.keys().find(|a| !pending.contains_key(*a)) {
        return Err(ResolveError::NotPending {
            stage: stage.name(),
            author: author.clone(),
        });
    }

    let unresolved: Pending = pending
        .into_iter()
        .filter(|(author, _)| !resolved.contains_key(author))
        .collect();

    mapping.extend(resolved.iter().map(|(a, b)| (a.clone(), b.clone())));

    info!(
        stage = stage.name(),
        resolved = resolved.len(),
        pending = unresolved.len(),
        "resolution stage done"
    );

    Ok(StageOutcome {
        resolved,
        unresolved,
    })
}

/// Resolve every author of `records` from scratch.
pub fn resolve(
    records: Pending,
    mailnames: &RealNameIndex,
    policy: &Policy,
) -> Result<Resolution, ResolveError> {
    resolve_from(IdentityMap::new(), records, mailnames, policy)
}

/// Resolve `records` on top of an existing partial map. Authors already in
/// `seed` keep their account and are not re-evaluated.
pub fn resolve_from(
    seed: IdentityMap,
    records: Pending,
    mailnames: &RealNameIndex,
    policy: &Policy,
) -> Result<Resolution, ResolveError> {
    let mut mapping = seed;
    let mut pending: Pending = records
        .into_iter()
        .filter(|(author, _)| !mapping.contains_key(author))
        .collect();

    for stage in cascade() {
        if pending.is_empty() {
            break;
        }
        pending = run_stage(stage.as_ref(), pending, &mut mapping, mailnames, policy)?.unresolved;
    }

    for (author, record) in &pending {
        if record.is_empty() {
            info!(author = %author, "no bug participation, cannot resolve");
        } else {
            info!(author = %author, "no bug-tracker account found");
        }
    }

    cleanup(&mapping, &mut pending);

    Ok(Resolution {
        mapping,
        unresolved: pending,
    })
}

/// Remove from every unresolved record the participants that are already
/// someone's resolved account, so they cannot be matched again later.
pub fn cleanup(mapping: &IdentityMap, pending: &mut Pending) {
    let accounts: BTreeSet<&str> = mapping.values().map(String::as_str).collect();
    for (author, record) in pending.iter_mut() {
        let taken: Vec<String> = record
            .participants()
            .into_iter()
            .filter(|p| accounts.contains(p))
            .map(str::to_string)
            .collect();
        if !taken.is_empty() {
            debug!(author = %author, removed = taken.len(), "dropping resolved accounts from record");
        }
        for id in taken {
            record.forget(&id);
        }
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
