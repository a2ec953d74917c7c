//! Partition a slice, map the chunks on a worker pool, merge the results.

use std::collections::BTreeMap;
use std::fmt::Debug;

use rayon::prelude::*;
use tracing::debug;

use super::ResolveError;

/// Split `items` into at most `workers` contiguous chunks of
/// `ceil(len / workers)` items, run `f` on each chunk in its own worker,
/// and union the per-chunk maps.
///
/// The chunks are disjoint, so two chunks producing the same key means `f`
/// is broken; that is reported as [`ResolveError::OverlappingPartitions`].
pub fn parallel_merge<T, K, V, F>(
    items: &[T],
    workers: usize,
    f: F,
) -> Result<BTreeMap<K, V>, ResolveError>
where
    T: Sync,
    K: Ord + Debug + Send,
    V: Send,
    F: Fn(&[T]) -> BTreeMap<K, V> + Sync,
{
    if items.is_empty() {
        return Ok(BTreeMap::new());
    }

    let workers = workers.max(1);
    let chunk_size = items.len().div_ceil(workers);
    debug!(
        workers,
        chunk_size,
        items = items.len(),
        "partitioning parallel work"
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()?;
    let parts: Vec<BTreeMap<K, V>> =
        pool.install(|| items.par_chunks(chunk_size).map(|chunk| f(chunk)).collect());

    merge_disjoint(parts)
}

/// Union of maps whose key sets must not intersect.
pub fn merge_disjoint<K, V>(parts: Vec<BTreeMap<K, V>>) -> Result<BTreeMap<K, V>, ResolveError>
where
    K: Ord + Debug,
{
    let mut merged = BTreeMap::new();
    for part in parts {
        for (key, value) in part {
            if merged.contains_key(&key) {
                return Err(ResolveError::OverlappingPartitions(format!("{key:?}")));
            }
            merged.insert(key, value);
        }
    }
    Ok(merged)
}

#[cfg(test)]
#[path = "parallel_test.rs"]
mod tests;
