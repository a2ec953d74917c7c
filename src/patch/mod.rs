//! Unified-diff analysis: which files a patch touches and which of their
//! existing lines it removes.

use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::path::Path;

use git2::{Delta, Diff};

use crate::model::ChangedFiles;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct PatchAnalysis {
    pub files: ChangedFiles,
    /// Pre-patch path → 1-based line numbers the patch removes. Only files
    /// that existed before and still exist after the patch appear, and only
    /// when at least one line is removed.
    pub removed_lines: BTreeMap<String, Vec<u32>>,
}

fn path_string(path: Option<&Path>) -> Option<String> {
    path.map(|p| p.to_string_lossy().into_owned())
}

pub fn analyze(text: &str) -> Result<PatchAnalysis, Box<dyn Error>> {
    let diff = Diff::from_buffer(text.as_bytes())?;

    let mut files = ChangedFiles::default();
    for delta in diff.deltas() {
        let old = path_string(delta.old_file().path());
        let new = path_string(delta.new_file().path());
        match (delta.status(), old, new) {
            (Delta::Added, _, Some(new)) => files.added.push(new),
            (Delta::Deleted, Some(old), _) => files.deleted.push(old),
            (Delta::Renamed | Delta::Copied, Some(old), Some(new)) => files.moved.push((old, new)),
            (_, Some(old), Some(new)) if old != new => files.moved.push((old, new)),
            (_, Some(old), _) => files.touched.push(old),
            (_, None, Some(new)) => files.touched.push(new),
            (_, None, None) => {}
        }
    }

    let fresh: BTreeSet<&String> = files.added.iter().chain(&files.deleted).collect();
    let mut removed_lines: BTreeMap<String, Vec<u32>> = BTreeMap::new();
    diff.foreach(
        &mut |_, _| true,
        None,
        None,
        Some(&mut |delta, _hunk, line| {
            if line.origin() != '-' {
                return true;
            }
            let (Some(path), Some(n)) = (path_string(delta.old_file().path()), line.old_lineno())
            else {
                return true;
            };
            if !fresh.contains(&path) {
                removed_lines.entry(path).or_default().push(n);
            }
            true
        }),
    )?;

    Ok(PatchAnalysis {
        files,
        removed_lines,
    })
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
