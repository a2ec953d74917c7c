//! Persistent state: the identity map, the file score table and the
//! aggregator statistics.
//!
//! Plain in-memory maps implement the store traits directly; [`JsonFile`]
//! wraps one and is written back through a [`Commit`], so several files
//! either all change or none do.

use std::collections::BTreeSet;
use std::error::Error;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::model::{FileScores, IdentityMap};

/// Changes to the identity map: entries to insert or overwrite, and
/// aliases to drop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthorDiff {
    pub toinsert: IdentityMap,
    pub torm: BTreeSet<String>,
}

impl AuthorDiff {
    pub fn between(old: &IdentityMap, new: &IdentityMap) -> Self {
        let toinsert = new
            .iter()
            .filter(|(alias, account)| old.get(*alias) != Some(*account))
            .map(|(a, b)| (a.clone(), b.clone()))
            .collect();
        let torm = old
            .keys()
            .filter(|alias| !new.contains_key(*alias))
            .cloned()
            .collect();
        Self { toinsert, torm }
    }

    pub fn is_empty(&self) -> bool {
        self.toinsert.is_empty() && self.torm.is_empty()
    }
}

pub trait AuthorMap {
    /// The entries for `names`; the whole map when `names` is empty.
    fn get(&self, names: &[String]) -> Result<IdentityMap, Box<dyn Error>>;
    fn apply_diff(&mut self, diff: &AuthorDiff) -> Result<(), Box<dyn Error>>;
}

pub trait FileScoreTable {
    /// Rows for the known files among `files`.
    fn get(&self, files: &[String]) -> Result<FileScores, Box<dyn Error>>;
    /// Set every entry of `delta` to its (absolute) value.
    fn apply_diff(&mut self, delta: &FileScores) -> Result<(), Box<dyn Error>>;
}

impl AuthorMap for IdentityMap {
    fn get(&self, names: &[String]) -> Result<IdentityMap, Box<dyn Error>> {
        if names.is_empty() {
            return Ok(self.clone());
        }
        Ok(names
            .iter()
            .filter_map(|n| self.get_key_value(n))
            .map(|(a, b)| (a.clone(), b.clone()))
            .collect())
    }

    fn apply_diff(&mut self, diff: &AuthorDiff) -> Result<(), Box<dyn Error>> {
        for alias in &diff.torm {
            self.remove(alias);
        }
        self.extend(diff.toinsert.iter().map(|(a, b)| (a.clone(), b.clone())));
        Ok(())
    }
}

impl FileScoreTable for FileScores {
    fn get(&self, files: &[String]) -> Result<FileScores, Box<dyn Error>> {
        Ok(files
            .iter()
            .filter_map(|f| self.get_key_value(f))
            .map(|(f, row)| (f.clone(), row.clone()))
            .collect())
    }

    fn apply_diff(&mut self, delta: &FileScores) -> Result<(), Box<dyn Error>> {
        for (file, entries) in delta {
            let row = self.entry(file.clone()).or_default();
            for (account, score) in entries {
                row.insert(account.clone(), *score);
            }
        }
        Ok(())
    }
}

/// Read JSON from `path`; a missing file yields the default value.
pub fn load_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, Box<dyn Error>> {
    if !path.exists() {
        debug!(path = %path.display(), "no such file, starting empty");
        return Ok(T::default());
    }
    let text = fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let value =
        serde_json::from_str(&text).map_err(|e| format!("cannot parse {}: {e}", path.display()))?;
    Ok(value)
}

/// Pending writes. Each value is serialized to a temporary file next to
/// its target; nothing is renamed into place until [`Commit::persist`].
#[derive(Default)]
pub struct Commit {
    staged: Vec<(NamedTempFile, PathBuf)>,
}

impl Commit {
    pub fn stage<T: Serialize>(&mut self, path: &Path, value: &T) -> Result<(), Box<dyn Error>> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let cannot = |e: std::io::Error| format!("cannot write {}: {e}", path.display());
        fs::create_dir_all(dir).map_err(cannot)?;
        let mut tmp = NamedTempFile::new_in(dir).map_err(cannot)?;
        serde_json::to_writer_pretty(&mut tmp, value)?;
        tmp.write_all(b"\n").map_err(cannot)?;
        tmp.as_file().sync_all().map_err(cannot)?;
        self.staged.push((tmp, path.to_path_buf()));
        Ok(())
    }

    /// Rename every staged file over its target, in staging order.
    pub fn persist(self) -> Result<(), Box<dyn Error>> {
        let count = self.staged.len();
        for (tmp, path) in self.staged {
            tmp.persist(&path)
                .map_err(|e| format!("cannot write {}: {}", path.display(), e.error))?;
        }
        debug!(files = count, "commit persisted");
        Ok(())
    }
}

/// A store backed by a JSON file. Diffs change the in-memory copy only;
/// [`JsonFile::stage`] queues it for writing.
pub struct JsonFile<T> {
    path: PathBuf,
    data: T,
}

impl<T: Serialize + DeserializeOwned + Default> JsonFile<T> {
    pub fn open(path: &Path) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            path: path.to_path_buf(),
            data: load_json(path)?,
        })
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn set(&mut self, data: T) {
        self.data = data;
    }

    pub fn stage(&self, commit: &mut Commit) -> Result<(), Box<dyn Error>> {
        commit.stage(&self.path, &self.data)
    }
}

impl<T: AuthorMap + Serialize + DeserializeOwned + Default> AuthorMap for JsonFile<T> {
    fn get(&self, names: &[String]) -> Result<IdentityMap, Box<dyn Error>> {
        self.data.get(names)
    }

    fn apply_diff(&mut self, diff: &AuthorDiff) -> Result<(), Box<dyn Error>> {
        self.data.apply_diff(diff)
    }
}

impl<T: FileScoreTable + Serialize + DeserializeOwned + Default> FileScoreTable for JsonFile<T> {
    fn get(&self, files: &[String]) -> Result<FileScores, Box<dyn Error>> {
        self.data.get(files)
    }

    fn apply_diff(&mut self, delta: &FileScores) -> Result<(), Box<dyn Error>> {
        self.data.apply_diff(delta)
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
