use std::error::Error;
use std::path::{Path, PathBuf};

use git2::{BlameOptions, Repository};

use crate::sources::BlameSource;

pub struct GitRepo {
    repo: Repository,
    root: PathBuf,
}

impl GitRepo {
    pub fn open(path: &Path) -> Result<Self, Box<dyn Error>> {
        let repo = Repository::discover(path)?;
        let root = repo
            .workdir()
            .ok_or("bare repositories are not supported")?
            .to_path_buf();
        Ok(Self { repo, root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run git blame on a file at HEAD and return the author of every
    /// line, as `"Name <email>"`. `rel_path` is relative to the git root.
    pub fn blame_file(&self, rel_path: &Path) -> Result<Vec<String>, Box<dyn Error>> {
        let mut opts = BlameOptions::new();
        let blame = self.repo.blame_file(rel_path, Some(&mut opts))?;

        let mut lines = Vec::new();
        for hunk in blame.iter() {
            let sig = hunk.final_signature();
            let author = format!(
                "{} <{}>",
                sig.name().unwrap_or("unknown"),
                sig.email().unwrap_or("unknown")
            );
            lines.extend(std::iter::repeat_n(author, hunk.lines_in_hunk()));
        }
        Ok(lines)
    }
}

impl BlameSource for GitRepo {
    fn blame_lines(&self, path: &str) -> Result<Vec<String>, Box<dyn Error>> {
        self.blame_file(Path::new(path))
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
