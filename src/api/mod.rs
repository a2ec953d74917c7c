//! Request handling for reviewer suggestions, top contributors and
//! identity lookups.
//!
//! Requests arrive as JSON values. A malformed request never aborts: the
//! response carries an empty result and a readable `error`.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::model::IdentityMap;
use crate::patch;
use crate::policy::Policy;
use crate::ranking::{RankedAuthor, Ranker};
use crate::sources::BlameSource;
use crate::store::{AuthorMap, FileScoreTable};

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("invalid payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unknown author kind {0:?}, expected \"hg\" or \"bz\"")]
    UnknownAuthorKind(String),
    #[error("invalid boolean {0:?}, expected \"true\" or \"false\"")]
    InvalidFlag(String),
    #[error("empty file list")]
    EmptyFileList,
    #[error("cannot parse patch: {0}")]
    Patch(String),
    #[error("{0}")]
    Store(String),
}

/// Who the patch author identifier refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthorKind {
    /// A version-control author string, looked up in the identity map.
    #[default]
    Hg,
    /// Already a bug-tracker account.
    Bz,
}

impl FromStr for AuthorKind {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hg" => Ok(AuthorKind::Hg),
            "bz" => Ok(AuthorKind::Bz),
            other => Err(RequestError::UnknownAuthorKind(other.to_string())),
        }
    }
}

/// A boolean that may also arrive as the text `"true"` or `"false"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Text(String),
}

impl Flag {
    fn value(&self) -> Result<bool, RequestError> {
        match self {
            Flag::Bool(b) => Ok(*b),
            Flag::Text(s) => match s.to_lowercase().as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(RequestError::InvalidFlag(s.clone())),
            },
        }
    }
}

/// One string or a list of strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawReviewerRequest {
    patch_text: String,
    author_id: String,
    #[serde(default)]
    author_kind: Option<String>,
    #[serde(default)]
    use_blame: Option<Flag>,
    #[serde(default)]
    count: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewerRequest {
    pub patch_text: String,
    pub author_id: String,
    pub author_kind: AuthorKind,
    pub use_blame: bool,
    pub count: usize,
}

impl ReviewerRequest {
    pub fn parse(payload: &Value, policy: &Policy) -> Result<Self, RequestError> {
        let raw = RawReviewerRequest::deserialize(payload)?;
        let author_kind = match raw.author_kind.as_deref() {
            Some(kind) => kind.parse()?,
            None => AuthorKind::default(),
        };
        let use_blame = match &raw.use_blame {
            Some(flag) => flag.value()?,
            None => true,
        };
        Ok(Self {
            patch_text: raw.patch_text,
            author_id: raw.author_id,
            author_kind,
            use_blame,
            count: raw.count.unwrap_or(policy.default_count),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawTopRequest {
    file_list: OneOrMany,
    #[serde(default)]
    count: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopRequest {
    pub files: Vec<String>,
    pub count: usize,
}

impl TopRequest {
    pub fn parse(payload: &Value, policy: &Policy) -> Result<Self, RequestError> {
        let raw = RawTopRequest::deserialize(payload)?;
        let files: Vec<String> = raw
            .file_list
            .into_vec()
            .into_iter()
            .filter(|f| !f.is_empty())
            .collect();
        if files.is_empty() {
            return Err(RequestError::EmptyFileList);
        }
        Ok(Self {
            files,
            count: raw.count.unwrap_or(policy.default_count),
        })
    }
}

/// Names for an identity lookup: a string, a list of strings, or
/// `{"names": ...}` with either. An empty list asks for the whole map.
pub fn parse_author_query(payload: &Value) -> Result<Vec<String>, RequestError> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Query {
        Bare(OneOrMany),
        Named { names: OneOrMany },
    }

    let names = match Query::deserialize(payload)? {
        Query::Bare(names) | Query::Named { names } => names.into_vec(),
    };
    Ok(names)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RankResponse {
    pub ranked_authors: Vec<RankedAuthor>,
    pub error: String,
}

impl From<Result<Vec<RankedAuthor>, RequestError>> for RankResponse {
    fn from(result: Result<Vec<RankedAuthor>, RequestError>) -> Self {
        match result {
            Ok(ranked_authors) => Self {
                ranked_authors,
                error: String::new(),
            },
            Err(err) => {
                warn!(error = %err, "request failed");
                Self {
                    ranked_authors: Vec::new(),
                    error: err.to_string(),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MappingResponse {
    pub mapping: IdentityMap,
    pub error: String,
}

/// Answers requests against the current stores.
pub struct Service<'a> {
    pub authors: &'a dyn AuthorMap,
    pub scores: &'a dyn FileScoreTable,
    pub blame: Option<&'a dyn BlameSource>,
    pub policy: &'a Policy,
}

fn store_error(err: Box<dyn std::error::Error>) -> RequestError {
    RequestError::Store(err.to_string())
}

impl Service<'_> {
    pub fn reviewers(&self, payload: &Value) -> RankResponse {
        ReviewerRequest::parse(payload, self.policy)
            .and_then(|req| self.rank_reviewers(&req))
            .into()
    }

    pub fn rank_reviewers(&self, req: &ReviewerRequest) -> Result<Vec<RankedAuthor>, RequestError> {
        let analysis =
            patch::analyze(&req.patch_text).map_err(|e| RequestError::Patch(e.to_string()))?;
        let mapping = self.authors.get(&[]).map_err(store_error)?;

        let exclude = match req.author_kind {
            AuthorKind::Hg => mapping.get(&req.author_id).unwrap_or(&req.author_id),
            AuthorKind::Bz => &req.author_id,
        };

        let ranker = Ranker {
            mapping: &mapping,
            scores: self.scores,
            blame: if req.use_blame { self.blame } else { None },
        };
        ranker
            .reviewers(&analysis, Some(exclude.as_str()), req.count)
            .map_err(store_error)
    }

    pub fn top(&self, payload: &Value) -> RankResponse {
        TopRequest::parse(payload, self.policy)
            .and_then(|req| self.rank_top(&req))
            .into()
    }

    pub fn rank_top(&self, req: &TopRequest) -> Result<Vec<RankedAuthor>, RequestError> {
        let mapping = self.authors.get(&[]).map_err(store_error)?;
        let ranker = Ranker {
            mapping: &mapping,
            scores: self.scores,
            blame: None,
        };
        ranker.top(&req.files, req.count).map_err(store_error)
    }

    pub fn authors(&self, payload: &Value) -> MappingResponse {
        let result = parse_author_query(payload)
            .and_then(|names| self.authors.get(&names).map_err(store_error));
        match result {
            Ok(mapping) => MappingResponse {
                mapping,
                error: String::new(),
            },
            Err(err) => {
                warn!(error = %err, "author query failed");
                MappingResponse {
                    mapping: IdentityMap::new(),
                    error: err.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
