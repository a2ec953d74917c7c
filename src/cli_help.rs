//! Long help text constants for CLI subcommands.
//!
//! Kept apart from `cli.rs` so the argument definitions stay short.

/// Batch update: statistics, identity map, score table.
pub const UPDATE: &str = "\
Fold new revisions and bug data into the stores.

Reads the revisions after the last processed one from the revision log and
the matching bugs from the bug snapshot, then:

  1. adds each author's bug participation (assignee, attachers,
     commenters, review requests) to the statistics file
  2. re-resolves every author to a bug tracker account
  3. drops identities whose every alias has been inactive for more
     than stale_after_days (default 92)
  4. credits reviewers (0.4) and the resolved author (0.6) on every file
     each patch touches

The identity diff and the score delta are both computed before either
file is written.

Examples:
  rv update --revisions log.json --bugs bugs.json
  rv update --revisions log.json --bugs bugs.json --today 2016-12-31 --json";

/// Reviewer ranking for a patch.
pub const REVIEWERS: &str = "\
Suggest reviewers for a patch.

Candidates are scored from three signals, each normalised to sum to one:

  deleted   share of the removed lines last written by the candidate
  all       share of all lines of those files last written by them
  ownership share of the accumulated score of the changed files

The patch author is never suggested. Scores are shown as percentages
truncated to one decimal; they can exceed 100 since signals add up.

Examples:
  rv reviewers fix.patch --author 'Jane Roe <jane@example.org>'
  git diff | rv reviewers - --author jane@example.org --author-kind bz
  rv reviewers fix.patch --author jane --no-blame --count 3 --json";

/// Text similarity between identifiers.
pub const SIMILARITY: &str = "\
Score how alike two identifiers are.

Both strings are lowercased, stripped of mail decoration (<, >, @, common
domains and provider names, dots, spaces) and cut into character trigrams.
The score is the cosine of their TF-IDF vectors, between 0 and 1. Two
identifiers are considered the same person above similarity_threshold
(default 0.4).

Examples:
  rv similarity 'Andrew Scheff <ascheff@mozilla.com>' ascheff@mozilla.com";
