//! Command runners: load the stores and the policy, call into the library,
//! print the result.

use std::error::Error;
use std::io::Read;
use std::path::Path;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::api::{RankResponse, Service};
use crate::cli::{Cli, Commands, StoreArgs};
use crate::git::GitRepo;
use crate::model::{AuthorStats, FileScores, IdentityMap};
use crate::pipeline::{Update, UpdateSummary};
use crate::policy::Policy;
use crate::ranking::report::{print_json, print_report};
use crate::report_helpers::{max_width, print_json_stdout, separator};
use crate::similarity::{is_similar, similarity};
use crate::sources::{BlameSource, BugSnapshot, RevisionLog};
use crate::store::{Commit, JsonFile};

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn Error>> {
    let policy = Policy::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Update {
            store,
            revisions,
            bugs,
            today,
            json,
        } => run_update(&store, &revisions, &bugs, today.as_deref(), json, &policy),
        Commands::Reviewers {
            store,
            patch,
            author,
            author_kind,
            no_blame,
            repo,
            count,
            json,
        } => {
            let payload = json!({
                "patch_text": read_patch(&patch)?,
                "author_id": author,
                "author_kind": author_kind,
                "use_blame": !no_blame,
                "count": count.unwrap_or(policy.default_count),
            });
            let repo = if no_blame {
                None
            } else {
                open_repo(repo.as_deref().unwrap_or(Path::new(".")))
            };
            run_reviewers(&store, &payload, repo.as_ref(), json, &policy)
        }
        Commands::Top {
            store,
            files,
            count,
            json,
        } => {
            let payload = json!({
                "file_list": files,
                "count": count.unwrap_or(policy.default_count),
            });
            run_top(&store, &payload, json, &policy)
        }
        Commands::Resolve { store, names, json } => run_resolve(&store, &names, json, &policy),
        Commands::Similarity { a, b, json } => run_similarity(&a, &b, json, &policy),
    }
}

fn read_patch(path: &Path) -> Result<String, Box<dyn Error>> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read patch {}: {e}", path.display()).into())
}

fn open_repo(path: &Path) -> Option<GitRepo> {
    match GitRepo::open(path) {
        Ok(repo) => {
            info!(root = %repo.root().display(), "blaming against repository");
            Some(repo)
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "no repository, ranking without blame");
            None
        }
    }
}

fn parse_today(today: Option<&str>) -> Result<NaiveDate, Box<dyn Error>> {
    match today {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|e| format!("invalid date {s:?}: {e}").into()),
        None => Ok(Local::now().date_naive()),
    }
}

fn run_update(
    store: &StoreArgs,
    revisions: &Path,
    bugs: &Path,
    today: Option<&str>,
    json: bool,
    policy: &Policy,
) -> Result<(), Box<dyn Error>> {
    let revisions = RevisionLog::load(revisions)?;
    let bugs = BugSnapshot::load(bugs)?;
    let mut stats: JsonFile<AuthorStats> = JsonFile::open(&store.stats)?;
    let mut authors: JsonFile<IdentityMap> = JsonFile::open(&store.authors)?;
    let mut scores: JsonFile<FileScores> = JsonFile::open(&store.scores)?;

    let update = Update {
        revisions: &revisions,
        bugs: &bugs,
        policy,
        today: parse_today(today)?,
    };
    let outcome = update.run(stats.data(), &authors, &scores)?;
    outcome.apply(&mut authors, &mut scores)?;
    stats.set(outcome.state);

    // stats.json carries last_rev; it must never land without the scores
    let mut commit = Commit::default();
    authors.stage(&mut commit)?;
    scores.stage(&mut commit)?;
    stats.stage(&mut commit)?;
    commit.persist()?;

    if json {
        print_json_stdout(&outcome.summary)
    } else {
        print_summary(&outcome.summary);
        Ok(())
    }
}

fn print_summary(s: &UpdateSummary) {
    if s.patches == 0 {
        println!("Nothing new since {}.", s.revision.as_deref().unwrap_or("the beginning"));
        return;
    }
    println!("Updated to revision {}", s.revision.as_deref().unwrap_or("?"));
    println!("{}", separator(40));
    println!(" {:<28} {:>9}", "Patches", s.patches);
    println!(" {:<28} {:>9}", "Bugs with info", s.bugs);
    println!(" {:<28} {:>9}", "Authors folded", s.folded);
    println!(" {:<28} {:>9}", "Authors resolved", s.resolved);
    println!(" {:<28} {:>9}", "Authors unresolved", s.unresolved);
    println!(" {:<28} {:>9}", "Identities expired", s.expired);
    println!(" {:<28} {:>9}", "Map entries written", s.inserted);
    println!(" {:<28} {:>9}", "Map entries removed", s.removed);
    println!(" {:<28} {:>9}", "Files scored", s.scored_files);
    println!("{}", separator(40));
}

fn show_ranking(title: &str, resp: RankResponse, json: bool) -> Result<(), Box<dyn Error>> {
    if json {
        return print_json(&resp.ranked_authors, &resp.error);
    }
    if !resp.error.is_empty() {
        return Err(resp.error.into());
    }
    print_report(title, &resp.ranked_authors);
    Ok(())
}

fn run_reviewers(
    store: &StoreArgs,
    payload: &serde_json::Value,
    repo: Option<&GitRepo>,
    json: bool,
    policy: &Policy,
) -> Result<(), Box<dyn Error>> {
    let authors: JsonFile<IdentityMap> = JsonFile::open(&store.authors)?;
    let scores: JsonFile<FileScores> = JsonFile::open(&store.scores)?;
    let service = Service {
        authors: &authors,
        scores: &scores,
        blame: repo.map(|r| r as &dyn BlameSource),
        policy,
    };
    show_ranking("Suggested reviewers", service.reviewers(payload), json)
}

fn run_top(
    store: &StoreArgs,
    payload: &serde_json::Value,
    json: bool,
    policy: &Policy,
) -> Result<(), Box<dyn Error>> {
    let authors: JsonFile<IdentityMap> = JsonFile::open(&store.authors)?;
    let scores: JsonFile<FileScores> = JsonFile::open(&store.scores)?;
    let service = Service {
        authors: &authors,
        scores: &scores,
        blame: None,
        policy,
    };
    show_ranking("Top contributors", service.top(payload), json)
}

fn run_resolve(
    store: &StoreArgs,
    names: &[String],
    json: bool,
    policy: &Policy,
) -> Result<(), Box<dyn Error>> {
    let authors: JsonFile<IdentityMap> = JsonFile::open(&store.authors)?;
    let scores: JsonFile<FileScores> = JsonFile::open(&store.scores)?;
    let service = Service {
        authors: &authors,
        scores: &scores,
        blame: None,
        policy,
    };
    let resp = service.authors(&json!(names));
    if json {
        return print_json_stdout(&resp);
    }
    if !resp.error.is_empty() {
        return Err(resp.error.into());
    }

    for name in names.iter().filter(|n| !resp.mapping.contains_key(*n)) {
        println!("{name}: unresolved");
    }
    if resp.mapping.is_empty() {
        return Ok(());
    }
    let width = max_width(resp.mapping.keys().map(String::as_str), 6);
    println!(" {:<w$}  Account", "Author", w = width);
    println!("{}", separator(width + 30));
    for (alias, account) in &resp.mapping {
        println!(" {alias:<width$}  {account}");
    }
    Ok(())
}

#[derive(Serialize)]
struct SimilarityOutput<'a> {
    a: &'a str,
    b: &'a str,
    score: f64,
    threshold: f64,
    similar: bool,
}

fn run_similarity(a: &str, b: &str, json: bool, policy: &Policy) -> Result<(), Box<dyn Error>> {
    let out = SimilarityOutput {
        a,
        b,
        score: similarity(a, b),
        threshold: policy.similarity_threshold,
        similar: is_similar(a, b, policy.similarity_threshold),
    };
    if json {
        return print_json_stdout(&out);
    }
    let verdict = if out.similar { "same person" } else { "different" };
    println!("{:.4}  ({verdict}, threshold {})", out.score, out.threshold);
    Ok(())
}

#[cfg(test)]
#[path = "commands_test.rs"]
mod tests;
