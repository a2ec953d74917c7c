use super::*;
use std::fs;

use crate::store::load_json;

fn store_in(dir: &Path) -> StoreArgs {
    StoreArgs {
        authors: dir.join("authors.json"),
        scores: dir.join("scores.json"),
        stats: dir.join("stats.json"),
    }
}

const REVISIONS: &str = r#"{"revisions": [
    {"rev": "r1", "author": "Alice Smith <alice@x.org>", "date": "2016-06-01", "bug_id": 1,
     "files": {"touched": ["a.c"]}},
    {"rev": "r2", "author": "Alice Smith <alice@x.org>", "date": "2016-06-02", "bug_id": 2,
     "files": {"touched": ["a.c"]}}
]}"#;

const BUGS: &str = r#"{"bugs": {
    "1": {"assignee": "alice@x.org", "reviewers": ["bob@x.org"]},
    "2": {"assignee": "alice@x.org", "reviewers": ["bob@x.org"]}
}}"#;

fn run_fixture_update(dir: &Path) -> StoreArgs {
    let revisions = dir.join("log.json");
    let bugs = dir.join("bugs.json");
    fs::write(&revisions, REVISIONS).unwrap();
    fs::write(&bugs, BUGS).unwrap();
    let store = store_in(dir);
    run_update(&store, &revisions, &bugs, Some("2016-06-30"), true, &Policy::default()).unwrap();
    store
}

#[test]
fn update_writes_all_three_stores() {
    let dir = tempfile::tempdir().unwrap();
    let store = run_fixture_update(dir.path());

    let authors: IdentityMap = load_json(&store.authors).unwrap();
    assert_eq!(authors["Alice Smith <alice@x.org>"], "alice@x.org");

    let scores: FileScores = load_json(&store.scores).unwrap();
    assert!((scores["a.c"]["alice@x.org"] - 1.2).abs() < 1e-9);
    assert!((scores["a.c"]["bob@x.org"] - 0.8).abs() < 1e-9);

    let stats: AuthorStats = load_json(&store.stats).unwrap();
    assert_eq!(stats.last_rev.as_deref(), Some("r2"));
}

#[test]
fn update_is_incremental() {
    let dir = tempfile::tempdir().unwrap();
    let store = run_fixture_update(dir.path());
    let before: FileScores = load_json(&store.scores).unwrap();

    // same log again: nothing after r2
    run_update(
        &store,
        &dir.path().join("log.json"),
        &dir.path().join("bugs.json"),
        Some("2016-06-30"),
        false,
        &Policy::default(),
    )
    .unwrap();
    let after: FileScores = load_json(&store.scores).unwrap();
    assert_eq!(before, after);
}

#[test]
fn failed_stats_write_leaves_scores_unwritten() {
    let dir = tempfile::tempdir().unwrap();
    let revisions = dir.path().join("log.json");
    let bugs = dir.path().join("bugs.json");
    fs::write(&revisions, REVISIONS).unwrap();
    fs::write(&bugs, BUGS).unwrap();
    // stats.json would have to live under a regular file
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "").unwrap();
    let mut store = store_in(dir.path());
    store.stats = blocker.join("stats.json");

    let result = run_update(&store, &revisions, &bugs, Some("2016-06-30"), true, &Policy::default());
    assert!(result.is_err());
    assert!(!store.scores.exists());
    assert!(!store.authors.exists());

    // a retry once the path is usable scores the batch exactly once
    fs::remove_file(&blocker).unwrap();
    run_update(&store, &revisions, &bugs, Some("2016-06-30"), true, &Policy::default()).unwrap();
    let scores: FileScores = load_json(&store.scores).unwrap();
    assert!((scores["a.c"]["alice@x.org"] - 1.2).abs() < 1e-9);
    assert!((scores["a.c"]["bob@x.org"] - 0.8).abs() < 1e-9);
}

#[test]
fn top_and_resolve_after_update() {
    let dir = tempfile::tempdir().unwrap();
    let store = run_fixture_update(dir.path());
    let policy = Policy::default();

    run_top(&store, &json!({"file_list": ["a.c"], "count": 2}), false, &policy).unwrap();
    run_top(&store, &json!({"file_list": ["a.c"]}), true, &policy).unwrap();
    run_resolve(&store, &["Alice Smith <alice@x.org>".to_string()], false, &policy).unwrap();
    run_resolve(&store, &[], true, &policy).unwrap();
}

#[test]
fn top_with_bad_request_fails_in_text_mode() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(dir.path());
    let result = run_top(&store, &json!({"file_list": []}), false, &Policy::default());
    assert!(result.is_err());
    // JSON mode reports the error in the payload instead
    run_top(&store, &json!({"file_list": []}), true, &Policy::default()).unwrap();
}

#[test]
fn reviewers_without_repository() {
    let dir = tempfile::tempdir().unwrap();
    let store = run_fixture_update(dir.path());
    let patch = "diff --git a/a.c b/a.c\nindex 1111111..2222222 100644\n--- a/a.c\n+++ b/a.c\n@@ -1 +1 @@\n-x\n+y\n";
    let payload = json!({
        "patch_text": patch,
        "author_id": "Alice Smith <alice@x.org>",
        "use_blame": false
    });
    run_reviewers(&store, &payload, None, false, &Policy::default()).unwrap();
}

#[test]
fn similarity_runs() {
    run_similarity("Andrew Scheff <ascheff@mozilla.com>", "ascheff@mozilla.com", false, &Policy::default())
        .unwrap();
    run_similarity("a", "b", true, &Policy::default()).unwrap();
}

#[test]
fn today_parsing() {
    assert_eq!(
        parse_today(Some("2016-12-31")).unwrap(),
        NaiveDate::from_ymd_opt(2016, 12, 31).unwrap()
    );
    assert!(parse_today(Some("31/12/2016")).is_err());
    assert!(parse_today(None).is_ok());
}

#[test]
fn missing_patch_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_patch(&dir.path().join("nope.patch")).unwrap_err();
    assert!(err.to_string().contains("cannot read patch"));
}
