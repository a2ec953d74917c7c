use super::*;
use std::collections::BTreeMap;

fn map(pairs: &[(&str, &str)]) -> IdentityMap {
    pairs
        .iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect()
}

#[test]
fn diff_inserts_changes_and_removals() {
    let old = map(&[("a", "a@x"), ("b", "b@x"), ("c", "c@x")]);
    let new = map(&[("a", "a@x"), ("b", "bee@x"), ("d", "d@x")]);
    let diff = AuthorDiff::between(&old, &new);
    assert_eq!(diff.toinsert, map(&[("b", "bee@x"), ("d", "d@x")]));
    assert_eq!(diff.torm, BTreeSet::from(["c".to_string()]));

    let mut applied = old.clone();
    AuthorMap::apply_diff(&mut applied, &diff).unwrap();
    assert_eq!(applied, new);
}

#[test]
fn diff_of_equal_maps_is_empty() {
    let m = map(&[("a", "a@x")]);
    assert!(AuthorDiff::between(&m, &m).is_empty());
}

#[test]
fn author_get_subset_or_all() {
    let m = map(&[("a", "a@x"), ("b", "b@x")]);
    assert_eq!(AuthorMap::get(&m, &[]).unwrap(), m);
    let some = AuthorMap::get(&m, &["b".to_string(), "zzz".to_string()]).unwrap();
    assert_eq!(some, map(&[("b", "b@x")]));
}

#[test]
fn score_table_sets_absolute_values() {
    let mut table = FileScores::from([(
        "a.c".to_string(),
        BTreeMap::from([("alice".to_string(), 1.0), ("bob".to_string(), 2.0)]),
    )]);
    let delta = FileScores::from([
        ("a.c".to_string(), BTreeMap::from([("alice".to_string(), 1.6)])),
        ("b.c".to_string(), BTreeMap::from([("carol".to_string(), 0.4)])),
    ]);
    FileScoreTable::apply_diff(&mut table, &delta).unwrap();

    assert_eq!(table["a.c"]["alice"], 1.6);
    assert_eq!(table["a.c"]["bob"], 2.0);
    assert_eq!(table["b.c"]["carol"], 0.4);

    let rows = FileScoreTable::get(&table, &["b.c".to_string(), "none.c".to_string()]).unwrap();
    assert_eq!(rows.len(), 1);
}

#[test]
fn missing_file_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let m: IdentityMap = load_json(&dir.path().join("absent.json")).unwrap();
    assert!(m.is_empty());
}

#[test]
fn corrupt_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, "{ not json").unwrap();
    let err = load_json::<IdentityMap>(&path).unwrap_err();
    assert!(err.to_string().contains("cannot parse"));
}

#[test]
fn json_file_writes_only_when_committed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("authors.json");

    let mut store: JsonFile<IdentityMap> = JsonFile::open(&path).unwrap();
    let diff = AuthorDiff {
        toinsert: map(&[("a", "a@x")]),
        torm: BTreeSet::new(),
    };
    AuthorMap::apply_diff(&mut store, &diff).unwrap();
    assert!(!path.exists());

    let mut commit = Commit::default();
    store.stage(&mut commit).unwrap();
    assert!(!path.exists());
    commit.persist().unwrap();

    let reopened: JsonFile<IdentityMap> = JsonFile::open(&path).unwrap();
    assert_eq!(reopened.data(), &map(&[("a", "a@x")]));
    assert_eq!(AuthorMap::get(&reopened, &[]).unwrap().len(), 1);
}

#[test]
fn failed_stage_leaves_earlier_files_alone() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("authors.json");
    fs::write(&good, "{}\n").unwrap();
    // a regular file where a directory is expected
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "").unwrap();

    let mut commit = Commit::default();
    commit.stage(&good, &map(&[("a", "a@x")])).unwrap();
    let err = commit
        .stage(&blocker.join("stats.json"), &map(&[]))
        .unwrap_err();
    assert!(err.to_string().contains("cannot write"));
    drop(commit);

    assert_eq!(fs::read_to_string(&good).unwrap(), "{}\n");
    let leftovers = fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(leftovers, 2);
}
