use super::*;
use std::collections::BTreeMap;
use std::error::Error;

use serde_json::json;

use crate::model::FileScores;

const PATCH: &str = r#"diff --git a/a.c b/a.c
index 1111111..2222222 100644
--- a/a.c
+++ b/a.c
@@ -1,2 +1,2 @@
-one
+ONE
 two
"#;

struct FakeBlame;

impl BlameSource for FakeBlame {
    fn blame_lines(&self, _path: &str) -> Result<Vec<String>, Box<dyn Error>> {
        Ok(vec!["Dave <dave@x>".to_string(), "Dave <dave@x>".to_string()])
    }
}

fn fixtures() -> (IdentityMap, FileScores) {
    let authors = IdentityMap::from([
        ("Alice <alice@x>".to_string(), "alice@x".to_string()),
        ("Bob <bob@x>".to_string(), "bob@x".to_string()),
        ("Dave <dave@x>".to_string(), "dave@x".to_string()),
    ]);
    let scores = FileScores::from([(
        "a.c".to_string(),
        BTreeMap::from([
            ("alice@x".to_string(), 3.0),
            ("bob@x".to_string(), 1.0),
        ]),
    )]);
    (authors, scores)
}

fn names(resp: &RankResponse) -> Vec<&str> {
    resp.ranked_authors.iter().map(|r| r.name.as_str()).collect()
}

#[test]
fn parse_reviewer_defaults() {
    let req = ReviewerRequest::parse(
        &json!({"patch_text": "x", "author_id": "Alice <alice@x>"}),
        &Policy::default(),
    )
    .unwrap();
    assert_eq!(req.author_kind, AuthorKind::Hg);
    assert!(req.use_blame);
    assert_eq!(req.count, 5);
}

#[test]
fn parse_blame_flag_as_text_or_bool() {
    let policy = Policy::default();
    for (flag, expected) in [
        (json!(false), false),
        (json!("false"), false),
        (json!("TRUE"), true),
        (json!(true), true),
    ] {
        let req = ReviewerRequest::parse(
            &json!({"patch_text": "", "author_id": "a", "use_blame": flag}),
            &policy,
        )
        .unwrap();
        assert_eq!(req.use_blame, expected);
    }

    let err = ReviewerRequest::parse(
        &json!({"patch_text": "", "author_id": "a", "use_blame": "maybe"}),
        &policy,
    )
    .unwrap_err();
    assert!(matches!(err, RequestError::InvalidFlag(_)));
}

#[test]
fn parse_rejects_unknown_author_kind() {
    let err = ReviewerRequest::parse(
        &json!({"patch_text": "", "author_id": "a", "author_kind": "git"}),
        &Policy::default(),
    )
    .unwrap_err();
    assert!(matches!(err, RequestError::UnknownAuthorKind(ref k) if k == "git"));
}

#[test]
fn parse_rejects_non_string_author() {
    let err = ReviewerRequest::parse(&json!({"patch_text": "", "author_id": 42}), &Policy::default())
        .unwrap_err();
    assert!(matches!(err, RequestError::Malformed(_)));
}

#[test]
fn parse_top_accepts_string_or_list() {
    let policy = Policy::default();
    let one = TopRequest::parse(&json!({"file_list": "a.c"}), &policy).unwrap();
    assert_eq!(one.files, vec!["a.c"]);
    let many = TopRequest::parse(&json!({"file_list": ["a.c", "b.c"], "count": 1}), &policy).unwrap();
    assert_eq!(many.files.len(), 2);
    assert_eq!(many.count, 1);

    let err = TopRequest::parse(&json!({"file_list": []}), &policy).unwrap_err();
    assert!(matches!(err, RequestError::EmptyFileList));
}

#[test]
fn author_query_shapes() {
    assert_eq!(parse_author_query(&json!("a")).unwrap(), vec!["a"]);
    assert_eq!(parse_author_query(&json!(["a", "b"])).unwrap().len(), 2);
    assert_eq!(parse_author_query(&json!({"names": ["a"]})).unwrap(), vec!["a"]);
    assert!(parse_author_query(&json!([1, 2])).is_err());
}

#[test]
fn reviewers_exclude_the_hg_author() {
    let (authors, scores) = fixtures();
    let policy = Policy::default();
    let service = Service {
        authors: &authors,
        scores: &scores,
        blame: None,
        policy: &policy,
    };
    let resp = service.reviewers(&json!({
        "patch_text": PATCH,
        "author_id": "Alice <alice@x>",
        "author_kind": "hg"
    }));
    assert_eq!(resp.error, "");
    assert_eq!(names(&resp), vec!["bob@x"]);
}

#[test]
fn reviewers_exclude_the_bz_author() {
    let (authors, scores) = fixtures();
    let policy = Policy::default();
    let service = Service {
        authors: &authors,
        scores: &scores,
        blame: None,
        policy: &policy,
    };
    let resp = service.reviewers(&json!({
        "patch_text": PATCH,
        "author_id": "bob@x",
        "author_kind": "bz"
    }));
    assert_eq!(names(&resp), vec!["alice@x"]);
    assert_eq!(resp.ranked_authors[0].score, 75.0);
}

#[test]
fn blame_only_used_when_asked() {
    let (authors, scores) = fixtures();
    let policy = Policy::default();
    let service = Service {
        authors: &authors,
        scores: &scores,
        blame: Some(&FakeBlame),
        policy: &policy,
    };
    let payload = |flag: bool| {
        json!({
            "patch_text": PATCH,
            "author_id": "bob@x",
            "author_kind": "bz",
            "use_blame": flag
        })
    };
    let with = service.reviewers(&payload(true));
    assert_eq!(names(&with), vec!["dave@x", "alice@x"]);
    let without = service.reviewers(&payload(false));
    assert_eq!(names(&without), vec!["alice@x"]);
}

#[test]
fn malformed_payload_gives_error_not_panic() {
    let (authors, scores) = fixtures();
    let policy = Policy::default();
    let service = Service {
        authors: &authors,
        scores: &scores,
        blame: None,
        policy: &policy,
    };
    let resp = service.reviewers(&json!("just a string"));
    assert!(resp.ranked_authors.is_empty());
    assert!(resp.error.starts_with("invalid payload"));

    let resp = service.top(&json!({"file_list": 7}));
    assert!(resp.ranked_authors.is_empty());
    assert!(!resp.error.is_empty());
}

#[test]
fn top_ranks_by_ownership() {
    let (authors, scores) = fixtures();
    let policy = Policy::default();
    let service = Service {
        authors: &authors,
        scores: &scores,
        blame: None,
        policy: &policy,
    };
    let resp = service.top(&json!({"file_list": "a.c", "count": 1}));
    assert_eq!(
        resp.ranked_authors,
        vec![RankedAuthor {
            name: "alice@x".to_string(),
            score: 75.0
        }]
    );
}

#[test]
fn author_lookup() {
    let (authors, scores) = fixtures();
    let policy = Policy::default();
    let service = Service {
        authors: &authors,
        scores: &scores,
        blame: None,
        policy: &policy,
    };
    let resp = service.authors(&json!(["Bob <bob@x>", "Unknown"]));
    assert_eq!(resp.mapping.len(), 1);
    assert_eq!(resp.error, "");
    assert_eq!(service.authors(&json!([])).mapping.len(), 3);
    assert!(!service.authors(&json!({"x": 1})).error.is_empty());
}
