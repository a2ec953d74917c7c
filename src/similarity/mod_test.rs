use super::*;
use proptest::prelude::*;

#[test]
fn normalize_strips_mail_noise() {
    let toks = normalize("Andrew Scheff <ascheff@mozilla.com>");
    let joined: String = toks.iter().map(|t| &t[..1]).collect::<String>() + &toks.last().unwrap()[1..];
    assert_eq!(joined, "andrewscheffascheff");
    assert_eq!(toks.len(), 17);
}

#[test]
fn normalize_handles_domains_before_dots() {
    let toks = normalize("John.Doe@example.co.uk");
    assert_eq!(toks.first().map(String::as_str), Some("joh"));
    assert_eq!(toks.last().map(String::as_str), Some("ple"));
    // "johndoeexample" has 14 chars, so 12 trigrams
    assert_eq!(toks.len(), 12);
}

#[test]
fn normalize_short_or_denylisted_is_empty() {
    assert!(normalize("ab").is_empty());
    assert!(normalize("Bugzilla").is_empty());
    assert!(normalize("bugs@gmail.com").is_empty());
    assert!(normalize("").is_empty());
}

#[test]
fn normalize_is_case_insensitive() {
    assert_eq!(normalize("ALICE Smith"), normalize("alice smith"));
}

#[test]
fn identical_strings_score_one() {
    assert_eq!(similarity("ascheff@mozilla.com", "ascheff@mozilla.com"), 1.0);
}

#[test]
fn same_tokens_different_noise_score_one() {
    // mail punctuation and domains are stripped before comparison
    assert_eq!(similarity("ascheff", "<ascheff@mozilla.com>"), 1.0);
}

#[test]
fn disjoint_strings_score_zero() {
    assert_eq!(similarity("Jane Roe", "bob@x.org"), 0.0);
}

#[test]
fn tokenless_string_scores_zero() {
    assert_eq!(similarity("ab", "ab"), 0.0);
    assert_eq!(similarity("", "alice"), 0.0);
}

#[test]
fn partial_overlap_matches_tfidf() {
    // abc is shared (idf 1), bcd / bce are not (idf ln 1.5 + 1)
    let expected = 1.0 / (1.0 + (1.5_f64.ln() + 1.0).powi(2));
    assert!((similarity("abcd", "abce") - expected).abs() < 1e-12);
}

#[test]
fn name_against_mail_is_similar() {
    let score = similarity("Andrew Scheff <ascheff@mozilla.com>", "ascheff@mozilla.com");
    assert!(score > 0.7 && score < 0.71, "got {score}");
    assert!(is_similar(
        "Andrew Scheff <ascheff@mozilla.com>",
        "ascheff@mozilla.com",
        0.4
    ));
}

#[test]
fn threshold_is_strict() {
    assert!(!is_similar("alice", "alice", 1.0));
    assert!(is_similar("alice", "alice", 0.999));
}

proptest! {
    #[test]
    fn self_similarity_is_one(s in "[a-z0-9 ]{3,24}") {
        prop_assume!(!normalize(&s).is_empty());
        prop_assert_eq!(similarity(&s, &s), 1.0);
    }

    #[test]
    fn similarity_is_symmetric_and_bounded(a in "[a-z0-9.@ ]{0,20}", b in "[a-z0-9.@ ]{0,20}") {
        let ab = similarity(&a, &b);
        let ba = similarity(&b, &a);
        prop_assert_eq!(ab, ba);
        prop_assert!((0.0..=1.0).contains(&ab));
    }

    #[test]
    fn normalized_tokens_are_trigrams(s in ".{0,40}") {
        for tok in normalize(&s) {
            prop_assert_eq!(tok.chars().count(), 3);
        }
    }
}
