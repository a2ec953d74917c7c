//! Fuzzy comparison of free-text author strings.
//!
//! Author strings are lower-cased, stripped of tokens that appear in nearly
//! every bug-tracker identity (mail punctuation, common mail domains, words
//! like `bugzilla`), then cut into character trigrams. Two strings are
//! compared by the cosine of their TF-IDF vectors in a space built from the
//! pair alone, so a score only ever depends on its two inputs.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::policy::{DENYLIST, NGRAM_SIZE};

static DENYLIST_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = DENYLIST
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&alternation).expect("denylist pattern is valid")
});

/// Lower-case `text`, drop denylisted substrings, and return its character
/// trigrams in order of appearance.
pub fn normalize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let stripped = DENYLIST_RE.replace_all(&lowered, "");
    ngrams(&stripped, NGRAM_SIZE)
}

fn ngrams(text: &str, n: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() < n {
        return Vec::new();
    }
    chars.windows(n).map(|w| w.iter().collect()).collect()
}

fn term_counts(text: &str) -> BTreeMap<String, f64> {
    let mut counts = BTreeMap::new();
    for token in normalize(text) {
        *counts.entry(token).or_insert(0.0) += 1.0;
    }
    counts
}

/// Cosine similarity of `a` and `b` in a TF-IDF space fitted on `{a, b}`.
///
/// Uses raw term counts, smoothed idf `ln((1 + n) / (1 + df)) + 1` with
/// `n = 2`, and L2-normalised vectors. Returns a value in `[0, 1]`;
/// identical token distributions give exactly `1.0`, and a string without
/// any trigram scores `0.0` against everything.
pub fn similarity(a: &str, b: &str) -> f64 {
    let ta = term_counts(a);
    let tb = term_counts(b);
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }
    if ta == tb {
        return 1.0;
    }

    let docs = 2.0_f64;
    let idf = |term: &str| {
        let df = f64::from(u8::from(ta.contains_key(term)) + u8::from(tb.contains_key(term)));
        ((1.0 + docs) / (1.0 + df)).ln() + 1.0
    };

    let norm = |counts: &BTreeMap<String, f64>| {
        counts
            .iter()
            .map(|(t, c)| (c * idf(t)).powi(2))
            .sum::<f64>()
            .sqrt()
    };

    let dot: f64 = ta
        .iter()
        .filter_map(|(t, ca)| tb.get(t).map(|cb| ca * cb * idf(t).powi(2)))
        .sum();

    (dot / (norm(&ta) * norm(&tb))).clamp(0.0, 1.0)
}

/// Fuzzy equality used by the resolution cascade: strictly above `threshold`.
pub fn is_similar(a: &str, b: &str, threshold: f64) -> bool {
    similarity(a, b) > threshold
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
