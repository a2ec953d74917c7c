use super::*;

#[test]
fn max_width_with_names() {
    let names = ["bob@x.org", "ascheff@mozilla.com"];
    let w = max_width(names.iter().copied(), 4);
    assert_eq!(w, "ascheff@mozilla.com".len());
}

#[test]
fn max_width_counts_chars_not_bytes() {
    let w = max_width(["José <j@x>"].into_iter(), 1);
    assert_eq!(w, 10);
}

#[test]
fn max_width_empty() {
    let w = max_width(std::iter::empty(), 4);
    assert_eq!(w, 4);
}

#[test]
fn max_width_min_enforced() {
    let w = max_width(["a"].into_iter(), 10);
    assert_eq!(w, 10);
}

#[test]
fn separator_width() {
    let s = separator(5);
    // Each ─ is 3 bytes in UTF-8
    assert_eq!(s.chars().count(), 5);
}

#[test]
fn print_json_stdout_works() {
    let data = vec![1, 2, 3];
    print_json_stdout(&data).unwrap();
}
