use serde::Serialize;

use super::RankedAuthor;
use crate::report_helpers::{max_width, print_json_stdout, separator};

pub fn print_report(title: &str, ranked: &[RankedAuthor]) {
    if ranked.is_empty() {
        println!("No candidates found.");
        return;
    }

    let max_name_len = max_width(ranked.iter().map(|r| r.name.as_str()), 4);

    // rank(3) + 2 + name + 2 + score(6)
    let separator = separator((max_name_len + 13).max(40));

    println!("{title}");
    println!("{separator}");
    println!(" {:>3}  {:<nw$}  {:>6}", "#", "Name", "Score", nw = max_name_len);
    println!("{separator}");

    for (i, r) in ranked.iter().enumerate() {
        println!(
            " {:>3}  {:<nw$}  {:>5.1}%",
            i + 1,
            r.name,
            r.score,
            nw = max_name_len
        );
    }

    println!("{separator}");
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    ranked_authors: &'a [RankedAuthor],
    error: &'a str,
}

pub fn print_json(ranked: &[RankedAuthor], error: &str) -> Result<(), Box<dyn std::error::Error>> {
    print_json_stdout(&JsonOutput {
        ranked_authors: ranked,
        error,
    })
}

#[cfg(test)]
#[path = "report_test.rs"]
mod tests;
