//! Slug generation for post titles.

use regex::Regex;
use std::sync::OnceLock;
use unicode_segmentation::UnicodeSegmentation;

static HYPHEN_RUNS: OnceLock<Regex> = OnceLock::new();

fn hyphen_runs() -> &'static Regex {
    HYPHEN_RUNS.get_or_init(|| Regex::new(r"-+").unwrap())
}

/// Convert a post title to a URL-safe slug
///
/// Rules:
/// - Lowercase
/// - Whitespace and underscores become hyphens
/// - Punctuation is dropped, unicode letters are kept
/// - Runs of hyphens collapse, and leading/trailing hyphens are trimmed
///
/// # Examples
///
/// ```
/// use litpost_core::slugify;
///
/// assert_eq!(slugify("Hello World"), "hello-world");
/// assert_eq!(slugify("Generators & Coroutines"), "generators-coroutines");
/// assert_eq!(slugify("__init__ considered harmful"), "init-considered-harmful");
/// ```
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();

    let kept = lowered
        .graphemes(true)
        .filter_map(|g| {
            let c = g.chars().next()?;
            if c.is_whitespace() || c == '_' || c == '-' {
                Some("-")
            } else if c.is_alphanumeric() {
                Some(g)
            } else {
                None
            }
        })
        .collect::<String>();

    hyphen_runs()
        .replace_all(&kept, "-")
        .trim_matches('-')
        .to_string()
}
