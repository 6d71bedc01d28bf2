//! Name normalization for cross-reference resolution.
//!
//! Extracted references ("Sheriff Hale", "sheriff hale!") are matched against
//! entity names by normalized key. The rule is fixed so that keys stay stable
//! between ingestion runs:
//!
//! 1. lowercase
//! 2. drop straight and curly quote characters
//! 3. drop every remaining character that is not a letter, combining mark,
//!    digit or whitespace
//! 4. collapse whitespace runs to a single space and trim

use std::sync::OnceLock;

use regex::Regex;

static QUOTES: OnceLock<Regex> = OnceLock::new();
static PUNCTUATION: OnceLock<Regex> = OnceLock::new();
static WHITESPACE: OnceLock<Regex> = OnceLock::new();

fn quotes() -> &'static Regex {
    QUOTES.get_or_init(|| {
        Regex::new("['\"`\u{2018}\u{2019}\u{201A}\u{201B}\u{201C}\u{201D}\u{201E}\u{201F}]")
            .expect("quote pattern is valid")
    })
}

fn punctuation() -> &'static Regex {
    PUNCTUATION.get_or_init(|| Regex::new(r"[^\p{L}\p{M}\p{N}\s]").expect("punctuation pattern is valid"))
}

fn whitespace() -> &'static Regex {
    WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern is valid"))
}

/// Normalize an entity name into its lookup key.
pub fn normalize_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    let unquoted = quotes().replace_all(&lowered, "");
    let stripped = punctuation().replace_all(&unquoted, "");
    whitespace().replace_all(&stripped, " ").trim().to_string()
}
