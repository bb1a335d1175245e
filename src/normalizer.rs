//! Deterministic parsing and formatting of raw tag text.
//!
//! Parsing is a filtering pass, not a validating one: candidates that fail
//! the validity rules are silently dropped. The one loud path is
//! [`parse_required`], used at field boundaries where at least one valid
//! tag must come out of the text.

use crate::error::{Result, TagError};

/// Default separator for comma-separated tag text.
pub const DEFAULT_SEPARATOR: char = ',';

/// Parses raw tag text into an ordered list of valid tag names.
///
/// The whole input is lower-cased and trimmed first. If the separator is
/// absent the entire trimmed string is treated as a single candidate;
/// otherwise the input is split on the separator, each piece trimmed, and
/// empty pieces dropped.
///
/// A candidate is valid iff its first character is alphabetic, it is at
/// least 3 characters long, and every whitespace-delimited word within it
/// is alphanumeric. Invalid candidates are dropped without error.
///
/// Order follows the input; duplicates are NOT deduplicated here. Tag
/// identity is name-keyed, so dedup happens downstream in the vocabulary.
///
/// # Examples
///
/// ```
/// use entag::normalizer::parse;
///
/// assert_eq!(parse("ab, abc, a1b", ','), vec!["abc", "a1b"]);
/// assert_eq!(parse("Foo, Foo, BAR", ','), vec!["foo", "foo", "bar"]);
/// assert!(parse("", ',').is_empty());
/// ```
pub fn parse(raw: &str, separator: char) -> Vec<String> {
    let mut tags = Vec::new();

    let lowered = raw.to_lowercase();
    let trimmed = lowered.trim();
    if trimmed.is_empty() {
        return tags;
    }

    if !trimmed.contains(separator) {
        if is_valid_name(trimmed) {
            tags.push(trimmed.to_string());
        }
    } else {
        for piece in trimmed.split(separator) {
            let candidate = piece.trim();
            if !candidate.is_empty() && is_valid_name(candidate) {
                tags.push(candidate.to_string());
            }
        }
    }

    tags
}

/// Parses comma-separated tag text. See [`parse`].
pub fn parse_tags(raw: &str) -> Vec<String> {
    parse(raw, DEFAULT_SEPARATOR)
}

/// Parses raw tag text, requiring at least one valid tag.
///
/// Returns [`TagError::Validation`] when the text yields nothing, which is
/// the boundary behavior for a required tag field.
///
/// # Examples
///
/// ```
/// use entag::normalizer::parse_required;
///
/// assert!(parse_required("rust, web", ',').is_ok());
/// assert!(parse_required("!?, ab", ',').is_err());
/// ```
pub fn parse_required(raw: &str, separator: char) -> Result<Vec<String>> {
    let tags = parse(raw, separator);
    if tags.is_empty() {
        return Err(TagError::Validation(raw.to_string()));
    }
    Ok(tags)
}

/// Checks a single candidate against the validity rules.
///
/// Valid: first character alphabetic, length >= 3 characters, and every
/// whitespace-delimited word alphanumeric.
pub fn is_valid_name(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() => {}
        _ => return false,
    }

    if candidate.chars().count() < 3 {
        return false;
    }

    candidate
        .split_whitespace()
        .all(|word| word.chars().all(char::is_alphanumeric))
}

/// Derives the URL-safe slug for a tag name.
///
/// Pure and total: lowercase with spaces replaced by underscores. The slug
/// is recomputed from the name on every save, never stored independently.
///
/// # Examples
///
/// ```
/// use entag::normalizer::slugify;
///
/// assert_eq!(slugify("machine learning"), "machine_learning");
/// assert_eq!(slugify("Rust"), "rust");
/// ```
pub fn slugify(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

/// Capitalizes the first character of a tag name for display.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Formats a tag-name collection back into canonical editable text.
///
/// Each name is capitalized, the list sorted alphabetically, and the
/// result joined with `", "`. Round-trips through [`parse`]: parsing the
/// output recovers the same name set (modulo case).
///
/// # Examples
///
/// ```
/// use entag::normalizer::format_for_display;
///
/// let text = format_for_display(["web", "rust"]);
/// assert_eq!(text, "Rust, Web");
/// ```
pub fn format_for_display<I, S>(names: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut display: Vec<String> = names
        .into_iter()
        .map(|name| capitalize(name.as_ref()))
        .collect();
    display.sort();
    display.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_input_returns_empty() {
        assert!(parse("", ',').is_empty());
        assert!(parse("   ", ',').is_empty());
    }

    #[test]
    fn parse_drops_short_candidates() {
        assert_eq!(parse("ab, abc, a1b", ','), vec!["abc", "a1b"]);
    }

    #[test]
    fn parse_lowercases_without_deduplicating() {
        assert_eq!(parse("Foo, Foo, BAR", ','), vec!["foo", "foo", "bar"]);
    }

    #[test]
    fn parse_without_separator_treats_whole_input_as_one_candidate() {
        assert_eq!(parse("  Rust  ", ','), vec!["rust"]);
        // Multi-word single candidate is valid when every word is alphanumeric
        assert_eq!(parse("machine learning", ','), vec!["machine learning"]);
    }

    #[test]
    fn parse_rejects_leading_non_alphabetic() {
        assert!(parse("1abc", ',').is_empty());
        assert!(parse("-abc", ',').is_empty());
        // But digits after the first character are fine
        assert_eq!(parse("a1b", ','), vec!["a1b"]);
    }

    #[test]
    fn parse_rejects_candidates_with_non_alphanumeric_words() {
        assert!(parse("c++", ',').is_empty());
        assert!(parse("node.js", ',').is_empty());
        assert_eq!(parse("c++, rust", ','), vec!["rust"]);
    }

    #[test]
    fn parse_drops_empty_pieces() {
        assert_eq!(parse("rust,,web,", ','), vec!["rust", "web"]);
    }

    #[test]
    fn parse_preserves_input_order() {
        assert_eq!(parse("zebra, apple", ','), vec!["zebra", "apple"]);
    }

    #[test]
    fn parse_honors_custom_separator() {
        assert_eq!(parse("rust;web", ';'), vec!["rust", "web"]);
        // Comma is just text under a different separator, so the whole
        // input is a single candidate with a non-alphanumeric word
        assert!(parse("rust,web", ';').is_empty());
    }

    #[test]
    fn parse_required_rejects_all_invalid_input() {
        let err = parse_required("!!, ab", ',').unwrap_err();
        assert!(matches!(err, TagError::Validation(_)));
    }

    #[test]
    fn parse_required_accepts_one_valid_tag() {
        let tags = parse_required("ab, abc", ',').unwrap();
        assert_eq!(tags, vec!["abc"]);
    }

    #[test]
    fn slugify_replaces_spaces_with_underscores() {
        assert_eq!(slugify("machine learning"), "machine_learning");
        assert_eq!(slugify("web"), "web");
    }

    #[test]
    fn slugify_is_lowercase() {
        assert_eq!(slugify("Machine Learning"), "machine_learning");
    }

    #[test]
    fn capitalize_uppercases_first_character() {
        assert_eq!(capitalize("rust"), "Rust");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn format_for_display_sorts_and_capitalizes() {
        let text = format_for_display(["web", "cli", "rust"]);
        assert_eq!(text, "Cli, Rust, Web");
    }

    #[test]
    fn display_round_trips_through_parse() {
        let names = ["python", "web", "machine learning"];
        let text = format_for_display(names);
        let parsed = parse_tags(&text);

        let mut expected: Vec<&str> = names.to_vec();
        expected.sort();
        assert_eq!(parsed, expected);
    }
}
