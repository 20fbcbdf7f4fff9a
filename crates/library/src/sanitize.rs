//! Title to file name conversion.

use regex::Regex;
use std::sync::LazyLock;

/// Longest sanitized title, in bytes. Leaves room for the marker, a
/// conflict counter and the extension within common 255-byte name limits.
const MAX_TITLE_BYTES: usize = 96;

static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s-]").unwrap());
static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s-]+").unwrap());

/// Converts an arbitrary model-generated title into a file-name-safe base
/// name.
///
/// Everything except word characters, whitespace and hyphens is dropped, the
/// result is trimmed, and each run of whitespace and hyphens becomes a
/// single `_`. Case is preserved. Overlong titles are cut at a character
/// boundary.
///
/// Sanitizing is idempotent. An empty (or all-punctuation) title yields an
/// empty string, which callers must treat as "no usable title".
///
/// ```
/// use retitle_library::sanitize_title;
/// assert_eq!(sanitize_title("Red Sunset"), "Red_Sunset");
/// assert_eq!(sanitize_title("  A cat's nap - on the sofa!  "), "A_cats_nap_on_the_sofa");
/// assert_eq!(sanitize_title("???"), "");
/// ```
pub fn sanitize_title(title: &str) -> String {
    let stripped = DISALLOWED.replace_all(title, "");
    let joined = SEPARATORS.replace_all(stripped.trim(), "_");
    let mut end = joined.len().min(MAX_TITLE_BYTES);
    while !joined.is_char_boundary(end) {
        end -= 1;
    }
    joined[..end].trim_end_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Red Sunset", "Red_Sunset")]
    #[case("Golden Retriever Playing Fetch", "Golden_Retriever_Playing_Fetch")]
    #[case("Snow-capped  mountain\tpeaks", "Snow_capped_mountain_peaks")]
    #[case("Café au lait", "Café_au_lait")]
    #[case("Hello, World! (2024)", "Hello_World_2024")]
    #[case("under_scored title", "under_scored_title")]
    #[case("a - b", "a_b")]
    #[case("../../etc/passwd", "etcpasswd")]
    #[case("", "")]
    #[case("   ", "")]
    #[case("!!!", "")]
    fn test_sanitize(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sanitize_title(input), expected);
    }

    #[rstest]
    #[case("Red Sunset")]
    #[case("  Mixed--separators   and  spaces ")]
    #[case("Émigré's café: ünïcödé")]
    #[case("trailing underscore_")]
    fn test_idempotent(#[case] input: &str) {
        let once = sanitize_title(input);
        assert_eq!(sanitize_title(&once), once);
    }

    #[test]
    fn test_only_safe_characters() {
        let out = sanitize_title("a/b\\c:d*e?f\"g<h>i|j.k");
        assert!(out.chars().all(|c| c.is_alphanumeric() || c == '_'), "{out}");
    }

    #[test]
    fn test_truncates_on_char_boundary() {
        let out = sanitize_title(&"é".repeat(100));
        assert!(out.len() <= MAX_TITLE_BYTES);
        assert_eq!(out, "é".repeat(MAX_TITLE_BYTES / 2));
        let long = sanitize_title(&"word ".repeat(60));
        assert!(long.len() <= MAX_TITLE_BYTES && !long.ends_with('_'));
        assert_eq!(sanitize_title(&long), long);
    }
}
