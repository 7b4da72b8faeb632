use std::sync::OnceLock;

use regex::Regex;

/// Normalize extracted text.
///
/// Newlines become spaces, whitespace runs collapse to a single space, every
/// `"- "` left behind by a line-break hyphenation is removed, and the result
/// is trimmed.
pub fn normalize(text: &str) -> String {
    static RE_WHITESPACE: OnceLock<Regex> = OnceLock::new();
    let re_whitespace = RE_WHITESPACE.get_or_init(|| Regex::new(r"\s+").unwrap());

    let result = text.replace('\n', " ");
    let result = re_whitespace.replace_all(&result, " ");
    let result = result.replace("- ", "");

    result.trim().to_string()
}
