use unicode_normalization::UnicodeNormalization;

const LIGATURES: [(char, &str); 7] = [
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
    ('\u{FB05}', "st"),
    ('\u{FB06}', "st"),
];

/// Clean up the text of a single extracted span.
///
/// Applies NFC normalization, expands ligatures, standardizes bullet glyphs,
/// and drops replacement and control characters. Whitespace is left alone;
/// block text normalization collapses it later.
pub fn cleanup_text(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for c in text.nfc() {
        if let Some((_, expanded)) = LIGATURES.iter().find(|(lig, _)| *lig == c) {
            result.push_str(expanded);
            continue;
        }
        match c {
            '\u{25CF}' | '\u{25CB}' | '\u{25A0}' => result.push('\u{2022}'),
            '\u{FFFD}' => {}
            c if c.is_control() && !c.is_whitespace() => {}
            c => result.push(c),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough() {
        assert_eq!(cleanup_text("Hello world."), "Hello world.");
    }

    #[test]
    fn test_ligature_fix() {
        assert_eq!(cleanup_text("\u{FB01}nd"), "find");
        assert_eq!(cleanup_text("ba\u{FB04}e"), "baffle");
        assert_eq!(cleanup_text("\u{FB00}ort"), "ffort");
    }

    #[test]
    fn test_nfc_composes() {
        assert_eq!(cleanup_text("cafe\u{0301}"), "caf\u{00E9}");
    }

    #[test]
    fn test_replacement_character_removed() {
        assert_eq!(cleanup_text("a\u{FFFD}b"), "ab");
    }

    #[test]
    fn test_control_characters_removed() {
        assert_eq!(cleanup_text("a\u{0000}b\u{0007}c"), "abc");
    }

    #[test]
    fn test_whitespace_kept() {
        assert_eq!(cleanup_text(" two  words\n"), " two  words\n");
    }

    #[test]
    fn test_bullets_standardized() {
        assert_eq!(cleanup_text("\u{25CF} item"), "\u{2022} item");
    }

    #[test]
    fn test_empty() {
        assert_eq!(cleanup_text(""), "");
    }
}
