//! Heading classification.
//!
//! A block is judged from its normalized text and the largest font size
//! among its spans, relative to the document's body font. The decision is an
//! ordered rule table: the first rule whose predicate holds decides the
//! outcome, and text matching no rule is body text.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Outcome of classifying one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingKind {
    Chapter,
    Topic,
    Subtopic,
    /// Ordinary body text.
    None,
}

impl HeadingKind {
    pub fn is_heading(self) -> bool {
        self != HeadingKind::None
    }
}

impl fmt::Display for HeadingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeadingKind::Chapter => write!(f, "chapter"),
            HeadingKind::Topic => write!(f, "topic"),
            HeadingKind::Subtopic => write!(f, "subtopic"),
            HeadingKind::None => write!(f, "none"),
        }
    }
}

/// Texts shorter than this (in characters, after trimming) are never
/// headings.
const MIN_HEADING_CHARS: usize = 3;

/// Subtopic headings must be shorter than this (in characters).
const MAX_SUBTOPIC_CHARS: usize = 80;

/// Font size increase over the body font for chapter and topic headings.
const MAJOR_HEADING_DELTA: f32 = 2.0;

/// Font size increase over the body font for subtopic headings.
const MINOR_HEADING_DELTA: f32 = 1.0;

/// Measurements a rule may look at.
#[derive(Debug, Clone, Copy)]
struct Features<'a> {
    text: &'a str,
    chars: usize,
    all_caps: bool,
    /// `max_font - body_font`.
    size_delta: f32,
}

struct Rule {
    applies: fn(&Features) -> bool,
    decide: fn(&Features) -> HeadingKind,
}

/// Capitalized and clearly larger: a chapter if numbered, else a topic.
fn major_heading(f: &Features) -> bool {
    f.all_caps && f.size_delta >= MAJOR_HEADING_DELTA
}

fn chapter_or_topic(f: &Features) -> HeadingKind {
    if is_chapter_label(f.text) {
        HeadingKind::Chapter
    } else {
        HeadingKind::Topic
    }
}

/// Somewhat larger, mixed case and short.
fn minor_heading(f: &Features) -> bool {
    f.size_delta >= MINOR_HEADING_DELTA && !f.all_caps && f.chars < MAX_SUBTOPIC_CHARS
}

fn subtopic(_: &Features) -> HeadingKind {
    HeadingKind::Subtopic
}

/// Rules in priority order.
const RULES: &[Rule] = &[
    Rule {
        applies: major_heading,
        decide: chapter_or_topic,
    },
    Rule {
        applies: minor_heading,
        decide: subtopic,
    },
];

/// True when the text has at least one ASCII letter and every ASCII letter
/// is uppercase. Digits, punctuation and non-ASCII characters are ignored.
pub fn is_all_caps(text: &str) -> bool {
    let mut letters = text.chars().filter(char::is_ascii_alphabetic).peekable();
    letters.peek().is_some() && letters.all(|c| c.is_ascii_uppercase())
}

/// `CHAPTER` followed by whitespace and a number, at the start of the text.
fn is_chapter_label(text: &str) -> bool {
    static RE_CHAPTER: OnceLock<Regex> = OnceLock::new();
    let re_chapter = RE_CHAPTER.get_or_init(|| Regex::new(r"^CHAPTER\s+\d+").unwrap());
    re_chapter.is_match(text)
}

/// Classify a block from its text and largest span font size.
pub fn classify(text: &str, max_font: f32, body_font: i64) -> HeadingKind {
    let text = text.trim();
    let chars = text.chars().count();
    if chars < MIN_HEADING_CHARS {
        return HeadingKind::None;
    }

    let features = Features {
        text,
        chars,
        all_caps: is_all_caps(text),
        size_delta: max_font - body_font as f32,
    };

    RULES
        .iter()
        .find(|rule| (rule.applies)(&features))
        .map(|rule| (rule.decide)(&features))
        .unwrap_or(HeadingKind::None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chapter_heading() {
        assert_eq!(classify("CHAPTER 1 INTRODUCTION", 13.0, 10), HeadingKind::Chapter);
        assert_eq!(classify("CHAPTER\t12", 12.0, 10), HeadingKind::Chapter);
    }

    #[test]
    fn test_all_caps_without_chapter_label_is_topic() {
        assert_eq!(classify("CARDIOVASCULAR SYSTEM", 12.0, 10), HeadingKind::Topic);
        assert_eq!(classify("CHAPTER ONE", 14.0, 10), HeadingKind::Topic);
        assert_eq!(classify("PART 2: CHAPTER 3", 14.0, 10), HeadingKind::Topic);
    }

    #[test]
    fn test_all_caps_needs_two_points() {
        assert_eq!(classify("CARDIOVASCULAR SYSTEM", 11.9, 10), HeadingKind::None);
        // Not promoted to subtopic either: all-caps text is excluded there.
        assert_eq!(classify("CARDIOVASCULAR SYSTEM", 11.0, 10), HeadingKind::None);
    }

    #[test]
    fn test_subtopic_heading() {
        assert_eq!(classify("Overview", 12.0, 10), HeadingKind::Subtopic);
        assert_eq!(classify("Clinical Features", 11.0, 10), HeadingKind::Subtopic);
    }

    #[test]
    fn test_subtopic_too_long_is_body() {
        let long = "A".to_string() + &"b".repeat(79);
        assert_eq!(long.chars().count(), 80);
        assert_eq!(classify(&long, 12.0, 10), HeadingKind::None);
        assert_eq!(classify(&long[..79], 12.0, 10), HeadingKind::Subtopic);
    }

    #[test]
    fn test_body_size_text_is_body() {
        assert_eq!(classify("Ordinary sentence.", 10.0, 10), HeadingKind::None);
        assert_eq!(classify("SHOUTING BODY", 10.0, 10), HeadingKind::None);
    }

    #[test]
    fn test_short_text_is_never_heading() {
        assert_eq!(classify("IV", 30.0, 10), HeadingKind::None);
        assert_eq!(classify("  Ab  ", 30.0, 10), HeadingKind::None);
        assert_eq!(classify("ABC", 30.0, 10), HeadingKind::Topic);
    }

    #[test]
    fn test_text_without_letters_is_not_all_caps() {
        assert!(!is_all_caps("1234 --"));
        // Size qualifies, no letters: falls through to the subtopic rule.
        assert_eq!(classify("1.2.3", 14.0, 10), HeadingKind::Subtopic);
    }

    #[test]
    fn test_is_all_caps_ignores_non_letters() {
        assert!(is_all_caps("CHAPTER 1: INTRODUCTION!"));
        assert!(is_all_caps("ÉTUDE X"));
        assert!(!is_all_caps("Chapter 1"));
        assert!(!is_all_caps(""));
    }

    #[test]
    fn test_heading_kind_display() {
        assert_eq!(HeadingKind::Chapter.to_string(), "chapter");
        assert_eq!(HeadingKind::None.to_string(), "none");
        assert!(HeadingKind::Subtopic.is_heading());
        assert!(!HeadingKind::None.is_heading());
    }
}
