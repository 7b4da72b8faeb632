use serde::{Deserialize, Serialize};

use crate::{normalize::normalize, Error, PageSource};

/// A run of text sharing one font size.
///
/// Both fields are optional so that loosely produced layout dumps can be
/// deserialized as-is. A span missing either field is malformed and is
/// ignored by every consumer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Span {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub size: Option<f32>,
}

impl Span {
    pub fn new(text: impl Into<String>, size: f32) -> Self {
        Span {
            text: Some(text.into()),
            size: Some(size),
        }
    }

    /// Font size, if the span is well formed.
    pub fn font_size(&self) -> Option<f32> {
        match (&self.text, self.size) {
            (Some(_), Some(size)) if size.is_finite() => Some(size),
            _ => None,
        }
    }

    /// Text and size of a well-formed span carrying visible characters.
    fn visible(&self) -> Option<(&str, f32)> {
        let size = self.font_size()?;
        let text = self.text.as_deref()?;
        if text.trim().is_empty() {
            None
        } else {
            Some((text, size))
        }
    }
}

/// Spans sharing a visual row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Line {
    #[serde(default)]
    pub spans: Vec<Span>,
}

impl Line {
    pub fn new(spans: Vec<Span>) -> Self {
        Line { spans }
    }
}

/// One layout unit: a paragraph-like group of lines, or a heading.
///
/// A block without visible text is a layout gap.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub lines: Vec<Line>,
}

impl Block {
    pub fn new(lines: Vec<Line>) -> Self {
        Block { lines }
    }

    /// Shorthand for a block made of a single one-span line.
    pub fn single(text: impl Into<String>, size: f32) -> Self {
        Block::new(vec![Line::new(vec![Span::new(text, size)])])
    }

    /// Largest font size among spans with visible text, `0.0` when there are
    /// none.
    pub fn max_font(&self) -> f32 {
        self.lines
            .iter()
            .flat_map(|line| line.spans.iter())
            .filter_map(Span::visible)
            .map(|(_, size)| size)
            .fold(0.0, f32::max)
    }

    /// Normalized block text.
    ///
    /// Visible span texts are joined with a space inside each line, lines are
    /// joined with a space, and the result goes through [`normalize`].
    pub fn text(&self) -> String {
        let lines: Vec<String> = self
            .lines
            .iter()
            .map(|line| {
                line.spans
                    .iter()
                    .filter_map(Span::visible)
                    .map(|(text, _)| text)
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .filter(|text| !text.is_empty())
            .collect();

        normalize(&lines.join(" "))
    }
}

/// Blocks of a single page, in reading order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl Page {
    pub fn new(blocks: Vec<Block>) -> Self {
        Page { blocks }
    }
}

/// An in-memory document.
///
/// The serialized shape matches a per-page layout dump:
/// `{"pages": [{"blocks": [{"lines": [{"spans": [{"text": "..", "size": 10.0}]}]}]}]}`.
/// Unknown keys (bounding boxes, font names, flags) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub pages: Vec<Page>,
}

impl Document {
    pub fn new(pages: Vec<Page>) -> Self {
        Document { pages }
    }
}

impl PageSource for Document {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&self, number: usize) -> Result<Page, Error> {
        number
            .checked_sub(1)
            .and_then(|index| self.pages.get(index))
            .cloned()
            .ok_or(Error::PageOutOfRange(number))
    }
}

/// A finished paragraph with its place in the inferred hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphRecord {
    pub book_id: String,
    pub paragraph_id: u64,
    pub page: usize,
    pub chapter_index: u32,
    pub chapter_title: Option<String>,
    pub topic_index: u32,
    pub topic_title: Option<String>,
    pub subtopic_index: u32,
    pub subtopic_title: Option<String>,
    pub text: String,
}
