//! Paragraph buffering.
//!
//! Body blocks are appended until something forces a flush: a heading, a
//! layout gap, or the end of a page. A flush joins the buffer into one
//! paragraph and either emits it as a [`ParagraphRecord`] or, when it is
//! shorter than the configured minimum, drops it.

use crate::{hierarchy::HierarchyState, normalize::normalize, ParagraphRecord};

/// Default minimum paragraph length, in characters.
pub const DEFAULT_MIN_PARAGRAPH_CHARS: usize = 150;

/// Owns the pending paragraph text and the paragraph id counter.
#[derive(Debug, Clone)]
pub struct ParagraphAccumulator {
    book_id: String,
    min_chars: usize,
    buffer: Vec<String>,
    next_id: u64,
    discarded: usize,
    discarded_chars: usize,
}

impl ParagraphAccumulator {
    pub fn new(book_id: impl Into<String>, min_chars: usize) -> Self {
        Self {
            book_id: book_id.into(),
            min_chars,
            buffer: Vec::new(),
            next_id: 1,
            discarded: 0,
            discarded_chars: 0,
        }
    }

    /// Queue a normalized body block.
    pub fn append(&mut self, text: impl Into<String>) {
        self.buffer.push(text.into());
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Number of records emitted so far.
    pub fn emitted(&self) -> u64 {
        self.next_id - 1
    }

    /// Number of flushes dropped for being too short.
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    /// Characters lost to dropped flushes.
    pub fn discarded_chars(&self) -> usize {
        self.discarded_chars
    }

    /// Finish the pending paragraph.
    ///
    /// An empty buffer is a no-op. Otherwise the buffer is cleared and its
    /// joined, normalized text becomes a record tagged with `page` and a
    /// snapshot of `hierarchy`, unless it is shorter than the minimum, in
    /// which case it is dropped without consuming an id.
    pub fn flush(&mut self, page: usize, hierarchy: &HierarchyState) -> Option<ParagraphRecord> {
        if self.buffer.is_empty() {
            return None;
        }

        let text = normalize(&self.buffer.join(" "));
        self.buffer.clear();

        let chars = text.chars().count();
        if chars < self.min_chars {
            self.discarded += 1;
            self.discarded_chars += chars;
            log::debug!(
                "page {}: dropped {}-char paragraph (minimum {})",
                page,
                chars,
                self.min_chars
            );
            return None;
        }

        let record = ParagraphRecord {
            book_id: self.book_id.clone(),
            paragraph_id: self.next_id,
            page,
            chapter_index: hierarchy.chapter_index,
            chapter_title: hierarchy.chapter_title.clone(),
            topic_index: hierarchy.topic_index,
            topic_title: hierarchy.topic_title.clone(),
            subtopic_index: hierarchy.subtopic_index,
            subtopic_title: hierarchy.subtopic_title.clone(),
            text,
        };
        self.next_id += 1;

        Some(record)
    }
}
