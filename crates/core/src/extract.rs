//! The extraction pass.
//!
//! One pass reads a [`PageSource`] twice: a prefix of it to estimate the body
//! font, then every page in order to classify blocks and accumulate
//! paragraphs. All mutable state belongs to an [`Extractor`] value, so passes
//! over different documents are fully independent.

use std::path::Path;

use serde::Serialize;

use crate::{
    accumulator::{ParagraphAccumulator, DEFAULT_MIN_PARAGRAPH_CHARS},
    classify::{classify, HeadingKind},
    fonts::{sample_font_sizes, DEFAULT_SAMPLE_LIMIT},
    hierarchy::HierarchyState,
    Block, Error, Page, PageSource, ParagraphRecord,
};

/// Settings for one extraction pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractConfig {
    /// Identifier copied into every record.
    pub book_id: String,
    /// Paragraphs shorter than this many characters are dropped.
    pub min_paragraph_chars: usize,
    /// Font estimation stops at the first page boundary past this many spans.
    pub body_font_sample_limit: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            book_id: "BOOK".to_string(),
            min_paragraph_chars: DEFAULT_MIN_PARAGRAPH_CHARS,
            body_font_sample_limit: DEFAULT_SAMPLE_LIMIT,
        }
    }
}

impl ExtractConfig {
    /// Default settings with the book id derived from a file name.
    pub fn for_path(path: &Path) -> Self {
        Self {
            book_id: book_id_from_path(path),
            ..Self::default()
        }
    }
}

/// Derive a book id from a file stem: upper-cased, with every run of
/// characters other than ASCII letters and digits replaced by `_`.
///
/// `harrison ch 1-12.pdf` becomes `HARRISON_CH_1_12`.
pub fn book_id_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut id = String::with_capacity(stem.len());
    for c in stem.chars() {
        if c.is_ascii_alphanumeric() {
            id.push(c.to_ascii_uppercase());
        } else if !id.ends_with('_') {
            id.push('_');
        }
    }

    let id = id.trim_matches('_');
    if id.is_empty() {
        ExtractConfig::default().book_id
    } else {
        id.to_string()
    }
}

/// A heading transition observed during the pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadingEvent {
    pub kind: HeadingKind,
    pub page: usize,
    pub title: String,
    pub chapter_index: u32,
    pub topic_index: u32,
    pub subtopic_index: u32,
}

/// What happened during a pass, beyond the records themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionReport {
    pub body_font: i64,
    pub pages: usize,
    pub blocks: usize,
    /// Blocks without visible text, each treated as a paragraph break.
    pub gaps: usize,
    pub headings: Vec<HeadingEvent>,
    pub paragraphs: u64,
    /// Flushes dropped for being shorter than the minimum.
    pub discarded: usize,
    pub discarded_chars: usize,
}

/// Output of a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub records: Vec<ParagraphRecord>,
    pub report: ExtractionReport,
}

/// Block-by-block state machine behind [`extract`].
#[derive(Debug, Clone)]
pub struct Extractor {
    body_font: i64,
    hierarchy: HierarchyState,
    paragraphs: ParagraphAccumulator,
    records: Vec<ParagraphRecord>,
    headings: Vec<HeadingEvent>,
    pages: usize,
    blocks: usize,
    gaps: usize,
}

impl Extractor {
    pub fn new(config: &ExtractConfig, body_font: i64) -> Self {
        Self {
            body_font,
            hierarchy: HierarchyState::new(),
            paragraphs: ParagraphAccumulator::new(config.book_id.clone(), config.min_paragraph_chars),
            records: Vec::new(),
            headings: Vec::new(),
            pages: 0,
            blocks: 0,
            gaps: 0,
        }
    }

    pub fn hierarchy(&self) -> &HierarchyState {
        &self.hierarchy
    }

    pub fn records(&self) -> &[ParagraphRecord] {
        &self.records
    }

    fn flush(&mut self, page: usize) {
        if let Some(record) = self.paragraphs.flush(page, &self.hierarchy) {
            self.records.push(record);
        }
    }

    /// Feed one block from page `page`.
    pub fn process_block(&mut self, page: usize, block: &Block) {
        self.blocks += 1;

        let text = block.text();
        if text.is_empty() {
            self.gaps += 1;
            self.flush(page);
            return;
        }

        let kind = classify(&text, block.max_font(), self.body_font);
        if kind == HeadingKind::None {
            self.paragraphs.append(text);
            return;
        }

        self.flush(page);
        self.hierarchy.advance(kind, &text);
        log::debug!("page {}: {} heading {:?}", page, kind, text);

        self.headings.push(HeadingEvent {
            kind,
            page,
            title: text,
            chapter_index: self.hierarchy.chapter_index,
            topic_index: self.hierarchy.topic_index,
            subtopic_index: self.hierarchy.subtopic_index,
        });
    }

    /// Close page `page`, flushing any pending paragraph.
    pub fn end_page(&mut self, page: usize) {
        self.pages += 1;
        self.flush(page);
    }

    /// Feed every block of a page, then close it.
    pub fn process_page(&mut self, number: usize, page: &Page) {
        for block in &page.blocks {
            self.process_block(number, block);
        }
        self.end_page(number);
    }

    pub fn finish(self) -> Extraction {
        let report = ExtractionReport {
            body_font: self.body_font,
            pages: self.pages,
            blocks: self.blocks,
            gaps: self.gaps,
            headings: self.headings,
            paragraphs: self.paragraphs.emitted(),
            discarded: self.paragraphs.discarded(),
            discarded_chars: self.paragraphs.discarded_chars(),
        };

        Extraction {
            records: self.records,
            report,
        }
    }
}

/// Run a full extraction pass over `source`.
///
/// Fails only when the source cannot be read.
pub fn extract(source: &dyn PageSource, config: &ExtractConfig) -> Result<Extraction, Error> {
    let histogram = sample_font_sizes(source, config.body_font_sample_limit)?;
    let body_font = histogram.body_font();
    log::info!(
        "body font {} from {} spans on {} pages",
        body_font,
        histogram.sampled,
        histogram.pages_read
    );

    let mut extractor = Extractor::new(config, body_font);
    for number in 1..=source.page_count() {
        let page = source.page(number)?;
        extractor.process_page(number, &page);
    }

    let extraction = extractor.finish();
    log::info!(
        "{} paragraphs from {} pages ({} headings, {} short paragraphs dropped)",
        extraction.report.paragraphs,
        extraction.report.pages,
        extraction.report.headings.len(),
        extraction.report.discarded
    );

    Ok(extraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Document, Line, Span};

    const BODY: f32 = 10.0;

    fn body(text: &str) -> Block {
        Block::single(text, BODY)
    }

    /// A body block of exactly `len` characters.
    fn body_of_len(len: usize) -> Block {
        body(&"word ".repeat(len / 5 + 1)[..len].replace(' ', "w"))
    }

    fn heading(text: &str, size: f32) -> Block {
        Block::single(text, size)
    }

    fn run(pages: Vec<Page>) -> Extraction {
        extract(&Document::new(pages), &ExtractConfig::default()).unwrap()
    }

    #[test]
    fn test_chapter_heading_sets_hierarchy() {
        let page = Page::new(vec![
            heading("CHAPTER 1 INTRODUCTION", BODY + 3.0),
            body_of_len(200),
            body_of_len(200),
        ]);
        let extraction = run(vec![page]);

        assert_eq!(extraction.report.body_font, 10);
        assert_eq!(extraction.report.headings.len(), 1);
        let event = &extraction.report.headings[0];
        assert_eq!(event.kind, HeadingKind::Chapter);
        assert_eq!(event.chapter_index, 1);
        assert_eq!(event.title, "CHAPTER 1 INTRODUCTION");

        let record = &extraction.records[0];
        assert_eq!(record.chapter_index, 1);
        assert_eq!(record.chapter_title.as_deref(), Some("CHAPTER 1 INTRODUCTION"));
    }

    #[test]
    fn test_subtopic_heading_increments_subtopic() {
        let mut extractor = Extractor::new(&ExtractConfig::default(), 10);
        extractor.process_block(1, &heading("Overview", 12.0));
        assert_eq!(extractor.hierarchy().subtopic_index, 1);
        assert_eq!(extractor.hierarchy().subtopic_title.as_deref(), Some("Overview"));
    }

    #[test]
    fn test_body_blocks_flush_at_end_of_page() {
        let blocks = vec![body_of_len(70), body_of_len(70), body_of_len(58)];
        let expected = blocks
            .iter()
            .map(Block::text)
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(expected.chars().count(), 200);

        let extraction = run(vec![Page::new(blocks)]);
        assert_eq!(extraction.records.len(), 1);
        let record = &extraction.records[0];
        assert_eq!(record.paragraph_id, 1);
        assert_eq!(record.page, 1);
        assert_eq!(record.text, expected);
        assert_eq!(record.book_id, "BOOK");
    }

    #[test]
    fn test_short_paragraph_before_chapter_is_dropped() {
        let mut extractor = Extractor::new(&ExtractConfig::default(), 10);
        extractor.process_block(1, &body_of_len(50));
        extractor.process_block(1, &heading("CHAPTER 2 THE HEART", 14.0));

        assert!(extractor.records().is_empty());
        assert_eq!(extractor.hierarchy().chapter_index, 1);

        extractor.process_block(1, &body_of_len(160));
        extractor.end_page(1);
        let extraction = extractor.finish();
        assert_eq!(extraction.records.len(), 1);
        assert_eq!(extraction.records[0].paragraph_id, 1);
        assert_eq!(extraction.report.discarded, 1);
        assert_eq!(extraction.report.discarded_chars, 50);
    }

    #[test]
    fn test_empty_document() {
        let extraction = run(Vec::new());
        assert_eq!(extraction.report.body_font, 10);
        assert!(extraction.records.is_empty());

        let extraction = run(vec![Page::default(), Page::new(vec![Block::default()])]);
        assert_eq!(extraction.report.body_font, 10);
        assert_eq!(extraction.report.pages, 2);
        assert_eq!(extraction.report.gaps, 1);
        assert!(extraction.records.is_empty());
    }

    #[test]
    fn test_headings_split_paragraphs() {
        let page = Page::new(vec![
            body_of_len(100),
            body_of_len(100),
            heading("ANATOMY", 13.0),
            body_of_len(100),
            body_of_len(100),
        ]);
        let extraction = run(vec![page]);

        assert_eq!(extraction.records.len(), 2);
        assert_eq!(extraction.records[0].topic_index, 0);
        assert!(extraction.records[0].topic_title.is_none());
        assert_eq!(extraction.records[1].topic_index, 1);
        assert_eq!(extraction.records[1].topic_title.as_deref(), Some("ANATOMY"));
        assert!(extraction.records.iter().all(|r| !r.text.contains("ANATOMY")));
    }

    #[test]
    fn test_gap_block_breaks_paragraph() {
        let gap = Block::new(vec![Line::new(vec![Span::new("   ", 10.0)])]);
        let page = Page::new(vec![body_of_len(160), gap, body_of_len(160)]);
        let extraction = run(vec![page]);

        assert_eq!(extraction.records.len(), 2);
        assert_eq!(extraction.report.gaps, 1);
    }

    #[test]
    fn test_paragraph_does_not_span_pages() {
        let extraction = run(vec![
            Page::new(vec![body_of_len(100)]),
            Page::new(vec![body_of_len(100)]),
            Page::new(vec![body_of_len(160)]),
        ]);

        assert_eq!(extraction.records.len(), 1);
        assert_eq!(extraction.records[0].page, 3);
        assert_eq!(extraction.report.discarded, 2);
    }

    #[test]
    fn test_record_page_is_flush_page() {
        let mut extractor = Extractor::new(&ExtractConfig::default(), 10);
        extractor.process_block(4, &body_of_len(200));
        extractor.end_page(4);
        assert_eq!(extractor.records()[0].page, 4);
    }

    #[test]
    fn test_ids_gapless_and_hierarchy_monotonic() {
        let pages = vec![
            Page::new(vec![
                heading("CHAPTER 1 BASICS", 14.0),
                body_of_len(40),
                heading("CELLS", 13.0),
                body_of_len(300),
                heading("Membranes", 11.0),
                body_of_len(180),
                body_of_len(20),
            ]),
            Page::new(vec![
                body_of_len(10),
                heading("Organelles", 11.0),
                body_of_len(250),
                heading("CHAPTER 2 TISSUES", 14.0),
                body_of_len(151),
                heading("EPITHELIUM", 12.0),
                body_of_len(149),
            ]),
        ];
        let extraction = run(pages);
        let records = &extraction.records;

        let ids: Vec<u64> = records.iter().map(|r| r.paragraph_id).collect();
        assert_eq!(ids, (1..=records.len() as u64).collect::<Vec<_>>());
        assert_eq!(records.len(), 4);

        for pair in records.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(b.chapter_index >= a.chapter_index);
            if b.chapter_index == a.chapter_index {
                assert!(b.topic_index >= a.topic_index);
                if b.topic_index == a.topic_index {
                    assert!(b.subtopic_index >= a.subtopic_index);
                }
            }
        }

        let last_in_chapter_one = &records[2];
        assert_eq!(last_in_chapter_one.chapter_index, 1);
        assert_eq!(last_in_chapter_one.topic_title.as_deref(), Some("CELLS"));
        assert_eq!(last_in_chapter_one.subtopic_index, 2);
        assert_eq!(last_in_chapter_one.subtopic_title.as_deref(), Some("Organelles"));

        let chapter_two = &records[3];
        assert_eq!(chapter_two.chapter_index, 2);
        assert_eq!(chapter_two.topic_index, 0);
        assert!(chapter_two.topic_title.is_none());
        assert_eq!(chapter_two.subtopic_index, 0);
        assert!(chapter_two.subtopic_title.is_none());

        let kinds: Vec<HeadingKind> = extraction.report.headings.iter().map(|h| h.kind).collect();
        assert_eq!(
            kinds,
            vec![
                HeadingKind::Chapter,
                HeadingKind::Topic,
                HeadingKind::Subtopic,
                HeadingKind::Subtopic,
                HeadingKind::Chapter,
                HeadingKind::Topic,
            ]
        );
        assert_eq!(extraction.report.discarded, 3);
    }

    #[test]
    fn test_custom_config() {
        let config = ExtractConfig {
            book_id: "HARRISON".to_string(),
            min_paragraph_chars: 10,
            ..ExtractConfig::default()
        };
        let doc = Document::new(vec![Page::new(vec![body("Short but kept.")])]);
        let extraction = extract(&doc, &config).unwrap();

        assert_eq!(extraction.records.len(), 1);
        assert_eq!(extraction.records[0].book_id, "HARRISON");
    }

    #[test]
    fn test_source_errors_are_fatal() {
        struct Broken;
        impl PageSource for Broken {
            fn page_count(&self) -> usize {
                1
            }
            fn page(&self, _number: usize) -> Result<Page, Error> {
                Err(Error::Source("unreadable".to_string()))
            }
        }

        let result = extract(&Broken, &ExtractConfig::default());
        assert!(matches!(result, Err(Error::Source(_))));
    }

    #[test]
    fn test_book_id_from_path() {
        assert_eq!(
            book_id_from_path(Path::new("./PDF/Harrison_CH_1_12-1.pdf")),
            "HARRISON_CH_1_12_1"
        );
        assert_eq!(book_id_from_path(Path::new("harrison ch 1-12.pdf")), "HARRISON_CH_1_12");
        assert_eq!(book_id_from_path(Path::new("---.pdf")), "BOOK");
        assert_eq!(ExtractConfig::for_path(Path::new("a b.json")).book_id, "A_B");
    }
}
