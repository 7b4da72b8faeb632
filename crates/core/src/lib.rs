//! Core library for parachunk
//!
//! This crate implements the **Functional Core** of parachunk: the structural
//! inference engine that turns a stream of page layout primitives (pages of
//! blocks of lines of spans) into paragraph records labeled with their
//! chapter / topic / subtopic position.
//!
//! Nothing here performs I/O. Primitives arrive through the [`PageSource`]
//! trait; the PDF-backed implementation lives in the `parachunk_pdf` crate and
//! the command line shell in the `parachunk` binary.
//!
//! # Pipeline
//!
//! ```text
//! PageSource ──► fonts::estimate_body_font ──► body_font
//!     │
//!     └──► per block: normalize ─► classify ─► HierarchyState | ParagraphAccumulator
//!                                                   │
//!                                                   └──► ParagraphRecord[]
//! ```
//!
//! # Module Organization
//!
//! - [`types`]: page primitives and output records
//! - [`normalize`]: whitespace and hyphenation repair
//! - [`fonts`]: body font estimation
//! - [`classify`]: heading classification rules
//! - [`hierarchy`]: chapter / topic / subtopic state
//! - [`accumulator`]: paragraph buffering and flushing
//! - [`extract`]: the single-pass driver
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use parachunk_core::{extract, Document, ExtractConfig};
//!
//! let doc: Document = serde_json::from_str(&json)?;
//! let extraction = extract(&doc, &ExtractConfig::default())?;
//!
//! for record in &extraction.records {
//!     println!("{} p{}: {}", record.paragraph_id, record.page, record.text);
//! }
//! ```

use thiserror::Error;

pub mod accumulator;
pub mod classify;
pub mod extract;
pub mod fonts;
pub mod hierarchy;
pub mod normalize;
pub mod types;

pub use accumulator::ParagraphAccumulator;
pub use classify::{classify, HeadingKind};
pub use extract::{
    book_id_from_path, extract, ExtractConfig, Extraction, ExtractionReport, Extractor,
    HeadingEvent,
};
pub use fonts::{estimate_body_font, sample_font_sizes, FontHistogram, FALLBACK_BODY_FONT};
pub use hierarchy::HierarchyState;
pub use normalize::normalize;
pub use types::*;

#[derive(Debug, Error)]
pub enum Error {
    /// The page primitive source could not be opened or read.
    #[error("Page source unavailable: {0}")]
    Source(String),
    #[error("Page {0} is out of range")]
    PageOutOfRange(usize),
}

/// Supplier of page layout primitives.
///
/// Pages are numbered from 1. Implementations may build each page lazily; the
/// extraction pass asks for every page in order and never holds more than one
/// at a time.
pub trait PageSource {
    /// Total number of pages available.
    fn page_count(&self) -> usize;

    /// Read the page with the given 1-based number.
    fn page(&self, number: usize) -> Result<Page, Error>;
}
