//! PDF page primitive source for parachunk.
//!
//! [`PdfSource`] opens a PDF with `lopdf` and serves each page as the
//! blocks / lines / spans model that `parachunk_core` consumes. Pages are
//! decoded lazily, one per [`PageSource::page`] call.

use std::path::Path;

use parachunk_core::{Page, PageSource};
use thiserror::Error;

use parser::backend::{LopdfBackend, PageId, PdfBackend};

pub mod cleanup;
pub mod parser;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Document is encrypted")]
    Encrypted,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<PdfError> for parachunk_core::Error {
    fn from(e: PdfError) -> Self {
        parachunk_core::Error::Source(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// A loaded PDF serving page primitives.
pub struct PdfSource {
    backend: Box<dyn PdfBackend>,
    pages: Vec<PageId>,
}

impl PdfSource {
    /// Parse PDF bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PdfError> {
        let backend = LopdfBackend::load_bytes(bytes)?;
        Ok(Self::with_backend(Box::new(backend)))
    }

    /// Read and parse the PDF at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PdfError> {
        let bytes = std::fs::read(path.as_ref())?;
        log::debug!(
            "read {} bytes from {}",
            bytes.len(),
            path.as_ref().display()
        );
        Self::from_bytes(&bytes)
    }

    /// Serve pages from an arbitrary backend, in page-number order.
    pub fn with_backend(backend: Box<dyn PdfBackend>) -> Self {
        let pages = backend.pages().into_values().collect();
        Self { backend, pages }
    }

    /// Distinct `/BaseFont` names across all pages, in first-use order.
    ///
    /// Pages whose resources cannot be read are skipped.
    pub fn font_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for &page_id in &self.pages {
            let fonts = match self.backend.page_fonts(page_id) {
                Ok(fonts) => fonts,
                Err(e) => {
                    log::warn!("skipping fonts of page object {:?}: {}", page_id, e);
                    continue;
                }
            };
            for name in fonts.into_iter().filter_map(|f| f.base_font) {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }
}

impl PageSource for PdfSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&self, number: usize) -> Result<Page, parachunk_core::Error> {
        let page_id = number
            .checked_sub(1)
            .and_then(|index| self.pages.get(index))
            .ok_or(parachunk_core::Error::PageOutOfRange(number))?;
        Ok(parser::layout::page_primitives(self.backend.as_ref(), *page_id)?)
    }
}
