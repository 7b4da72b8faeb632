//! Body font estimation.
//!
//! The body font is the most frequent rounded span size in the first pages
//! of a document. Sampling stops at the first page boundary after the sample
//! cap is exceeded, so long documents are only partially read.

use indexmap::IndexMap;
use serde::Serialize;

use crate::{Error, PageSource};

/// Body font used when a document has no spans at all.
pub const FALLBACK_BODY_FONT: i64 = 10;

/// Default number of sampled spans after which estimation stops.
pub const DEFAULT_SAMPLE_LIMIT: usize = 1000;

/// Frequency of rounded font sizes, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FontHistogram {
    /// `(rounded_size, span_count)` pairs in the order sizes were first seen.
    pub sizes: Vec<(i64, usize)>,
    /// Number of spans sampled.
    pub sampled: usize,
    /// Number of pages read before sampling stopped.
    pub pages_read: usize,
}

impl FontHistogram {
    /// The most frequent size. Ties go to the size seen first.
    pub fn body_font(&self) -> i64 {
        let mut best: Option<(i64, usize)> = None;
        for &(size, count) in &self.sizes {
            if best.map_or(true, |(_, best_count)| count > best_count) {
                best = Some((size, count));
            }
        }
        best.map(|(size, _)| size).unwrap_or(FALLBACK_BODY_FONT)
    }
}

/// Nearest integer, ties to even: 10.5 rounds to 10, 11.5 to 12.
fn round_size(size: f32) -> i64 {
    size.round_ties_even() as i64
}

/// Sample span sizes from `source` into a histogram.
///
/// Pages are read in order. After each page the sample count is compared to
/// `sample_limit`; once it is exceeded no further pages are read.
pub fn sample_font_sizes(
    source: &dyn PageSource,
    sample_limit: usize,
) -> Result<FontHistogram, Error> {
    let mut counts: IndexMap<i64, usize> = IndexMap::new();
    let mut sampled = 0usize;
    let mut pages_read = 0usize;

    for number in 1..=source.page_count() {
        let page = source.page(number)?;
        pages_read += 1;

        let sizes = page
            .blocks
            .iter()
            .flat_map(|block| block.lines.iter())
            .flat_map(|line| line.spans.iter())
            .filter_map(|span| span.font_size());

        for size in sizes {
            *counts.entry(round_size(size)).or_insert(0) += 1;
            sampled += 1;
        }

        if sampled > sample_limit {
            log::debug!(
                "font sampling stopped after page {} ({} spans)",
                number,
                sampled
            );
            break;
        }
    }

    Ok(FontHistogram {
        sizes: counts.into_iter().collect(),
        sampled,
        pages_read,
    })
}

/// Estimate the body font size of a document.
///
/// Returns [`FALLBACK_BODY_FONT`] when the sampled pages contain no spans.
pub fn estimate_body_font(source: &dyn PageSource, sample_limit: usize) -> Result<i64, Error> {
    Ok(sample_font_sizes(source, sample_limit)?.body_font())
}
