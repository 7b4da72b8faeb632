//! Text extraction, line grouping, and block assembly.
//!
//! Turns a page's content stream into the page primitives consumed by
//! `parachunk_core`: blocks of lines of sized spans. Side effects (reading
//! the PDF) live behind the [`PdfBackend`] trait provided by the caller.
//!
//! # Pipeline
//!
//! ```text
//! content ops  ->  PlacedSpan[]  ->  PlacedLine[]  ->  blocks  ->  Page
//!   (per page)      extract          group_spans      group_lines
//! ```

use parachunk_core::{Block, Line, Page, Span};

use super::backend::{ContentOp, Operand, PageId, PdfBackend};
use crate::{cleanup::cleanup_text, PdfError};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A run of text at a position on the page, in user space.
#[derive(Debug, Clone)]
pub struct PlacedSpan {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub size: f32,
    /// Font resource key the run was shown with.
    pub font: Vec<u8>,
}

/// Runs sharing (approximately) one baseline, left to right.
#[derive(Debug, Clone)]
pub struct PlacedLine {
    pub runs: Vec<PlacedSpan>,
    pub y: f32,
    /// Largest run size on the line.
    pub size: f32,
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Spans whose baselines differ by at most this many points share a line.
const Y_TOLERANCE: f32 = 1.0;

/// Glyph advance as a fraction of the font size, used in place of real
/// glyph widths.
const APPROX_CHAR_WIDTH_RATIO: f32 = 0.5;

/// Gaps narrower than this (points) join runs without a space.
const MIN_WORD_GAP: f32 = 1.5;

/// Baseline distance, as a multiple of the previous line's size, above which
/// a new block starts.
const BLOCK_GAP_FACTOR: f32 = 1.4;

/// Size change between consecutive lines that starts a new block.
const BLOCK_SIZE_CHANGE: f32 = 1.0;

/// Runs whose sizes differ by less than this may be merged.
const SAME_SIZE_TOLERANCE: f32 = 0.5;

/// The identity text matrix: [a, b, c, d, tx, ty].
const IDENTITY_MATRIX: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

// ---------------------------------------------------------------------------
// Internal: text state
// ---------------------------------------------------------------------------

/// Text state tracked while walking a content stream.
#[derive(Debug, Clone)]
struct TextState {
    font_key: Vec<u8>,
    font_size: f32,
    text_matrix: [f32; 6],
    line_matrix: [f32; 6],
    /// Horizontal scaling as a fraction (Tz / 100).
    horiz_scale: f32,
    char_spacing: f32,
    word_spacing: f32,
    rise: f32,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_key: Vec::new(),
            font_size: 0.0,
            text_matrix: IDENTITY_MATRIX,
            line_matrix: IDENTITY_MATRIX,
            horiz_scale: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            rise: 0.0,
            leading: 0.0,
        }
    }
}

impl TextState {
    fn x(&self) -> f32 {
        self.text_matrix[4]
    }

    fn y(&self) -> f32 {
        self.text_matrix[5] + self.rise
    }

    /// Rendered size: `font_size * sqrt(b^2 + d^2)`.
    fn effective_size(&self) -> f32 {
        let scale = (self.text_matrix[1].powi(2) + self.text_matrix[3].powi(2)).sqrt();
        (self.font_size * scale).abs()
    }

    fn begin_text(&mut self) {
        self.text_matrix = IDENTITY_MATRIX;
        self.line_matrix = IDENTITY_MATRIX;
    }

    fn set_matrix(&mut self, m: [f32; 6]) {
        self.text_matrix = m;
        self.line_matrix = m;
    }

    /// `Td`: translate the line matrix and restart the text matrix from it.
    fn next_line(&mut self, tx: f32, ty: f32) {
        let m = self.line_matrix;
        self.line_matrix[4] = m[0] * tx + m[2] * ty + m[4];
        self.line_matrix[5] = m[1] * tx + m[3] * ty + m[5];
        self.text_matrix = self.line_matrix;
    }

    /// `T*`.
    fn next_line_leading(&mut self) {
        self.next_line(0.0, -self.leading);
    }

    /// Move right by `dx` text-space units.
    fn advance(&mut self, dx: f32) {
        self.text_matrix[4] += dx * self.text_matrix[0];
        self.text_matrix[5] += dx * self.text_matrix[1];
    }

    /// Move past `text` and return the user-space distance travelled.
    fn advance_over(&mut self, text: &str) -> f32 {
        let glyph = self.font_size * APPROX_CHAR_WIDTH_RATIO;
        let dx: f32 = text
            .chars()
            .map(|c| {
                let spacing = if c == ' ' { self.word_spacing } else { 0.0 };
                (glyph + self.char_spacing + spacing) * self.horiz_scale
            })
            .sum();
        let start = self.x();
        self.advance(dx);
        (self.x() - start).abs()
    }
}

// ---------------------------------------------------------------------------
// Public API: span extraction
// ---------------------------------------------------------------------------

/// Walk a page's content stream and collect the text it shows.
///
/// | Operator | Action |
/// |----------|--------|
/// | `BT`     | Reset text matrices |
/// | `Tf`     | Font and size |
/// | `Tm`     | Set text matrix |
/// | `Td` `TD` `T*` | Move to a new line (`TD` also sets leading) |
/// | `TL` `Tc` `Tw` `Tz` `Ts` | Leading, spacing, scaling, rise |
/// | `Tj` `'` `"` | Show a string |
/// | `TJ`     | Show strings with kerning |
pub fn extract_page_spans(
    backend: &dyn PdfBackend,
    page_id: PageId,
) -> Result<Vec<PlacedSpan>, PdfError> {
    let raw_content = backend.page_content(page_id)?;
    let ops = backend.decode_content(&raw_content)?;

    let mut state = TextState::default();
    let mut spans: Vec<PlacedSpan> = Vec::new();

    for op in &ops {
        match op.operator.as_str() {
            "BT" => state.begin_text(),
            "Tf" => set_font(op, &mut state),
            "Tm" => {
                let m: Vec<f32> = (0..6).filter_map(|i| op.number(i)).collect();
                if let Ok(m) = <[f32; 6]>::try_from(m) {
                    state.set_matrix(m);
                }
            }
            "Td" | "TD" => {
                if let (Some(tx), Some(ty)) = (op.number(0), op.number(1)) {
                    if op.operator == "TD" {
                        state.leading = -ty;
                    }
                    state.next_line(tx, ty);
                }
            }
            "T*" => state.next_line_leading(),
            "TL" => set_number(op, &mut state.leading),
            "Tc" => set_number(op, &mut state.char_spacing),
            "Tw" => set_number(op, &mut state.word_spacing),
            "Ts" => set_number(op, &mut state.rise),
            "Tz" => {
                if let Some(v) = op.number(0) {
                    state.horiz_scale = v / 100.0;
                }
            }
            "Tj" => {
                if let Some(operand) = op.operands.first() {
                    show_string(operand, backend, page_id, &mut state, &mut spans);
                }
            }
            "'" => {
                state.next_line_leading();
                if let Some(operand) = op.operands.first() {
                    show_string(operand, backend, page_id, &mut state, &mut spans);
                }
            }
            "\"" => {
                if let (Some(aw), Some(ac), Some(operand)) =
                    (op.number(0), op.number(1), op.operands.get(2))
                {
                    state.word_spacing = aw;
                    state.char_spacing = ac;
                    state.next_line_leading();
                    show_string(operand, backend, page_id, &mut state, &mut spans);
                }
            }
            "TJ" => {
                if let Some(Operand::Array(items)) = op.operands.first() {
                    show_array(items, backend, page_id, &mut state, &mut spans);
                }
            }
            _ => {}
        }
    }

    Ok(spans)
}

fn set_number(op: &ContentOp, target: &mut f32) {
    if let Some(v) = op.number(0) {
        *target = v;
    }
}

fn set_font(op: &ContentOp, state: &mut TextState) {
    let key = match op.operands.first() {
        Some(Operand::Name(n)) | Some(Operand::Str(n)) => n.clone(),
        _ => return,
    };
    state.font_key = key;
    state.font_size = op.number(1).unwrap_or(0.0);
}

fn decode(operand: &Operand, backend: &dyn PdfBackend, page_id: PageId, font: &[u8]) -> String {
    match operand {
        Operand::Str(bytes) => backend.decode_text(page_id, font, bytes),
        _ => String::new(),
    }
}

/// `Tj`, `'` and `"`: emit one span and move past it.
fn show_string(
    operand: &Operand,
    backend: &dyn PdfBackend,
    page_id: PageId,
    state: &mut TextState,
    spans: &mut Vec<PlacedSpan>,
) {
    let text = decode(operand, backend, page_id, &state.font_key);
    if text.is_empty() {
        return;
    }
    let (x, y, size) = (state.x(), state.y(), state.effective_size());
    let width = state.advance_over(&text);
    spans.push(PlacedSpan {
        text,
        x,
        y,
        width,
        size,
        font: state.font_key.clone(),
    });
}

/// `TJ`: strings interleaved with kerning adjustments in thousandths of a
/// text-space unit. A large enough negative adjustment reads as a word
/// break and becomes a space.
fn show_array(
    items: &[Operand],
    backend: &dyn PdfBackend,
    page_id: PageId,
    state: &mut TextState,
    spans: &mut Vec<PlacedSpan>,
) {
    let (x, y, size) = (state.x(), state.y(), state.effective_size());
    let mut text = String::new();
    let mut width = 0.0;

    for item in items {
        if let Operand::Str(_) = item {
            let fragment = decode(item, backend, page_id, &state.font_key);
            width += state.advance_over(&fragment);
            text.push_str(&fragment);
        } else if let Some(adjust) = item.as_number() {
            let dx = -adjust / 1000.0 * state.font_size * state.horiz_scale;
            let word_gap = state.font_size * APPROX_CHAR_WIDTH_RATIO * state.horiz_scale * 0.3;
            if dx > word_gap && !text.is_empty() && !text.ends_with(' ') {
                text.push(' ');
            }
            let start = state.x();
            state.advance(dx);
            width += state.x() - start;
        }
    }

    let text = text.trim_end();
    if text.is_empty() {
        return;
    }
    spans.push(PlacedSpan {
        text: text.to_string(),
        x,
        y,
        width,
        size,
        font: state.font_key.clone(),
    });
}

// ---------------------------------------------------------------------------
// Public API: span -> line grouping
// ---------------------------------------------------------------------------

/// Group spans into lines, top of the page first.
///
/// Spans within [`Y_TOLERANCE`] of the line's first baseline join it. Within
/// a line, touching runs of the same font and size are merged, with a space
/// when they are separated by a word-sized gap.
pub fn group_spans_into_lines(mut spans: Vec<PlacedSpan>) -> Vec<PlacedLine> {
    spans.retain(|s| s.size > 0.0 && !s.text.is_empty());
    spans.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut lines: Vec<PlacedLine> = Vec::new();
    let mut current: Vec<PlacedSpan> = Vec::new();

    for span in spans {
        let same_line = current
            .first()
            .is_some_and(|first| (first.y - span.y).abs() <= Y_TOLERANCE);
        if !same_line && !current.is_empty() {
            lines.push(assemble_line(std::mem::take(&mut current)));
        }
        current.push(span);
    }
    if !current.is_empty() {
        lines.push(assemble_line(current));
    }

    lines
}

fn assemble_line(mut spans: Vec<PlacedSpan>) -> PlacedLine {
    spans.sort_by(|a, b| a.x.total_cmp(&b.x));

    let mut runs: Vec<PlacedSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        if let Some(prev) = runs.last_mut() {
            let gap = span.x - (prev.x + prev.width);
            let same_font =
                prev.font == span.font && (prev.size - span.size).abs() < SAME_SIZE_TOLERANCE;

            if same_font && gap > -prev.size && gap < prev.size * 2.0 {
                if gap >= MIN_WORD_GAP && !prev.text.ends_with(' ') && !span.text.starts_with(' ')
                {
                    prev.text.push(' ');
                }
                prev.text.push_str(&span.text);
                prev.width = (span.x + span.width) - prev.x;
                continue;
            }
        }
        runs.push(span);
    }

    let y = runs.first().map(|r| r.y).unwrap_or(0.0);
    let size = runs.iter().map(|r| r.size).fold(0.0, f32::max);
    PlacedLine { runs, y, size }
}

// ---------------------------------------------------------------------------
// Public API: line -> block grouping
// ---------------------------------------------------------------------------

/// Group consecutive lines into blocks.
///
/// A new block starts when the baseline distance exceeds
/// [`BLOCK_GAP_FACTOR`] times the previous line's size, or when the line
/// size changes by [`BLOCK_SIZE_CHANGE`] or more (a heading next to body
/// text).
pub fn group_lines_into_blocks(lines: Vec<PlacedLine>) -> Vec<Vec<PlacedLine>> {
    let mut blocks: Vec<Vec<PlacedLine>> = Vec::new();
    let mut current: Vec<PlacedLine> = Vec::new();

    for line in lines {
        if let Some(prev) = current.last() {
            let gap_break = (prev.y - line.y).abs() > prev.size * BLOCK_GAP_FACTOR;
            let size_break = (prev.size - line.size).abs() >= BLOCK_SIZE_CHANGE;
            if gap_break || size_break {
                blocks.push(std::mem::take(&mut current));
            }
        }
        current.push(line);
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

/// Convert grouped lines into a core [`Page`], cleaning span text.
pub fn to_page(blocks: Vec<Vec<PlacedLine>>) -> Page {
    let blocks = blocks
        .into_iter()
        .map(|lines| {
            Block::new(
                lines
                    .into_iter()
                    .map(|line| {
                        Line::new(
                            line.runs
                                .into_iter()
                                .map(|run| Span::new(cleanup_text(&run.text), run.size))
                                .collect(),
                        )
                    })
                    .collect(),
            )
        })
        .collect();
    Page::new(blocks)
}

// ---------------------------------------------------------------------------
// Public API: full pipeline
// ---------------------------------------------------------------------------

/// Extract the page primitives of one page.
pub fn page_primitives(backend: &dyn PdfBackend, page_id: PageId) -> Result<Page, PdfError> {
    let spans = extract_page_spans(backend, page_id)?;
    let span_count = spans.len();
    let lines = group_spans_into_lines(spans);
    let line_count = lines.len();
    let blocks = group_lines_into_blocks(lines);

    log::trace!(
        "page object {:?}: {} spans, {} lines, {} blocks",
        page_id,
        span_count,
        line_count,
        blocks.len()
    );

    Ok(to_page(blocks))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
