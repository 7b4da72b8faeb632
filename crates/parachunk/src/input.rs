use std::path::{Path, PathBuf};

use parachunk_core::{Document, ExtractConfig, PageSource};
use parachunk_pdf::PdfSource;

use crate::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum InputFormat {
    /// A PDF file
    Pdf,
    /// A JSON layout dump: `{"pages": [{"blocks": [{"lines": [{"spans": [...]}]}]}]}`
    Json,
}

impl InputFormat {
    /// Guess from the file extension; anything but `.json` is read as PDF.
    pub fn detect(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => InputFormat::Json,
            _ => InputFormat::Pdf,
        }
    }
}

/// Arguments naming the document to read.
#[derive(Debug, Clone, clap::Args)]
pub struct InputArgs {
    /// Path to the PDF file or JSON layout dump
    pub path: PathBuf,

    /// Input format (detected from the extension when omitted)
    #[arg(long, value_enum, env = "PARACHUNK_INPUT_FORMAT")]
    pub input_format: Option<InputFormat>,
}

/// Arguments controlling the extraction pass.
#[derive(Debug, Clone, clap::Args)]
pub struct ExtractArgs {
    /// Identifier written into every record (defaults to the file name)
    #[arg(long, env = "PARACHUNK_BOOK_ID")]
    pub book_id: Option<String>,

    /// Paragraphs shorter than this many characters are dropped
    #[arg(
        long,
        env = "PARACHUNK_MIN_PARAGRAPH_CHARS",
        default_value_t = parachunk_core::accumulator::DEFAULT_MIN_PARAGRAPH_CHARS
    )]
    pub min_paragraph_chars: usize,

    /// Number of spans after which body font sampling stops
    #[arg(
        long,
        env = "PARACHUNK_FONT_SAMPLE_LIMIT",
        default_value_t = parachunk_core::fonts::DEFAULT_SAMPLE_LIMIT
    )]
    pub font_sample_limit: usize,
}

impl ExtractArgs {
    pub fn config(&self, path: &Path) -> ExtractConfig {
        let mut config = ExtractConfig::for_path(path);
        if let Some(book_id) = &self.book_id {
            config.book_id = book_id.clone();
        }
        config.min_paragraph_chars = self.min_paragraph_chars;
        config.body_font_sample_limit = self.font_sample_limit;
        config
    }
}

/// A loaded document.
pub enum Input {
    Pdf(PdfSource),
    Json(Document),
}

impl Input {
    pub fn load(args: &InputArgs) -> Result<Self> {
        let format = args
            .input_format
            .unwrap_or_else(|| InputFormat::detect(&args.path));
        log::info!("loading {} as {:?}", args.path.display(), format);

        let load_error = |message: String| Error::Load {
            path: args.path.display().to_string(),
            message,
        };

        match format {
            InputFormat::Pdf => PdfSource::open(&args.path)
                .map(Input::Pdf)
                .map_err(|e| load_error(e.to_string()).into()),
            InputFormat::Json => {
                let file = std::fs::File::open(&args.path)
                    .map_err(|e| load_error(e.to_string()))?;
                let document: Document =
                    serde_json::from_reader(std::io::BufReader::new(file))
                        .map_err(|e| load_error(e.to_string()))?;
                Ok(Input::Json(document))
            }
        }
    }

    pub fn source(&self) -> &dyn PageSource {
        match self {
            Input::Pdf(source) => source,
            Input::Json(document) => document,
        }
    }

    /// Font names declared by the document, when the format carries them.
    pub fn font_names(&self) -> Option<Vec<String>> {
        match self {
            Input::Pdf(source) => Some(source.font_names()),
            Input::Json(_) => None,
        }
    }
}
