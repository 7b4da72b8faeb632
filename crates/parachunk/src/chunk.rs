use std::path::{Path, PathBuf};

use parachunk_core::ExtractionReport;

use crate::input::{ExtractArgs, Input, InputArgs};
use crate::prelude::{eprintln, println, *};

#[derive(Debug, clap::Parser)]
#[command(name = "chunk")]
#[command(about = "Split a document into paragraph records")]
pub struct App {
    #[clap(flatten)]
    input: InputArgs,

    #[clap(flatten)]
    extract: ExtractArgs,

    /// Write records to this file instead of stdout
    #[arg(short, long, env = "PARACHUNK_OUTPUT")]
    output: Option<PathBuf>,
}

pub fn run(app: App, global: crate::Global) -> Result<()> {
    let input = Input::load(&app.input)?;
    let config = app.extract.config(&app.input.path);

    if global.verbose {
        eprintln!(
            "Chunking {} as book {}...",
            app.input.path.display(),
            config.book_id
        );
    }

    let extraction = parachunk_core::extract(input.source(), &config).map_err(Error::from)?;
    let json = serde_json::to_string_pretty(&extraction.records)?;

    match &app.output {
        Some(path) => write_output(path, &json)?,
        None => println!("{}", json),
    }

    eprintln!("{}", summary(&extraction.report));
    if global.verbose {
        eprintln!(
            "{} blocks read, {} without text, {} characters discarded",
            extraction.report.blocks, extraction.report.gaps, extraction.report.discarded_chars
        );
    }

    Ok(())
}

/// Write `json` to `path`, followed by a newline.
pub fn write_output(path: &Path, json: &str) -> Result<()> {
    std::fs::write(path, format!("{}\n", json))
        .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
    log::info!("wrote {} bytes to {}", json.len() + 1, path.display());
    Ok(())
}

/// One-line description of a finished pass.
pub fn summary(report: &ExtractionReport) -> String {
    format!(
        "{} paragraphs from {} pages (body font {}pt, {} headings, {} short paragraphs dropped)",
        report.paragraphs,
        report.pages,
        report.body_font,
        report.headings.len(),
        report.discarded
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary() {
        let report = ExtractionReport {
            body_font: 10,
            pages: 12,
            paragraphs: 40,
            discarded: 3,
            ..ExtractionReport::default()
        };
        assert_eq!(
            summary(&report),
            "40 paragraphs from 12 pages (body font 10pt, 0 headings, 3 short paragraphs dropped)"
        );
    }

    #[test]
    fn test_write_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");

        write_output(&path, "[]").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]\n");
    }

    #[test]
    fn test_write_output_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("records.json");

        let err = write_output(&path, "[]").unwrap_err();

        assert!(err.to_string().starts_with("Failed to write"));
    }
}
