use parachunk_core::{sample_font_sizes, FontHistogram};

use crate::input::{Input, InputArgs};
use crate::prelude::{println, *};

#[derive(Debug, clap::Parser)]
#[command(name = "fonts")]
#[command(about = "Show the font size histogram and the estimated body font")]
pub struct App {
    #[clap(flatten)]
    input: InputArgs,

    /// Number of spans after which sampling stops
    #[arg(
        long,
        env = "PARACHUNK_FONT_SAMPLE_LIMIT",
        default_value_t = parachunk_core::fonts::DEFAULT_SAMPLE_LIMIT
    )]
    font_sample_limit: usize,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, serde::Serialize)]
struct FontsOutput<'a> {
    body_font: i64,
    histogram: &'a FontHistogram,
    #[serde(skip_serializing_if = "Option::is_none")]
    font_names: Option<Vec<String>>,
}

pub fn run(app: App, global: crate::Global) -> Result<()> {
    let input = Input::load(&app.input)?;
    let histogram =
        sample_font_sizes(input.source(), app.font_sample_limit).map_err(Error::from)?;
    let body_font = histogram.body_font();

    if app.json {
        let output = FontsOutput {
            body_font,
            histogram: &histogram,
            font_names: input.font_names(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "Body font: {}pt ({} spans sampled from {} pages)\n",
        body_font, histogram.sampled, histogram.pages_read
    );
    histogram_table(&histogram).printstd();

    if global.verbose {
        if let Some(names) = input.font_names() {
            println!("\nFonts: {}", names.join(", "));
        }
    }

    Ok(())
}

/// Sizes from smallest to largest, with the body font marked.
pub fn histogram_table(histogram: &FontHistogram) -> prettytable::Table {
    let body_font = histogram.body_font();
    let mut sizes = histogram.sizes.clone();
    sizes.sort_by_key(|&(size, _)| size);

    let mut table = new_table();
    table.add_row(prettytable::row!["Size", "Spans", ""]);
    for (size, count) in sizes {
        let marker = if size == body_font { "body" } else { "" };
        table.add_row(prettytable::row![size, count, marker]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_table_marks_body_font() {
        let histogram = FontHistogram {
            sizes: vec![(14, 2), (10, 30), (8, 5)],
            sampled: 37,
            pages_read: 1,
        };

        let table = histogram_table(&histogram);

        assert_eq!(table.len(), 4);
        let rendered = table.to_string();
        let body_row = rendered
            .lines()
            .find(|line| line.contains("body"))
            .unwrap();
        assert!(body_row.contains("10"));
        assert!(body_row.contains("30"));
    }

    #[test]
    fn test_fonts_output_json() {
        let histogram = FontHistogram {
            sizes: vec![(12, 1)],
            sampled: 1,
            pages_read: 1,
        };
        let output = FontsOutput {
            body_font: 12,
            histogram: &histogram,
            font_names: None,
        };

        let value = serde_json::to_value(&output).unwrap();

        assert_eq!(value["body_font"], 12);
        assert_eq!(value["histogram"]["sizes"][0], serde_json::json!([12, 1]));
        assert!(value.get("font_names").is_none());
    }
}
