use parachunk_core::HeadingEvent;

use crate::input::{ExtractArgs, Input, InputArgs};
use crate::prelude::{println, *};

#[derive(Debug, clap::Parser)]
#[command(name = "outline")]
#[command(about = "List the chapter, topic, and subtopic headings of a document")]
pub struct App {
    #[clap(flatten)]
    input: InputArgs,

    #[clap(flatten)]
    extract: ExtractArgs,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(app: App, global: crate::Global) -> Result<()> {
    let input = Input::load(&app.input)?;
    let config = app.extract.config(&app.input.path);
    let extraction = parachunk_core::extract(input.source(), &config).map_err(Error::from)?;
    let headings = &extraction.report.headings;

    if app.json {
        println!("{}", serde_json::to_string_pretty(headings)?);
        return Ok(());
    }

    if headings.is_empty() {
        println!("No headings found.");
    } else {
        outline_table(headings).printstd();
    }

    if global.verbose {
        println!(
            "\nBody font {}pt, {} headings over {} pages",
            extraction.report.body_font,
            headings.len(),
            extraction.report.pages
        );
    }

    Ok(())
}

/// Headings as a table, numbered `chapter.topic.subtopic`.
pub fn outline_table(headings: &[HeadingEvent]) -> prettytable::Table {
    let mut table = new_table();
    table.add_row(prettytable::row!["Kind", "Page", "Number", "Title"]);
    for heading in headings {
        table.add_row(prettytable::row![
            heading.kind,
            heading.page,
            section_number(heading),
            heading.title
        ]);
    }
    table
}

/// `3`, `3.2`, or `3.2.1` depending on how deep the heading sits.
fn section_number(heading: &HeadingEvent) -> String {
    match (heading.topic_index, heading.subtopic_index) {
        (0, 0) => format!("{}", heading.chapter_index),
        (topic, 0) => format!("{}.{}", heading.chapter_index, topic),
        (topic, subtopic) => format!("{}.{}.{}", heading.chapter_index, topic, subtopic),
    }
}
