use crate::prelude::*;
use clap::Parser;

mod chunk;
mod error;
mod fonts;
mod input;
mod outline;
mod prelude;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Split PDF books into paragraph records labeled with their chapter, topic, and subtopic"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Whether to display additional information.
    #[clap(long, env = "PARACHUNK_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Split a document into paragraph records
    Chunk(crate::chunk::App),

    /// List detected headings
    Outline(crate::outline::App),

    /// Show the font size histogram and body font estimate
    Fonts(crate::fonts::App),
}

fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Chunk(sub_app) => crate::chunk::run(sub_app, app.global),
        SubCommands::Outline(sub_app) => crate::outline::run(sub_app, app.global),
        SubCommands::Fonts(sub_app) => crate::fonts::run(sub_app, app.global),
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        App::command().debug_assert();
    }

    #[test]
    fn test_parse_chunk_flags() {
        let app = App::try_parse_from([
            "parachunk",
            "chunk",
            "book.pdf",
            "--book-id",
            "MED",
            "--min-paragraph-chars",
            "80",
            "--input-format",
            "json",
            "--verbose",
        ])
        .unwrap();

        assert!(app.global.verbose);
        assert!(matches!(app.command, SubCommands::Chunk(_)));
    }

    #[test]
    fn test_parse_rejects_unknown_format() {
        assert!(App::try_parse_from([
            "parachunk",
            "fonts",
            "book.pdf",
            "--input-format",
            "epub",
        ])
        .is_err());
    }
}
