//! md2wiki CLI - publish a markdown file as a Confluence page.
//!
//! Converts the file to Confluence storage format and creates, updates or
//! deletes the page with the document's title in the given space.

mod browser;
mod commands;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use commands::PublishArgs;
use output::Output;

/// Log level when neither `--loglevel` nor `RUST_LOG` is set.
const DEFAULT_LOG_LEVEL: &str = "info";

/// md2wiki - Markdown to Confluence.
#[derive(Parser)]
#[command(name = "md2wiki", about)]
struct Cli {
    #[command(flatten)]
    publish: PublishArgs,
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --loglevel wins, then RUST_LOG, then the default
    let filter = match cli.publish.log_level() {
        Some(level) => EnvFilter::try_new(level.to_lowercase()),
        None => Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))),
    };
    let filter = match filter {
        Ok(filter) => filter,
        Err(err) => {
            output.error(&format!("Error: invalid log level: {err}"));
            std::process::exit(1);
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = cli.publish.execute() {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
