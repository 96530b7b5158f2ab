//! `md2wiki` publish command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use md2wiki_config::{CliSettings, Config};
use md2wiki_confluence::{ConfluenceClient, PagePublisher, PublishConfig, PublishOutcome};
use md2wiki_convert::{
    ConvertOptions, ConvertResult, Converter, DEFAULT_REFERENCE_STYLE, Document, EditorVersion,
    Provenance,
};
use tracing::info;

use crate::browser;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for publishing a markdown file.
#[derive(Args, Debug)]
pub(crate) struct PublishArgs {
    /// Markdown file to publish; its first line is the page title.
    markdown_file: PathBuf,

    /// Confluence space key.
    space_key: String,

    /// Confluence username.
    #[arg(short, long, env = "CONFLUENCE_USERNAME")]
    username: Option<String>,

    /// Confluence API key.
    #[arg(short = 'p', long = "apikey", env = "CONFLUENCE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Confluence organisation name, or a host name (anything with a dot).
    #[arg(short = 'o', long = "orgname", env = "CONFLUENCE_ORGNAME")]
    org_name: Option<String>,

    /// Title of the parent page.
    #[arg(short, long)]
    ancestor: Option<String>,

    /// Files to attach, relative to the markdown file.
    #[arg(short = 't', long = "attachment", num_args = 1..)]
    attachments: Vec<String>,

    /// Insert a table of contents.
    #[arg(short, long)]
    contents: bool,

    /// Don't open the page in a browser.
    #[arg(short = 'g', long)]
    nogo: bool,

    /// Use http:// instead of https://.
    #[arg(short, long)]
    nossl: bool,

    /// Delete the page instead of publishing it.
    #[arg(short, long)]
    delete: bool,

    /// Convert only and print the result.
    #[arg(short, long)]
    simulate: bool,

    /// Log level (e.g. debug, info, warn); RUST_LOG is used when unset.
    #[arg(short, long = "loglevel")]
    loglevel: Option<String>,

    /// Confluence editor version (1 or 2).
    #[arg(short = 'v', long = "version", value_parser = clap::value_parser!(u8).range(1..=2))]
    editor_version: Option<u8>,

    /// Markdown dialect, for rewriting in-page links (bitbucket).
    #[arg(long = "markdownsrc")]
    markdown_source: Option<String>,

    /// Page label; repeat for several.
    #[arg(long = "label")]
    labels: Vec<String>,

    /// Content property as KEY=VALUE; repeat for several.
    #[arg(long = "property", value_parser = parse_property)]
    properties: Vec<(String, String)>,

    /// Source control tag or commit of the markdown file.
    #[arg(short = 'T', long)]
    tag: Option<String>,

    /// Source control URL prefix, followed by tag and file path.
    #[arg(short = 'S', long = "scmprefix")]
    scm_prefix: Option<String>,

    /// Footnote reference style (superscript or inline).
    #[arg(long)]
    reference_style: Option<String>,

    /// Path to configuration file (default: auto-discover md2wiki.toml).
    #[arg(long)]
    config: Option<PathBuf>,
}

impl PublishArgs {
    /// Log level requested on the command line.
    pub(crate) fn log_level(&self) -> Option<&str> {
        self.loglevel.as_deref()
    }

    /// Execute the publish command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is incomplete, the markdown file
    /// can't be read, or publishing fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        if !self.markdown_file.is_file() {
            return Err(CliError::Validation(format!(
                "Markdown file not found: {}",
                self.markdown_file.display()
            )));
        }

        let config = Config::load(self.config.as_deref(), &self.cli_settings())?;

        info!("Markdown file: {}", self.markdown_file.display());
        info!("Space Key: {}", self.space_key);

        let converted = self.convert(&config)?;
        if !converted.warnings.is_empty() {
            output.warning(&format!(
                "{} conversion warning(s), markup left as is",
                converted.warnings.len()
            ));
        }

        if self.simulate {
            console::Term::stdout().write_line(&converted.body)?;
            return Ok(());
        }

        let settings = config.require_confluence()?;
        let base_url = settings.base_url();
        let client = ConfluenceClient::new(&base_url, &settings.username, &settings.api_key);

        let publish_config = self.publish_config(&config, &base_url)?;
        let outcome =
            PagePublisher::new(&client, &publish_config).publish(&converted.title, &converted.body)?;

        print_outcome(&output, &converted.title, &outcome);

        if let Some(link) = outcome.link()
            && !self.nogo
        {
            browser::open(link);
        }

        Ok(())
    }

    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            username: self.username.clone(),
            api_key: self.api_key.clone(),
            org_name: self.org_name.clone(),
            no_ssl: self.nossl.then_some(true),
            editor_version: self.editor_version,
            markdown_source: self.markdown_source.clone(),
            reference_style: self.reference_style.clone(),
            contents: self.contents.then_some(true),
            labels: self.labels.clone(),
        }
    }

    fn convert(&self, config: &Config) -> Result<ConvertResult, CliError> {
        let markdown = std::fs::read_to_string(&self.markdown_file)?;
        let document = Document::parse(&markdown);
        if document.title.is_empty() {
            return Err(CliError::Validation(format!(
                "No title found on the first line of {}",
                self.markdown_file.display()
            )));
        }

        let options = ConvertOptions {
            contents: config.publish.contents,
            reference_style: config
                .publish
                .reference_style
                .clone()
                .unwrap_or_else(|| DEFAULT_REFERENCE_STYLE.to_owned()),
            provenance: Provenance::from_parts(
                self.tag.as_deref(),
                self.scm_prefix.as_deref(),
                &self.markdown_file,
            ),
        };

        Ok(Converter::new(options).convert(&document))
    }

    fn publish_config(&self, config: &Config, base_url: &str) -> Result<PublishConfig, CliError> {
        let editor_version = EditorVersion::try_from(config.publish.editor_version).map_err(|v| {
            CliError::Validation(format!("editor version must be 1 or 2, got {v}"))
        })?;

        let mut publish = PublishConfig::new(&self.space_key, base_url, source_dir(&self.markdown_file));
        publish.ancestor.clone_from(&self.ancestor);
        publish.attachments.clone_from(&self.attachments);
        publish.labels.clone_from(&config.publish.labels);
        publish.properties.clone_from(&self.properties);
        publish.editor_version = editor_version;
        publish.markdown_source.clone_from(&config.publish.markdown_source);
        publish.delete = self.delete;
        Ok(publish)
    }
}

/// Directory the markdown file lives in.
fn source_dir(markdown_file: &Path) -> PathBuf {
    match markdown_file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Parse a `KEY=VALUE` content property.
fn parse_property(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_owned(), value.to_owned()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

fn print_outcome(output: &Output, title: &str, outcome: &PublishOutcome) {
    match outcome {
        PublishOutcome::Created(page) | PublishOutcome::Updated(page) => {
            let verb = if matches!(outcome, PublishOutcome::Created(_)) {
                "created"
            } else {
                "updated"
            };
            output.success(&format!("\nPage {verb} successfully!"));
            output.info(&format!("ID: {}", page.id));
            output.info(&format!("Title: {title}"));
            output.info(&format!("Version: {}", page.version));
            output.highlight(&format!("URL: {}", page.link));
            if page.attachments_uploaded > 0 {
                output.info(&format!("Attachments uploaded: {}", page.attachments_uploaded));
            }
        }
        PublishOutcome::Deleted { page_id } => {
            output.success(&format!("\nPage {page_id} deleted."));
        }
        PublishOutcome::NothingToDelete => {
            output.warning(&format!("\nPage '{title}' does not exist, nothing to delete."));
        }
    }
}
