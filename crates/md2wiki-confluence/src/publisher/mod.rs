//! Page publisher for Confluence.
//!
//! [`PagePublisher`] reconciles one converted document with the page of the
//! same title in a space:
//!
//! 1. Look the page up (with the configured content properties expanded)
//! 2. Delete it, if asked to
//! 3. Create it when absent
//! 4. Otherwise (or right after creation, when needed) run the update pass:
//!    upload images and attachments, rewrite local links, write the page,
//!    write content properties
//!
//! # Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use md2wiki_confluence::{ConfluenceClient, PagePublisher, PublishConfig};
//!
//! let client = ConfluenceClient::new("https://acme.atlassian.net/wiki", "me@acme.com", "token");
//! let config = PublishConfig::new("DOC", client.base_url(), "docs");
//! let publisher = PagePublisher::new(&client, &config);
//!
//! let outcome = publisher.publish("Guide", "<p>Hello</p>")?;
//! if let Some(link) = outcome.link() {
//!     println!("{link}");
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod executor;
mod result;

pub use error::PublishError;
pub use executor::PagePublisher;
pub use result::{PublishOutcome, PublishedPage};

use std::path::PathBuf;

use md2wiki_convert::EditorVersion;

/// Configuration for publishing a page.
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// Space key.
    pub space_key: String,
    /// Confluence base URL, used for local links and attachment paths.
    pub base_url: String,
    /// Directory image and attachment references are relative to.
    pub source_dir: PathBuf,
    /// Title of the parent page.
    pub ancestor: Option<String>,
    /// Extra files to attach, relative to `source_dir`.
    pub attachments: Vec<String>,
    /// Labels replacing the page's labels.
    pub labels: Vec<String>,
    /// Content properties as `(key, value)`.
    pub properties: Vec<(String, String)>,
    /// Editor the page is created for.
    pub editor_version: EditorVersion,
    /// Markdown dialect for local link rewriting.
    pub markdown_source: Option<String>,
    /// Delete the page instead of publishing it.
    pub delete: bool,
}

impl PublishConfig {
    /// Configuration with nothing but the target.
    pub fn new(space_key: &str, base_url: &str, source_dir: impl Into<PathBuf>) -> Self {
        Self {
            space_key: space_key.to_owned(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            source_dir: source_dir.into(),
            ancestor: None,
            attachments: Vec::new(),
            labels: Vec::new(),
            properties: Vec::new(),
            editor_version: EditorVersion::default(),
            markdown_source: None,
            delete: false,
        }
    }

    fn property_keys(&self) -> Vec<String> {
        self.properties.iter().map(|(key, _)| key.clone()).collect()
    }
}
