//! Markdown to Confluence storage format conversion.
//!
//! The pipeline renders markdown to HTML with pulldown-cmark, then runs a
//! fixed sequence of text passes over the result:
//!
//! 1. admonition macros (`~?…?~`, typed blockquotes, doctoc)
//! 2. HTML comments to placeholders
//! 3. code blocks to the `code` macro
//! 4. table of contents (opt-in)
//! 5. footnote references
//! 6. provenance banner (when tag and SCM prefix are set)
//!
//! Rewriting in-page links needs the page ID and therefore runs later, once
//! the page exists: see [`rewrite_local_refs`].
//!
//! # Example
//!
//! ```
//! use md2wiki_convert::{ConvertOptions, Converter, Document};
//!
//! let doc = Document::parse("# Title\n\n```sh\nls\n```\n");
//! let result = Converter::new(ConvertOptions::default()).convert(&doc);
//! assert_eq!(result.title, "Title");
//! assert!(result.body.contains(r#"<ac:parameter ac:name="language">bash</ac:parameter>"#));
//! ```

mod document;
mod error;
mod local_refs;
pub mod markup;
pub mod passes;
mod render;

pub use document::Document;
pub use error::ConvertError;
pub use local_refs::{
    Dialect, EditorVersion, PageLocation, anchor_map, has_local_links, rewrite_local_refs, slug,
};
pub use passes::{Provenance, ReferenceStyle};
pub use render::render_markdown;

use tracing::debug;

/// Reference style used when none is configured.
pub const DEFAULT_REFERENCE_STYLE: &str = "superscript";

/// Options for the conversion passes.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Insert a table of contents macro.
    pub contents: bool,
    /// Footnote reference style name (see [`ReferenceStyle`]).
    pub reference_style: String,
    /// Source of the document for the provenance banner.
    pub provenance: Option<Provenance>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            contents: false,
            reference_style: DEFAULT_REFERENCE_STYLE.to_owned(),
            provenance: None,
        }
    }
}

/// Result of converting a document.
#[derive(Debug, Clone)]
pub struct ConvertResult {
    /// Page title.
    pub title: String,
    /// Storage format body.
    pub body: String,
    /// Problems found in the markup, already logged.
    pub warnings: Vec<String>,
}

/// Runs the conversion pipeline.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    options: ConvertOptions,
}

impl Converter {
    /// Create a converter.
    #[must_use]
    pub fn new(options: ConvertOptions) -> Self {
        Self { options }
    }

    /// Convert a document, stamping the banner with the current local time.
    pub fn convert(&self, document: &Document) -> ConvertResult {
        let now = chrono::Local::now().format("%c").to_string();
        self.convert_at(document, &now)
    }

    /// Convert a document with an explicit banner timestamp.
    pub fn convert_at(&self, document: &Document, generated_at: &str) -> ConvertResult {
        let mut warnings = Vec::new();

        let html = render_markdown(&document.body);
        let html = passes::convert_info_macros(&html, &mut warnings);
        let html = passes::convert_comment_blocks(&html, &mut warnings);
        let html = passes::convert_code_blocks(&html);
        let html = if self.options.contents {
            passes::add_contents(&html, &mut warnings)
        } else {
            html
        };
        let html = passes::resolve_references(&html, &self.options.reference_style, &mut warnings);
        let html = passes::add_provenance(&html, self.options.provenance.as_ref(), generated_at);

        debug!("html: {html}");

        ConvertResult {
            title: document.title.clone(),
            body: html,
            warnings,
        }
    }
}
