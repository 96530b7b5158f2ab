//! Error types for page publishing.

use md2wiki_convert::ConvertError;

use crate::error::ConfluenceError;

/// Error while publishing a page.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The configured parent page doesn't exist.
    #[error("ancestor page '{0}' not found")]
    AncestorNotFound(String),

    /// Confluence API error.
    #[error("Confluence API error: {0}")]
    Confluence(#[from] ConfluenceError),

    /// Body post-processing failed (e.g. unresolved local link).
    #[error(transparent)]
    Convert(#[from] ConvertError),
}
