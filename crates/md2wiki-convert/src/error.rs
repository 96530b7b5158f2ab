//! Error types for conversion.

/// Error raised by a conversion step that can't degrade to a warning.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConvertError {
    /// An in-page link points at an anchor no heading produces.
    #[error("local reference {href} does not match any heading")]
    UnresolvedReference {
        /// The link target as written (e.g. `#markdown-header-setup`).
        href: String,
    },

    /// The body couldn't be tokenized.
    #[error("markup scan failed")]
    Markup(#[from] quick_xml::Error),
}
