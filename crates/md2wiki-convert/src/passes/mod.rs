//! Text transform passes over rendered HTML.
//!
//! Each pass takes the output of the previous one and returns a new string.
//! Passes only touch the marker spans they recognise; anything malformed is
//! left as it is and reported through the `warnings` list.

mod admonitions;
mod code;
mod comments;
mod contents;
mod provenance;
mod references;

pub use admonitions::{MacroKind, convert_info_macros};
pub use code::{confluence_language, convert_code_blocks};
pub use comments::convert_comment_blocks;
pub use contents::add_contents;
pub use provenance::{Provenance, add_provenance};
pub use references::{ReferenceStyle, resolve_references};

/// Wrap rich-text content in a named structured macro.
pub(crate) fn rich_text_macro(name: &str, body: &str) -> String {
    format!(
        r#"<ac:structured-macro ac:name="{name}"><ac:rich-text-body>{body}</ac:rich-text-body></ac:structured-macro>"#
    )
}
