//! Markdown to HTML rendering.

use pulldown_cmark::{Options, Parser, html};

/// Render markdown to HTML.
///
/// Tables and footnotes are enabled. Strikethrough stays off because single
/// tildes delimit the admonition markers (`~?…?~`).
pub fn render_markdown(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_FOOTNOTES;
    let parser = Parser::new_ext(markdown, options);

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}
