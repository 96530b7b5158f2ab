//! HTML comments to Confluence placeholders.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--(.*?)-->").expect("invalid comment regex"));

/// Turn `<!-- … -->` into `<ac:placeholder>…</ac:placeholder>`.
///
/// Placeholders are visible in the editor only, so hidden notes stay hidden
/// on the rendered page. The comment text is copied verbatim.
pub fn convert_comment_blocks(html: &str, warnings: &mut Vec<String>) -> String {
    if !html.contains("<!--") {
        return html.to_owned();
    }

    let out = COMMENT
        .replace_all(html, "<ac:placeholder>${1}</ac:placeholder>")
        .into_owned();

    if out.contains("<!--") {
        let msg = "unterminated <!-- comment left as is".to_owned();
        warn!("{msg}");
        warnings.push(msg);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_comment_becomes_placeholder() {
        let mut warnings = Vec::new();
        let out = convert_comment_blocks("<p>a</p>\n<!-- hidden *note* -->\n", &mut warnings);
        assert_eq!(out, "<p>a</p>\n<ac:placeholder> hidden *note* </ac:placeholder>\n");
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_multiline_comment() {
        let mut warnings = Vec::new();
        let out = convert_comment_blocks("<!--\nline 1\nline 2\n-->", &mut warnings);
        assert_eq!(out, "<ac:placeholder>\nline 1\nline 2\n</ac:placeholder>");
    }

    #[test]
    fn test_unterminated_comment_warns() {
        let mut warnings = Vec::new();
        let out = convert_comment_blocks("<!-- a --> <!-- open", &mut warnings);
        assert_eq!(out, "<ac:placeholder> a </ac:placeholder> <!-- open");
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_escaped_comment_in_code_untouched() {
        let mut warnings = Vec::new();
        let html = "<pre><code>&lt;!-- not a comment --&gt;</code></pre>";
        assert_eq!(convert_comment_blocks(html, &mut warnings), html);
    }
}
