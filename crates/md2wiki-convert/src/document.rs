//! Source document splitting.

/// A markdown document split into page title and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Page title: the first line without leading `#` and whitespace.
    pub title: String,
    /// Markdown after the first line.
    pub body: String,
}

impl Document {
    /// Split markdown text into title and body.
    pub fn parse(text: &str) -> Self {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let (first, rest) = text.split_once('\n').unwrap_or((text, ""));
        Self {
            title: first.trim_start_matches('#').trim().to_owned(),
            body: rest.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_heading_title() {
        let doc = Document::parse("# Title\n\nHello ![alt](img.png)");
        assert_eq!(doc.title, "Title");
        assert_eq!(doc.body, "\nHello ![alt](img.png)");
    }

    #[test]
    fn test_parse_plain_first_line() {
        let doc = Document::parse("Release notes  \nbody");
        assert_eq!(doc.title, "Release notes");
        assert_eq!(doc.body, "body");
    }

    #[test]
    fn test_parse_single_line() {
        let doc = Document::parse("## Only a title");
        assert_eq!(doc.title, "Only a title");
        assert!(doc.body.is_empty());
    }

    #[test]
    fn test_parse_strips_bom_and_crlf() {
        let doc = Document::parse("\u{feff}# Title\r\ntext");
        assert_eq!(doc.title, "Title");
        assert_eq!(doc.body, "text");
    }
}
