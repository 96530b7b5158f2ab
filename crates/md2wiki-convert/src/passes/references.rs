//! Footnote reference resolution.
//!
//! Footnotes whose definition carries a link (`[^1]: [manual](https://…)`)
//! become direct links at the reference site and their definition block is
//! dropped. Footnotes without a link keep their text as a numbered paragraph.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::warn;

static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r##"<sup class="footnote-reference"><a href="#([^"]*)">([^<]*)</a></sup>"##)
        .expect("invalid footnote reference regex")
});

static DEFINITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)<div class="footnote-definition" id="([^"]*)">\s*<sup class="footnote-definition-label">([^<]*)</sup>(.*?)</div>\n?"#,
    )
    .expect("invalid footnote definition regex")
});

static HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="([^"]*)""#).expect("invalid href regex"));

/// How a resolved reference is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferenceStyle {
    /// `<a href="URL"><sup>1</sup></a>`
    #[default]
    Superscript,
    /// `<a href="URL">[1]</a>`
    Inline,
}

impl ReferenceStyle {
    /// Parse a configured style name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "superscript" | "sup" => Some(Self::Superscript),
            "inline" => Some(Self::Inline),
            _ => None,
        }
    }

    fn link(self, url: &str, label: &str) -> String {
        match self {
            Self::Superscript => format!(r#"<a href="{url}"><sup>{label}</sup></a>"#),
            Self::Inline => format!(r#"<a href="{url}">[{label}]</a>"#),
        }
    }
}

struct Definition {
    url: Option<String>,
    body: String,
}

/// Resolve footnote markers into final link markup.
///
/// An unknown `style` leaves the body unchanged.
pub fn resolve_references(html: &str, style: &str, warnings: &mut Vec<String>) -> String {
    let Some(style) = ReferenceStyle::from_name(style) else {
        let msg = format!("unknown reference style '{style}', references left unresolved");
        warn!("{msg}");
        warnings.push(msg);
        return html.to_owned();
    };

    if !html.contains("footnote-") {
        return html.to_owned();
    }

    let mut definitions = HashMap::new();
    let html = DEFINITION
        .replace_all(html, |caps: &Captures| {
            let body = caps[3].trim().to_owned();
            let url = HREF.captures(&body).map(|m| m[1].to_owned());
            let replacement = if url.is_some() {
                String::new()
            } else {
                numbered_paragraph(&caps[2], &body)
            };
            definitions.insert(caps[1].to_owned(), Definition { url, body });
            replacement
        })
        .into_owned();

    REFERENCE
        .replace_all(&html, |caps: &Captures| {
            let (name, label) = (&caps[1], &caps[2]);
            match definitions.get(name) {
                Some(Definition { url: Some(url), .. }) => style.link(url, label),
                Some(Definition { url: None, body }) if !body.is_empty() => format!("<sup>{label}</sup>"),
                _ => {
                    let msg = format!("footnote [^{name}] has no definition");
                    warn!("{msg}");
                    warnings.push(msg);
                    caps[0].to_owned()
                }
            }
        })
        .into_owned()
}

/// Render a link-less definition as `<p><sup>n</sup> text</p>`.
fn numbered_paragraph(label: &str, body: &str) -> String {
    match body.strip_prefix("<p>") {
        Some(rest) => format!("<p><sup>{label}</sup> {rest}\n"),
        None => format!("<p><sup>{label}</sup> {body}</p>\n"),
    }
}
