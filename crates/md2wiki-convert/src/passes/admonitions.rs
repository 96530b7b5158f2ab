//! Admonition (info/note/warning/tip) macros.
//!
//! Two source syntaxes are recognised:
//!
//! - paragraph markers: `~?info?~`, `~!note!~`, `~%warning%~`, `~^tip^~`
//! - blockquotes, classified by a leading `Note:`, `Warning:` or `Tip:`
//!   (plain, bold or italic); anything else becomes an info panel
//!
//! doctoc-generated tables of contents are replaced by the `toc` macro here
//! too, before comment conversion would turn them into placeholders.

use std::sync::LazyLock;

use regex::{Captures, NoExpand, Regex};
use tracing::warn;

use super::contents::DOCTOC_MACRO;
use super::rich_text_macro;
use crate::markup;

/// Confluence admonition macro.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroKind {
    /// Blue info panel.
    Info,
    /// Yellow note panel.
    Note,
    /// Red warning panel.
    Warning,
    /// Green tip panel.
    Tip,
}

impl MacroKind {
    /// Macro name in storage format.
    pub fn macro_name(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Note => "note",
            Self::Warning => "warning",
            Self::Tip => "tip",
        }
    }

    fn from_prefix(word: &str) -> Self {
        match word.to_ascii_lowercase().as_str() {
            "note" => Self::Note,
            "warning" => Self::Warning,
            "tip" => Self::Tip,
            _ => Self::Info,
        }
    }
}

/// Paragraph marker character for each macro kind.
const PARAGRAPH_MARKERS: [(MacroKind, &str); 4] = [
    (MacroKind::Info, "?"),
    (MacroKind::Note, "!"),
    (MacroKind::Warning, "%"),
    (MacroKind::Tip, "^"),
];

static PARAGRAPH_PATTERNS: LazyLock<Vec<(MacroKind, &'static str, Regex)>> = LazyLock::new(|| {
    PARAGRAPH_MARKERS
        .iter()
        .map(|&(kind, marker)| {
            let m = regex::escape(marker);
            let pattern = format!(r"(?s)<p>~{m}(.*?){m}~</p>");
            (
                kind,
                marker,
                Regex::new(&pattern).expect("invalid paragraph marker regex"),
            )
        })
        .collect()
});

static TYPE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)^<p>\s*(?:<(?:strong|em|b|i)>\s*(note|warning|tip)\s*(?::\s*</(?:strong|em|b|i)>|</(?:strong|em|b|i)>\s*:?)|(note|warning|tip)\s*:)\s*",
    )
    .expect("invalid admonition prefix regex")
});

static DOCTOC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--\s*START doctoc.*?END doctoc.*?-->").expect("invalid doctoc regex")
});

/// Convert admonition markers and blockquotes into macros.
pub fn convert_info_macros(html: &str, warnings: &mut Vec<String>) -> String {
    let mut html = html.to_owned();

    for (kind, marker, pattern) in PARAGRAPH_PATTERNS.iter() {
        html = pattern
            .replace_all(&html, |caps: &Captures| {
                rich_text_macro(kind.macro_name(), &format!("<p>{}</p>", &caps[1]))
            })
            .into_owned();

        let opener = format!("<p>~{marker}");
        let unterminated = html.matches(&opener).count();
        if unterminated > 0 {
            let msg = format!(
                "{unterminated} unterminated ~{marker} {} marker(s) left as text",
                kind.macro_name()
            );
            warn!("{msg}");
            warnings.push(msg);
        }
    }

    let html = convert_blockquotes(&html, warnings);
    DOCTOC.replace_all(&html, NoExpand(DOCTOC_MACRO)).into_owned()
}

fn convert_blockquotes(html: &str, warnings: &mut Vec<String>) -> String {
    if !html.contains("<blockquote") {
        return html.to_owned();
    }

    let quotes = match markup::find_elements(html, |name| name == "blockquote") {
        Ok(found) => markup::outermost(found),
        Err(err) => {
            let msg = format!("blockquotes left unconverted: {err}");
            warn!("{msg}");
            warnings.push(msg);
            return html.to_owned();
        }
    };

    let mut edits = Vec::with_capacity(quotes.len());
    for quote in quotes {
        if quote.end == quote.close_start {
            let msg = format!("unclosed blockquote at offset {} left unconverted", quote.start);
            warn!("{msg}");
            warnings.push(msg);
            continue;
        }
        let (kind, body) = classify(quote.inner(html).trim());
        edits.push((quote.start..quote.end, rich_text_macro(kind.macro_name(), &body)));
    }

    markup::splice(html, edits)
}

/// Pick the macro for a blockquote body and strip its type prefix.
fn classify(inner: &str) -> (MacroKind, String) {
    let Some(caps) = TYPE_PREFIX.captures(inner) else {
        return (MacroKind::Info, inner.to_owned());
    };

    let word = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
    let rest = &inner[caps.get(0).map_or(0, |m| m.end())..];
    (MacroKind::from_prefix(word), format!("<p>{}", capitalize_first(rest)))
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() => first.to_uppercase().chain(chars).collect(),
        _ => text.to_owned(),
    }
}
