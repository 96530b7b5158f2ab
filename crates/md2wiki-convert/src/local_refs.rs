//! In-page anchor links to absolute Confluence URLs.
//!
//! Markdown processors generate heading anchors with their own conventions
//! (Bitbucket renders `## Setup` as `#markdown-header-setup`, the second
//! `## Setup` as `#markdown-header-setup_1`). Confluence derives anchors from
//! the heading text differently depending on the editor version, so every
//! `href="#…"` is mapped from the source convention to the Confluence one.

use std::collections::HashMap;
use std::fmt;

use tracing::{info, warn};

use crate::error::ConvertError;
use crate::markup::{self, Element, escape_attr, is_heading};

/// Markdown processor the document was written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Bitbucket Server/Cloud markdown.
    Bitbucket,
}

impl Dialect {
    /// Parse a dialect name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "bitbucket" => Some(Self::Bitbucket),
            _ => None,
        }
    }

    /// Literal every generated anchor starts with (including `#`).
    pub fn anchor_prefix(self) -> &'static str {
        match self {
            Self::Bitbucket => "#markdown-header-",
        }
    }

    /// Suffix appended to the `n`th duplicate of an anchor.
    pub fn duplicate_suffix(self, n: usize) -> String {
        match self {
            Self::Bitbucket => format!("_{n}"),
        }
    }
}

/// Confluence editor generation, which decides the anchor format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorVersion {
    /// Legacy editor: `#PageTitle-HeadingText`.
    #[default]
    V1,
    /// Fabric editor: `#Heading-Text`.
    V2,
}

impl EditorVersion {
    /// Numeric version as sent in the `editor` content property.
    pub fn number(self) -> u8 {
        match self {
            Self::V1 => 1,
            Self::V2 => 2,
        }
    }
}

impl TryFrom<u8> for EditorVersion {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::V1),
            2 => Ok(Self::V2),
            other => Err(other),
        }
    }
}

impl fmt::Display for EditorVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.number())
    }
}

/// Where the page lives, for building absolute links.
#[derive(Debug, Clone, Copy)]
pub struct PageLocation<'a> {
    /// Confluence base URL.
    pub base_url: &'a str,
    /// Space key.
    pub space_key: &'a str,
    /// Page ID.
    pub page_id: &'a str,
    /// Page title.
    pub title: &'a str,
}

impl PageLocation<'_> {
    fn page_url(&self) -> String {
        format!(
            "{}/spaces/{}/pages/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.space_key,
            self.page_id,
            self.title.split_whitespace().collect::<Vec<_>>().join("+")
        )
    }
}

/// Join whitespace-separated words with `-`, optionally lowercased.
pub fn slug(text: &str, lowercase: bool) -> String {
    let joined = text.split_whitespace().collect::<Vec<_>>().join("-");
    if lowercase {
        joined.to_lowercase()
    } else {
        joined
    }
}

/// Map source anchors (`#markdown-header-…`) to Confluence fragment values.
///
/// Duplicate headings get the dialect's numbered suffix on the key and
/// `.n` on the value, counting per key from 1.
pub fn anchor_map(
    headings: &[String],
    dialect: Dialect,
    version: EditorVersion,
) -> HashMap<String, String> {
    let mut map = HashMap::with_capacity(headings.len());
    let mut seen: HashMap<String, usize> = HashMap::new();

    for heading in headings {
        let key = format!("{}{}", dialect.anchor_prefix(), slug(heading, true));
        let value = match version {
            EditorVersion::V1 => heading.split_whitespace().collect::<String>(),
            EditorVersion::V2 => slug(heading, false),
        };

        match seen.get_mut(&key) {
            Some(count) => {
                map.insert(
                    format!("{key}{}", dialect.duplicate_suffix(*count)),
                    format!("{value}.{count}"),
                );
                *count += 1;
            }
            None => {
                map.insert(key.clone(), value);
                seen.insert(key, 1);
            }
        }
    }

    map
}

/// Whether the body has any `<a href="#…">` link.
pub fn has_local_links(html: &str) -> bool {
    match markup::find_elements(html, |name| name == "a") {
        Ok(links) => links.iter().any(is_local_link),
        Err(_) => html.contains(r##"href="#"##),
    }
}

/// Rewrite in-page links to absolute page URLs.
///
/// Without a (known) dialect the body is returned unchanged.
///
/// # Errors
///
/// Returns [`ConvertError::UnresolvedReference`] for a link that matches no
/// heading, and [`ConvertError::Markup`] if the body can't be scanned.
pub fn rewrite_local_refs(
    html: &str,
    dialect: Option<&str>,
    version: EditorVersion,
    location: &PageLocation<'_>,
) -> Result<String, ConvertError> {
    let Some(name) = dialect.filter(|d| !d.is_empty()) else {
        warn!("Local references weren't processed because no markdown source was set");
        return Ok(html.to_owned());
    };
    let Some(dialect) = Dialect::from_name(name) else {
        warn!("Local references weren't processed because markdown source '{name}' isn't supported");
        return Ok(html.to_owned());
    };

    let elements = markup::find_elements(html, |n| n == "a" || is_heading(n))?;
    let links: Vec<&Element> = elements.iter().filter(|e| is_local_link(e)).collect();
    if links.is_empty() {
        return Ok(html.to_owned());
    }

    info!("Converting Confluence local links...");

    let headings: Vec<String> = elements
        .iter()
        .filter(|e| is_heading(&e.name))
        .map(|e| e.text.trim().to_owned())
        .collect();
    let anchors = anchor_map(&headings, dialect, version);
    let page_url = location.page_url();

    let mut edits = Vec::with_capacity(links.len());
    for link in links {
        let href = link.attr("href").unwrap_or_default();
        let value = anchors
            .get(href)
            .ok_or_else(|| ConvertError::UnresolvedReference {
                href: href.to_owned(),
            })?;

        let fragment = match version {
            EditorVersion::V1 => format!(
                "{}-{value}",
                location.title.split_whitespace().collect::<String>()
            ),
            EditorVersion::V2 => value.clone(),
        };
        let replacement = format!(
            r#"<a href="{}" title="{}">{}</a>"#,
            escape_attr(&format!("{page_url}#{fragment}")),
            escape_attr(link.text.trim()),
            link.inner(html)
        );
        edits.push((link.start..link.end, replacement));
    }

    Ok(markup::splice(html, edits))
}

fn is_local_link(element: &Element) -> bool {
    element.name == "a"
        && element.end > element.close_start
        && element.attr("href").is_some_and(|href| href.len() > 1 && href.starts_with('#'))
}
