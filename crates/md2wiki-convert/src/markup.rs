//! Event-based scanning of rendered markup.
//!
//! The body handed to Confluence is XHTML-like: pulldown-cmark emits
//! self-closed void elements and escaped text, and the macros added by the
//! passes are namespaced XML. That is enough for a lenient `quick-xml` pass
//! that reports where elements start and end, so callers can splice
//! replacements without pattern-matching tags.

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

/// An element located in a markup string.
///
/// All offsets are byte offsets into the scanned string. For self-closing
/// elements and HTML void elements `open_end == close_start == end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Tag name (e.g. `h2`, `img`, `ac:structured-macro`).
    pub name: String,
    /// Attributes in source order, values unescaped.
    pub attrs: Vec<(String, String)>,
    /// Offset of the opening `<`.
    pub start: usize,
    /// Offset just past the opening tag.
    pub open_end: usize,
    /// Offset of the closing tag.
    pub close_start: usize,
    /// Offset just past the closing tag.
    pub end: usize,
    /// Concatenated text content, entities decoded.
    pub text: String,
}

impl Element {
    /// Get an attribute value.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Slice of `source` between the opening and closing tags.
    pub fn inner<'a>(&self, source: &'a str) -> &'a str {
        &source[self.open_end..self.close_start]
    }

    /// Whether the element's extent is known: self-contained or explicitly
    /// closed. Unclosed elements run to the end of the input and must not
    /// be replaced as a whole.
    pub fn is_complete(&self) -> bool {
        self.open_end == self.end || self.end > self.close_start
    }

    /// Whether `other` lies inside this element.
    pub fn contains(&self, other: &Self) -> bool {
        other.start >= self.open_end && other.end <= self.close_start
    }

    /// Render the opening tag with one attribute replaced.
    ///
    /// Self-closing elements are rendered self-closed.
    pub fn open_tag_with(&self, attr: &str, value: &str) -> String {
        let mut tag = format!("<{}", self.name);
        for (key, current) in &self.attrs {
            let value = if key == attr { value } else { current };
            tag.push_str(&format!(r#" {key}="{}""#, escape_attr(value)));
        }
        if self.open_end == self.end {
            tag.push_str(" />");
        } else {
            tag.push('>');
        }
        tag
    }
}

/// Find all elements whose tag name satisfies `wanted`, in document order.
///
/// Nested matches are all reported. HTML void elements (`<img>`, `<br>`, ...)
/// are self-contained even without `/>`. Mismatched end tags are tolerated;
/// any other element that is never closed ends where the input ends.
///
/// # Errors
///
/// Returns the underlying `quick-xml` error for input that can't be tokenized.
pub fn find_elements(
    html: &str,
    wanted: impl Fn(&str) -> bool,
) -> Result<Vec<Element>, quick_xml::Error> {
    let mut reader = Reader::from_str(html);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;

    let mut found: Vec<Element> = Vec::new();
    // Indexes into `found` of elements still open
    let mut open: Vec<usize> = Vec::new();

    loop {
        let before = position(&reader);
        let event = reader.read_event()?;
        let after = position(&reader);

        match event {
            Event::Start(e) => {
                let name = tag_name(&e);
                if is_void(&name) {
                    if wanted(&name) {
                        found.push(Element {
                            name,
                            attrs: attributes(&e),
                            start: before,
                            open_end: after,
                            close_start: after,
                            end: after,
                            text: String::new(),
                        });
                    }
                } else if wanted(&name) {
                    open.push(found.len());
                    found.push(Element {
                        name,
                        attrs: attributes(&e),
                        start: before,
                        open_end: after,
                        close_start: html.len(),
                        end: html.len(),
                        text: String::new(),
                    });
                }
            }
            Event::Empty(e) => {
                let name = tag_name(&e);
                if wanted(&name) {
                    found.push(Element {
                        name,
                        attrs: attributes(&e),
                        start: before,
                        open_end: after,
                        close_start: after,
                        end: after,
                        text: String::new(),
                    });
                }
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if let Some(pos) = open.iter().rposition(|&idx| found[idx].name == name) {
                    let idx = open.remove(pos);
                    found[idx].close_start = before;
                    found[idx].end = after;
                }
            }
            Event::Text(e) => {
                let text = String::from_utf8_lossy(&e);
                push_text(&mut found, &open, &text);
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e);
                push_text(&mut found, &open, &text);
            }
            Event::GeneralRef(e) => {
                let entity = String::from_utf8_lossy(&e);
                push_text(&mut found, &open, &decode_entity(&entity));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(found)
}

/// Keep only elements not nested in another element of the list.
pub fn outermost(elements: Vec<Element>) -> Vec<Element> {
    let mut result: Vec<Element> = Vec::with_capacity(elements.len());
    for element in elements {
        if !result.iter().any(|outer| outer.contains(&element)) {
            result.push(element);
        }
    }
    result
}

/// Apply `(range, replacement)` splices to `source`.
///
/// Ranges must not overlap; they may come in any order.
pub fn splice(source: &str, mut edits: Vec<(std::ops::Range<usize>, String)>) -> String {
    edits.sort_by_key(|(range, _)| range.start);
    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    for (range, replacement) in edits {
        out.push_str(&source[cursor..range.start]);
        out.push_str(&replacement);
        cursor = range.end;
    }
    out.push_str(&source[cursor..]);
    out
}

/// Whether a tag name is a heading (`h1`..`h6`).
pub fn is_heading(name: &str) -> bool {
    matches!(name, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

/// Whether a tag name is an HTML void element, which never has content or
/// an end tag.
fn is_void(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Escape a string for use inside a double-quoted attribute.
pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Decode the entity references pulldown-cmark emits in text.
///
/// Unknown named entities are kept verbatim.
pub fn unescape_html(text: &str) -> String {
    if !text.contains('&') {
        return text.to_owned();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        match tail.find(';') {
            Some(semi) if semi <= 10 => {
                out.push_str(&decode_entity(&tail[..semi]));
                rest = &tail[semi + 1..];
            }
            _ => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

fn push_text(found: &mut [Element], open: &[usize], text: &str) {
    for &idx in open {
        found[idx].text.push_str(text);
    }
}

fn position(reader: &Reader<&[u8]>) -> usize {
    usize::try_from(reader.buffer_position()).unwrap_or(usize::MAX)
}

fn tag_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn attributes(e: &BytesStart) -> Vec<(String, String)> {
    e.attributes()
        .with_checks(false)
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_or_else(
                |_| String::from_utf8_lossy(&attr.value).into_owned(),
                std::borrow::Cow::into_owned,
            );
            (key, value)
        })
        .collect()
}

fn decode_entity(entity: &str) -> String {
    static NAMED: std::sync::LazyLock<HashMap<&'static str, &'static str>> =
        std::sync::LazyLock::new(|| {
            HashMap::from([
                ("amp", "&"),
                ("lt", "<"),
                ("gt", ">"),
                ("quot", "\""),
                ("apos", "'"),
                ("nbsp", "\u{00a0}"),
            ])
        });

    if let Some(value) = NAMED.get(entity) {
        return (*value).to_owned();
    }

    let code = if let Some(hex) = entity
        .strip_prefix("#x")
        .or_else(|| entity.strip_prefix("#X"))
    {
        u32::from_str_radix(hex, 16).ok()
    } else {
        entity.strip_prefix('#').and_then(|dec| dec.parse().ok())
    };

    code.and_then(char::from_u32)
        .map_or_else(|| format!("&{entity};"), |c| c.to_string())
}
