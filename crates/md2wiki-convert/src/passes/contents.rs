//! Table of contents macros.

use tracing::{debug, warn};

use crate::markup::{self, is_heading};

/// `toc` macro replacing a doctoc-generated list.
pub(crate) const DOCTOC_MACRO: &str = concat!(
    r#"<ac:structured-macro ac:name="toc">"#,
    r#"<ac:parameter ac:name="printable">true</ac:parameter>"#,
    r#"<ac:parameter ac:name="style">disc</ac:parameter>"#,
    r#"<ac:parameter ac:name="maxLevel">7</ac:parameter>"#,
    r#"<ac:parameter ac:name="minLevel">1</ac:parameter>"#,
    r#"<ac:parameter ac:name="type">list</ac:parameter>"#,
    r#"<ac:parameter ac:name="outline">clear</ac:parameter>"#,
    r#"<ac:parameter ac:name="include">.*</ac:parameter>"#,
    "</ac:structured-macro>",
);

/// `toc` macro inserted by `--contents`.
const CONTENTS_MACRO: &str = concat!(
    r#"<ac:structured-macro ac:name="toc">"#,
    r#"<ac:parameter ac:name="printable">true</ac:parameter>"#,
    r#"<ac:parameter ac:name="style">disc</ac:parameter>"#,
    r#"<ac:parameter ac:name="maxLevel">5</ac:parameter>"#,
    r#"<ac:parameter ac:name="minLevel">1</ac:parameter>"#,
    r#"<ac:parameter ac:name="class">rm-contents</ac:parameter>"#,
    r#"<ac:parameter ac:name="exclude"></ac:parameter>"#,
    r#"<ac:parameter ac:name="type">list</ac:parameter>"#,
    r#"<ac:parameter ac:name="outline">false</ac:parameter>"#,
    r#"<ac:parameter ac:name="include"></ac:parameter>"#,
    "</ac:structured-macro>",
);

/// Insert a table of contents after the first heading.
///
/// Without a heading the macro goes first. A body that already has a `toc`
/// macro (from an earlier run of this pass or from doctoc) is returned as is.
/// Markup shown inside code blocks is text and never counts as a heading or
/// a macro.
pub fn add_contents(html: &str, warnings: &mut Vec<String>) -> String {
    let found = markup::find_elements(html, |name| {
        is_heading(name) || name == "ac:structured-macro"
    });
    let elements = match found {
        Ok(elements) => elements,
        Err(err) => {
            let msg = format!("table of contents not added: {err}");
            warn!("{msg}");
            warnings.push(msg);
            return html.to_owned();
        }
    };

    let has_toc = elements
        .iter()
        .any(|e| e.name == "ac:structured-macro" && e.attr("ac:name") == Some("toc"));
    if has_toc {
        debug!("Body already has a table of contents");
        return html.to_owned();
    }

    match elements
        .iter()
        .find(|e| is_heading(&e.name) && e.end > e.close_start)
    {
        Some(heading) => {
            let (head, tail) = html.split_at(heading.end);
            format!("{head}\n{CONTENTS_MACRO}{tail}")
        }
        None => format!("{CONTENTS_MACRO}\n{html}"),
    }
}
