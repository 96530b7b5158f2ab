//! "Auto-generated from" banner.

use std::path::Path;

use crate::markup::escape_attr;

/// Where the published document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    /// Git tag or commit SHA.
    pub tag: String,
    /// SCM URL prefix (e.g. `https://github.com/org/repo/blob`).
    pub scm_prefix: String,
    /// Markdown path as given on the command line.
    pub source_path: String,
}

impl Provenance {
    /// Build provenance only when both tag and prefix are present.
    pub fn from_parts(tag: Option<&str>, scm_prefix: Option<&str>, source_path: &Path) -> Option<Self> {
        match (tag, scm_prefix) {
            (Some(tag), Some(prefix)) if !tag.is_empty() && !prefix.is_empty() => Some(Self {
                tag: tag.to_owned(),
                scm_prefix: prefix.trim_end_matches('/').to_owned(),
                source_path: source_path.to_string_lossy().replace('\\', "/"),
            }),
            _ => None,
        }
    }

    fn blob_url(&self) -> String {
        let path = self.source_path.trim_start_matches("./");
        format!("{}/{}/{}", self.scm_prefix, self.tag, path)
    }

    fn file_name(&self) -> &str {
        self.source_path.rsplit('/').next().unwrap_or(&self.source_path)
    }
}

/// Prepend the provenance banner. No-op without provenance.
pub fn add_provenance(html: &str, provenance: Option<&Provenance>, generated_at: &str) -> String {
    let Some(p) = provenance else {
        return html.to_owned();
    };

    format!(
        r#"<p><i>This page was auto-generated from <a href="{}">{} version {}</a> on {}</i></p>{}"#,
        escape_attr(&p.blob_url()),
        escape_attr(p.file_name()),
        escape_attr(&p.tag),
        generated_at,
        html
    )
}
