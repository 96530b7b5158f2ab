//! Upload local files as page attachments.

use std::path::Path;

use percent_encoding::percent_decode_str;
use tracing::{debug, info, warn};

use crate::api::{AttachmentFile, ConfluenceApi};
use crate::client::encode;
use crate::error::ConfluenceError;
use crate::types::Attachment;

/// What happened to one attachment reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// A new attachment was created.
    Created(Attachment),
    /// An existing attachment with the same filename got a new version.
    Updated(Attachment),
    /// Nothing was uploaded.
    Skipped(SkipReason),
}

impl UploadOutcome {
    /// The stored attachment, unless skipped.
    pub fn attachment(&self) -> Option<&Attachment> {
        match self {
            Self::Created(attachment) | Self::Updated(attachment) => Some(attachment),
            Self::Skipped(_) => None,
        }
    }
}

/// Why an attachment reference was not uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// URL, protocol-relative or `data:` reference.
    Remote,
    /// No such local file.
    Missing,
}

/// Whether a reference points somewhere other than the local filesystem.
pub fn is_remote_reference(reference: &str) -> bool {
    if reference.starts_with("//") || reference.starts_with("data:") {
        return true;
    }
    reference.split_once("://").is_some_and(|(scheme, _)| {
        !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// Server path of an attachment's content, relative to the host.
///
/// `base_url` ending in `/wiki` (Confluence Cloud) prefixes the path with it.
pub fn download_path(base_url: &str, page_id: &str, filename: &str) -> String {
    let prefix = if base_url.trim_end_matches('/').ends_with("/wiki") {
        "/wiki"
    } else {
        ""
    };
    format!(
        "{prefix}/download/attachments/{page_id}/{}",
        encode(filename)
    )
}

/// Upload the file `reference` (relative to `source_dir`) to a page.
///
/// Remote references and missing files are skipped; a missing file is
/// logged as a warning. Existing attachments with the same filename get a
/// new version.
pub fn upload_attachment<A: ConfluenceApi + ?Sized>(
    api: &A,
    page_id: &str,
    source_dir: &Path,
    reference: &str,
    comment: Option<&str>,
) -> Result<UploadOutcome, ConfluenceError> {
    if is_remote_reference(reference) {
        debug!("Not uploading remote reference {}", reference);
        return Ok(UploadOutcome::Skipped(SkipReason::Remote));
    }

    let decoded = percent_decode_str(reference).decode_utf8_lossy();
    let path = source_dir.join(decoded.as_ref());
    let Some(filename) = path.file_name().and_then(|n| n.to_str()).map(str::to_owned) else {
        warn!("Attachment {} has no file name, skipping", reference);
        return Ok(UploadOutcome::Skipped(SkipReason::Missing));
    };
    if !path.is_file() {
        warn!("Attachment {} not found, skipping", path.display());
        return Ok(UploadOutcome::Skipped(SkipReason::Missing));
    }

    let file = AttachmentFile {
        content_type: mime_guess::from_path(&path)
            .first_or_octet_stream()
            .essence_str()
            .to_owned(),
        data: std::fs::read(&path)?,
        comment: comment.filter(|c| !c.is_empty()).map(str::to_owned),
        filename,
    };

    match api.find_attachment(page_id, &file.filename)? {
        Some(existing) => {
            info!("\tUploading new version of attachment {}", file.filename);
            let attachment = api.update_attachment_data(page_id, &existing.id, &file)?;
            Ok(UploadOutcome::Updated(attachment))
        }
        None => {
            info!("\tUploading attachment {}", file.filename);
            let attachment = api.create_attachment(page_id, &file)?;
            Ok(UploadOutcome::Created(attachment))
        }
    }
}
