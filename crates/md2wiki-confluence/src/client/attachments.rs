//! Attachment operations for Confluence API.

use rand::RngExt;
use tracing::info;

use super::{ConfluenceClient, checked, encode};
use crate::api::AttachmentFile;
use crate::error::ConfluenceError;
use crate::types::{Attachment, AttachmentsResponse};

impl ConfluenceClient {
    /// Find attachment by filename on a page.
    pub(crate) fn find_attachment_by_name(
        &self,
        page_id: &str,
        filename: &str,
    ) -> Result<Option<Attachment>, ConfluenceError> {
        let url = format!(
            "{}/content/{}/child/attachment?filename={}",
            self.api_url(),
            encode(page_id),
            encode(filename)
        );

        let response = self
            .agent
            .get(&url)
            .header("Authorization", self.auth.header_value())
            .header("Accept", "application/json")
            .call()?;

        let attachments: AttachmentsResponse = checked(response)?.read_json()?;
        Ok(attachments
            .results
            .into_iter()
            .find(|a| a.title == filename))
    }

    /// Attach a new file to a page.
    pub(crate) fn post_attachment(
        &self,
        page_id: &str,
        file: &AttachmentFile,
    ) -> Result<Attachment, ConfluenceError> {
        info!(
            "Uploading new attachment '{}' to page {}",
            file.filename, page_id
        );
        let url = format!(
            "{}/content/{}/child/attachment",
            self.api_url(),
            encode(page_id)
        );

        // Response is a list for new uploads
        let response: AttachmentsResponse = self.send_multipart(&url, file)?.read_json()?;
        response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| ConfluenceError::UnexpectedResponse("empty attachment response".to_owned()))
    }

    /// Upload a new version of an existing attachment.
    pub(crate) fn post_attachment_data(
        &self,
        page_id: &str,
        attachment_id: &str,
        file: &AttachmentFile,
    ) -> Result<Attachment, ConfluenceError> {
        info!(
            "Updating existing attachment '{}' (id={})",
            file.filename, attachment_id
        );
        let url = format!(
            "{}/content/{}/child/attachment/{}/data",
            self.api_url(),
            encode(page_id),
            encode(attachment_id)
        );

        // Single object for updates
        Ok(self.send_multipart(&url, file)?.read_json()?)
    }

    fn send_multipart(
        &self,
        url: &str,
        file: &AttachmentFile,
    ) -> Result<ureq::Body, ConfluenceError> {
        let boundary = format!("----Md2WikiBoundary{:016x}", rand::rng().random::<u64>());
        let body = multipart_body(&boundary, file);

        let response = self
            .agent
            .post(url)
            .header("Authorization", self.auth.header_value())
            .header(
                "Content-Type",
                &format!("multipart/form-data; boundary={boundary}"),
            )
            .header("X-Atlassian-Token", "nocheck")
            .header("Accept", "application/json")
            .send(&body[..])?;

        checked(response)
    }
}

/// Build a `multipart/form-data` body with the file and an optional comment.
fn multipart_body(boundary: &str, file: &AttachmentFile) -> Vec<u8> {
    let mut body = Vec::with_capacity(file.data.len() + 512);

    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            file.filename.replace('"', "%22")
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", file.content_type).as_bytes());
    body.extend_from_slice(&file.data);
    body.extend_from_slice(b"\r\n");

    if let Some(comment) = &file.comment {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(b"Content-Disposition: form-data; name=\"comment\"\r\n");
        body.extend_from_slice(b"Content-Type: text/plain; charset=utf-8\r\n\r\n");
        body.extend_from_slice(comment.as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}
