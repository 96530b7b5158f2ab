//! The operations the publisher needs from Confluence.
//!
//! [`ConfluenceClient`](crate::ConfluenceClient) implements [`ConfluenceApi`]
//! over HTTP; tests substitute an in-memory implementation.

use std::collections::HashMap;

use md2wiki_convert::EditorVersion;

use crate::error::ConfluenceError;
use crate::types::Attachment;

/// A page found by title lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct PageInfo {
    /// Page ID.
    pub id: String,
    /// Current version number.
    pub version: u32,
    /// Absolute web link.
    pub link: String,
    /// Content properties that were asked for and exist, by key.
    pub properties: HashMap<String, RemoteProperty>,
}

/// A content property as stored on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteProperty {
    /// Property key.
    pub key: String,
    /// Property version.
    pub version: u32,
    /// Stored value.
    pub value: serde_json::Value,
}

/// A freshly created page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPage {
    /// Page ID.
    pub id: String,
    /// Version of the new page (normally 1).
    pub version: u32,
    /// Absolute web link.
    pub link: String,
    /// Name of the space the page landed in.
    pub space_name: Option<String>,
}

/// Result of a page update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatedPage {
    /// Page ID.
    pub id: String,
    /// Version after the update.
    pub version: u32,
    /// Absolute web link.
    pub link: String,
}

/// Page to create.
#[derive(Debug, Clone, Copy)]
pub struct NewPage<'a> {
    pub title: &'a str,
    pub space_key: &'a str,
    pub body: &'a str,
    /// Parent page IDs.
    pub ancestors: &'a [String],
    pub editor_version: EditorVersion,
}

/// Full replacement of a page's content.
#[derive(Debug, Clone, Copy)]
pub struct PageUpdate<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub space_key: &'a str,
    pub body: &'a str,
    /// Version to write: current version + 1.
    pub version: u32,
    /// Parent page IDs.
    pub ancestors: &'a [String],
    /// Labels replacing the current set.
    pub labels: &'a [String],
}

/// Content property write, carrying the version to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyUpdate {
    pub key: String,
    pub value: String,
    pub version: u32,
}

/// File content to attach to a page.
#[derive(Debug, Clone)]
pub struct AttachmentFile {
    /// Name the attachment is stored and looked up under.
    pub filename: String,
    /// MIME type.
    pub content_type: String,
    /// Attachment comment.
    pub comment: Option<String>,
    pub data: Vec<u8>,
}

/// Confluence operations used to publish a page.
pub trait ConfluenceApi {
    /// Look up a page by title within a space.
    ///
    /// `property_keys` are expanded into [`PageInfo::properties`].
    fn find_page(
        &self,
        title: &str,
        space_key: &str,
        property_keys: &[String],
    ) -> Result<Option<PageInfo>, ConfluenceError>;

    /// Create a page.
    fn create_page(&self, page: &NewPage<'_>) -> Result<CreatedPage, ConfluenceError>;

    /// Replace a page's content.
    fn update_page(&self, update: &PageUpdate<'_>) -> Result<UpdatedPage, ConfluenceError>;

    /// Create or update a content property.
    fn update_property(
        &self,
        page_id: &str,
        property: &PropertyUpdate,
    ) -> Result<(), ConfluenceError>;

    /// Delete a page.
    fn delete_page(&self, page_id: &str) -> Result<(), ConfluenceError>;

    /// Look up an attachment of a page by filename.
    fn find_attachment(
        &self,
        page_id: &str,
        filename: &str,
    ) -> Result<Option<Attachment>, ConfluenceError>;

    /// Attach a new file to a page.
    fn create_attachment(
        &self,
        page_id: &str,
        file: &AttachmentFile,
    ) -> Result<Attachment, ConfluenceError>;

    /// Upload a new version of an existing attachment.
    fn update_attachment_data(
        &self,
        page_id: &str,
        attachment_id: &str,
        file: &AttachmentFile,
    ) -> Result<Attachment, ConfluenceError>;
}
