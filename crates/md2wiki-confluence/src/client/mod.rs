//! Confluence Cloud REST API client.
//!
//! Sync HTTP client authenticating with username + API key (HTTP Basic).

mod attachments;
mod pages;
mod properties;

use std::time::Duration;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use ureq::Agent;
use ureq::http::Response;

use crate::api::{
    AttachmentFile, ConfluenceApi, CreatedPage, NewPage, PageInfo, PageUpdate, PropertyUpdate,
    UpdatedPage,
};
use crate::auth::BasicAuth;
use crate::error::ConfluenceError;
use crate::types::Attachment;

/// Default HTTP timeout in seconds.
const DEFAULT_TIMEOUT: u64 = 30;

/// Characters kept verbatim in query values and path segments.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Confluence REST API client.
pub struct ConfluenceClient {
    agent: Agent,
    base_url: String,
    auth: BasicAuth,
}

impl ConfluenceClient {
    /// Create a client.
    ///
    /// # Arguments
    /// * `base_url` - Confluence base URL (e.g. `https://acme.atlassian.net/wiki`)
    /// * `username` - Account username (email)
    /// * `api_key` - API token for the account
    #[must_use]
    pub fn new(base_url: &str, username: &str, api_key: &str) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT)))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_owned(),
            auth: BasicAuth::new(username, api_key),
        }
    }

    /// Base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the API base URL.
    fn api_url(&self) -> String {
        format!("{}/rest/api", self.base_url)
    }
}

impl std::fmt::Debug for ConfluenceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfluenceClient")
            .field("base_url", &self.base_url)
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}

impl ConfluenceApi for ConfluenceClient {
    fn find_page(
        &self,
        title: &str,
        space_key: &str,
        property_keys: &[String],
    ) -> Result<Option<PageInfo>, ConfluenceError> {
        self.get_page_by_title(title, space_key, property_keys)
    }

    fn create_page(&self, page: &NewPage<'_>) -> Result<CreatedPage, ConfluenceError> {
        self.post_page(page)
    }

    fn update_page(&self, update: &PageUpdate<'_>) -> Result<UpdatedPage, ConfluenceError> {
        self.put_page(update)
    }

    fn update_property(
        &self,
        page_id: &str,
        property: &PropertyUpdate,
    ) -> Result<(), ConfluenceError> {
        self.put_property(page_id, property)
    }

    fn delete_page(&self, page_id: &str) -> Result<(), ConfluenceError> {
        self.delete_content(page_id)
    }

    fn find_attachment(
        &self,
        page_id: &str,
        filename: &str,
    ) -> Result<Option<Attachment>, ConfluenceError> {
        self.find_attachment_by_name(page_id, filename)
    }

    fn create_attachment(
        &self,
        page_id: &str,
        file: &AttachmentFile,
    ) -> Result<Attachment, ConfluenceError> {
        self.post_attachment(page_id, file)
    }

    fn update_attachment_data(
        &self,
        page_id: &str,
        attachment_id: &str,
        file: &AttachmentFile,
    ) -> Result<Attachment, ConfluenceError> {
        self.post_attachment_data(page_id, attachment_id, file)
    }
}

/// Percent-encode a query value or path segment.
pub(crate) fn encode(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Turn a non-2xx response into [`ConfluenceError::HttpResponse`].
fn checked(response: Response<ureq::Body>) -> Result<ureq::Body, ConfluenceError> {
    let status = response.status().as_u16();
    let mut body_reader = response.into_body();

    if !(200..300).contains(&status) {
        let error_body = body_reader
            .read_to_string()
            .unwrap_or_else(|_| "(unable to read error body)".to_owned());
        return Err(ConfluenceError::HttpResponse {
            status,
            body: error_body,
        });
    }

    Ok(body_reader)
}
