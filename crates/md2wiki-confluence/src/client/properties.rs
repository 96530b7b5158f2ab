//! Content property operations for Confluence API.

use serde_json::json;
use tracing::info;

use super::{ConfluenceClient, checked, encode};
use crate::api::PropertyUpdate;
use crate::error::ConfluenceError;

impl ConfluenceClient {
    /// Write a content property at the given version.
    pub(crate) fn put_property(
        &self,
        page_id: &str,
        property: &PropertyUpdate,
    ) -> Result<(), ConfluenceError> {
        let url = format!(
            "{}/content/{}/property/{}",
            self.api_url(),
            encode(page_id),
            encode(&property.key)
        );

        let payload = json!({
            "key": property.key,
            "version": {"number": property.version},
            "value": property.value
        });

        info!(
            "Setting property '{}' on page {} (version {})",
            property.key, page_id, property.version
        );

        let payload_bytes = serde_json::to_vec(&payload)?;

        let response = self
            .agent
            .put(&url)
            .header("Authorization", self.auth.header_value())
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .send(&payload_bytes[..])?;

        checked(response)?;
        Ok(())
    }
}
