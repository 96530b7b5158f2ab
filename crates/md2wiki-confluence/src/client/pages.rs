//! Page operations for Confluence API.

use std::collections::HashMap;

use serde_json::json;
use tracing::{error, info};

use super::{ConfluenceClient, checked, encode};
use crate::api::{CreatedPage, NewPage, PageInfo, PageUpdate, RemoteProperty, UpdatedPage};
use crate::error::ConfluenceError;
use crate::types::{Content, ContentSearch};

impl ConfluenceClient {
    /// Find a page by title in a space.
    pub(crate) fn get_page_by_title(
        &self,
        title: &str,
        space_key: &str,
        property_keys: &[String],
    ) -> Result<Option<PageInfo>, ConfluenceError> {
        let mut expand = vec!["version".to_owned(), "ancestors".to_owned()];
        expand.extend(
            property_keys
                .iter()
                .map(|key| format!("metadata.properties.{key}")),
        );
        let url = format!(
            "{}/content?title={}&spaceKey={}&expand={}",
            self.api_url(),
            encode(title),
            encode(space_key),
            encode(&expand.join(","))
        );

        info!("Retrieving page information: {}", url);

        let response = self
            .agent
            .get(&url)
            .header("Authorization", self.auth.header_value())
            .header("Accept", "application/json")
            .call()?;

        let mut body_reader = match checked(response) {
            Ok(body) => body,
            Err(err) => {
                if let ConfluenceError::HttpResponse { status: 404, .. } = err {
                    error!("Error: Page not found. Check the following are correct:");
                    error!("\tSpace Key : {}", space_key);
                    error!("\tOrganisation Name: {}", self.base_url);
                }
                return Err(err);
            }
        };

        let search: ContentSearch = body_reader.read_json()?;
        search
            .results
            .into_iter()
            .next()
            .map(|page| self.page_info(page))
            .transpose()
    }

    /// Create a page.
    pub(crate) fn post_page(&self, page: &NewPage<'_>) -> Result<CreatedPage, ConfluenceError> {
        let url = format!("{}/content/", self.api_url());

        let payload = json!({
            "type": "page",
            "title": page.title,
            "space": {"key": page.space_key},
            "body": {
                "storage": {
                    "value": page.body,
                    "representation": "storage"
                }
            },
            "ancestors": ancestors_json(page.ancestors),
            "metadata": {
                "properties": {
                    "editor": {"value": page.editor_version.to_string()}
                }
            }
        });

        info!("Creating page '{}' in space {}", page.title, page.space_key);

        let payload_bytes = serde_json::to_vec(&payload)?;

        let response = self
            .agent
            .post(&url)
            .header("Authorization", self.auth.header_value())
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .send(&payload_bytes[..])?;

        let content: Content = checked(response)?.read_json()?;
        Ok(CreatedPage {
            version: content.version_number()?,
            link: content.web_link(&self.base_url),
            space_name: content.space.as_ref().and_then(|s| s.name.clone()),
            id: content.id,
        })
    }

    /// Replace page content (caller supplies the new version).
    pub(crate) fn put_page(
        &self,
        update: &PageUpdate<'_>,
    ) -> Result<UpdatedPage, ConfluenceError> {
        let url = format!("{}/content/{}", self.api_url(), encode(update.id));

        let mut payload = json!({
            "id": update.id,
            "type": "page",
            "title": update.title,
            "space": {"key": update.space_key},
            "body": {
                "storage": {
                    "value": update.body,
                    "representation": "storage"
                }
            },
            "version": {"number": update.version, "minorEdit": true},
            "ancestors": ancestors_json(update.ancestors)
        });

        if !update.labels.is_empty() {
            let labels: Vec<_> = update
                .labels
                .iter()
                .map(|name| json!({"prefix": "global", "name": name}))
                .collect();
            payload["metadata"] = json!({"labels": labels});
        }

        info!("Updating page {} to version {}", update.id, update.version);

        let payload_bytes = serde_json::to_vec(&payload)?;

        let response = self
            .agent
            .put(&url)
            .header("Authorization", self.auth.header_value())
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .send(&payload_bytes[..])?;

        let content: Content = checked(response)?.read_json()?;
        Ok(UpdatedPage {
            version: content.version_number()?,
            link: content.web_link(&self.base_url),
            id: content.id,
        })
    }

    /// Delete a page.
    pub(crate) fn delete_content(&self, page_id: &str) -> Result<(), ConfluenceError> {
        let url = format!("{}/content/{}", self.api_url(), encode(page_id));

        info!("Deleting page {}", page_id);

        let response = self
            .agent
            .delete(&url)
            .header("Authorization", self.auth.header_value())
            .call()?;

        checked(response)?;
        Ok(())
    }

    fn page_info(&self, page: Content) -> Result<PageInfo, ConfluenceError> {
        let properties: HashMap<String, RemoteProperty> = page
            .metadata
            .as_ref()
            .map(|metadata| {
                metadata
                    .properties
                    .iter()
                    .map(|(name, property)| {
                        (
                            name.clone(),
                            RemoteProperty {
                                key: property.key.clone(),
                                version: property.version.number,
                                value: property.value.clone(),
                            },
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(PageInfo {
            version: page.version_number()?,
            link: page.web_link(&self.base_url),
            id: page.id,
            properties,
        })
    }
}

fn ancestors_json(ids: &[String]) -> serde_json::Value {
    ids.iter()
        .map(|id| json!({"type": "page", "id": id}))
        .collect()
}
