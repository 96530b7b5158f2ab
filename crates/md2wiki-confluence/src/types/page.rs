//! Confluence content types.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::ConfluenceError;

/// Content search response (`GET /content?title=…`).
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ContentSearch {
    pub results: Vec<Content>,
}

/// Content object, as returned by search, create and update.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Content {
    pub id: String,
    #[serde(default)]
    pub version: Option<Version>,
    #[serde(default)]
    pub space: Option<Space>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
    #[serde(rename = "_links", default)]
    pub links: Option<Links>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Version {
    pub number: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Space {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Metadata {
    #[serde(default)]
    pub properties: HashMap<String, Property>,
}

/// Expanded content property (`metadata.properties.<key>`).
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Property {
    pub key: String,
    #[serde(default)]
    pub value: serde_json::Value,
    pub version: Version,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Links {
    #[serde(default)]
    pub webui: Option<String>,
}

impl Content {
    /// Current version. The server is the only source for it, so a
    /// response without one is an error.
    pub(crate) fn version_number(&self) -> Result<u32, ConfluenceError> {
        self.version.as_ref().map(|v| v.number).ok_or_else(|| {
            ConfluenceError::UnexpectedResponse(format!("page {} has no version", self.id))
        })
    }

    /// Web link, absolute when `base_url` is given.
    pub(crate) fn web_link(&self, base_url: &str) -> String {
        self.links
            .as_ref()
            .and_then(|links| links.webui.as_deref())
            .map_or_else(
                || format!("{base_url}/pages/viewpage.action?pageId={}", self.id),
                |webui| format!("{base_url}{webui}"),
            )
    }
}
