//! HTTP Basic authentication with an API key.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Precomputed `Authorization` header for username + API key.
pub(crate) struct BasicAuth {
    username: String,
    header: String,
}

impl BasicAuth {
    pub(crate) fn new(username: &str, api_key: &str) -> Self {
        let token = STANDARD.encode(format!("{username}:{api_key}"));
        Self {
            username: username.to_owned(),
            header: format!("Basic {token}"),
        }
    }

    /// Value for the `Authorization` header.
    pub(crate) fn header_value(&self) -> &str {
        &self.header
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("header", &"<redacted>")
            .finish()
    }
}
