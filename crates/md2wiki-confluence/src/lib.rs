//! Confluence integration for md2wiki.
//!
//! - [`ConfluenceClient`]: REST API client with API key authentication
//! - [`ConfluenceApi`]: the operations publishing relies on
//! - [`PagePublisher`]: create/update/delete reconciliation of one page
//! - [`upload_attachment`]: local file to page attachment
//!
//! ```no_run
//! use md2wiki_confluence::{ConfluenceApi, ConfluenceClient};
//!
//! let client = ConfluenceClient::new("https://acme.atlassian.net/wiki", "me@acme.com", "token");
//! if let Some(page) = client.find_page("Guide", "DOC", &[])? {
//!     println!("{} is at version {}", page.id, page.version);
//! }
//! # Ok::<(), md2wiki_confluence::ConfluenceError>(())
//! ```

// API seam
mod api;
pub use api::{
    AttachmentFile, ConfluenceApi, CreatedPage, NewPage, PageInfo, PageUpdate, PropertyUpdate,
    RemoteProperty, UpdatedPage,
};

// Authentication (internal)
mod auth;

// API client
mod client;
pub use client::ConfluenceClient;

// Attachment upload
pub mod attachments;
pub use attachments::{SkipReason, UploadOutcome, upload_attachment};

// Types
mod types;
pub use types::Attachment;

// Page publisher
pub mod publisher;
pub use publisher::{PagePublisher, PublishConfig, PublishError, PublishOutcome, PublishedPage};

// Errors
pub mod error;
pub use error::ConfluenceError;

#[cfg(test)]
mod mock;
