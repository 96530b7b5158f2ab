//! Result types for page publishing.

/// What publishing did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The page didn't exist and was created.
    Created(PublishedPage),
    /// The existing page was updated.
    Updated(PublishedPage),
    /// The page was deleted.
    Deleted {
        /// ID of the deleted page.
        page_id: String,
    },
    /// Delete was requested but there was no such page.
    NothingToDelete,
}

impl PublishOutcome {
    /// Web link of the created or updated page.
    pub fn link(&self) -> Option<&str> {
        match self {
            Self::Created(page) | Self::Updated(page) => Some(&page.link),
            Self::Deleted { .. } | Self::NothingToDelete => None,
        }
    }
}

/// A page as left by a create or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedPage {
    /// Page ID.
    pub id: String,
    /// Version after the last write.
    pub version: u32,
    /// Absolute web link.
    pub link: String,
    /// Number of files uploaded as attachments.
    pub attachments_uploaded: usize,
    /// Whether an update pass ran right after creation.
    pub follow_up_update: bool,
}
