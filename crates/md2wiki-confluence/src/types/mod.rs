//! Confluence API response types.

mod attachment;
mod page;

pub use attachment::{Attachment, AttachmentsResponse};
pub(crate) use page::{Content, ContentSearch};
