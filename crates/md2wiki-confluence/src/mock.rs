//! In-memory [`ConfluenceApi`] that records every call.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::api::{
    AttachmentFile, ConfluenceApi, CreatedPage, NewPage, PageInfo, PageUpdate, PropertyUpdate,
    RemoteProperty, UpdatedPage,
};
use crate::error::ConfluenceError;
use crate::types::Attachment;

pub(crate) const BASE_URL: &str = "https://acme.atlassian.net/wiki";

/// A recorded API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    FindPage {
        title: String,
        property_keys: Vec<String>,
    },
    CreatePage {
        title: String,
        body: String,
        ancestors: Vec<String>,
        editor_version: String,
    },
    UpdatePage {
        id: String,
        body: String,
        version: u32,
        ancestors: Vec<String>,
        labels: Vec<String>,
    },
    UpdateProperty {
        page_id: String,
        key: String,
        value: String,
        version: u32,
    },
    DeletePage {
        page_id: String,
    },
    FindAttachment {
        page_id: String,
        filename: String,
    },
    CreateAttachment {
        page_id: String,
        filename: String,
        content_type: String,
        comment: Option<String>,
    },
    UpdateAttachmentData {
        page_id: String,
        attachment_id: String,
        filename: String,
    },
}

/// Pages by title, attachments by `(page_id, filename)`.
#[derive(Debug, Default)]
pub(crate) struct MockConfluence {
    pages: RefCell<HashMap<String, PageInfo>>,
    attachments: RefCell<HashMap<(String, String), Attachment>>,
    calls: RefCell<Vec<Call>>,
    next_id: Cell<u32>,
    fail_updates: Cell<bool>,
}

impl MockConfluence {
    pub(crate) fn new() -> Self {
        Self {
            next_id: Cell::new(1000),
            ..Self::default()
        }
    }

    /// Seed an existing page.
    pub(crate) fn with_page(self, title: &str, id: &str, version: u32) -> Self {
        self.pages.borrow_mut().insert(
            title.to_owned(),
            PageInfo {
                id: id.to_owned(),
                version,
                link: format!("{BASE_URL}/spaces/DOC/pages/{id}"),
                properties: HashMap::new(),
            },
        );
        self
    }

    /// Seed a content property on an existing page.
    pub(crate) fn with_property(self, title: &str, key: &str, version: u32) -> Self {
        if let Some(page) = self.pages.borrow_mut().get_mut(title) {
            page.properties.insert(
                key.to_owned(),
                RemoteProperty {
                    key: key.to_owned(),
                    version,
                    value: serde_json::Value::String("old".to_owned()),
                },
            );
        }
        self
    }

    /// Seed an existing attachment.
    pub(crate) fn with_attachment(self, page_id: &str, filename: &str, id: &str) -> Self {
        self.attachments.borrow_mut().insert(
            (page_id.to_owned(), filename.to_owned()),
            Attachment {
                id: id.to_owned(),
                title: filename.to_owned(),
            },
        );
        self
    }

    /// Make every page update fail with HTTP 409.
    pub(crate) fn failing_updates(self) -> Self {
        self.fail_updates.set(true);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn next_id(&self) -> String {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id.to_string()
    }
}

impl ConfluenceApi for MockConfluence {
    fn find_page(
        &self,
        title: &str,
        _space_key: &str,
        property_keys: &[String],
    ) -> Result<Option<PageInfo>, ConfluenceError> {
        self.record(Call::FindPage {
            title: title.to_owned(),
            property_keys: property_keys.to_vec(),
        });
        Ok(self.pages.borrow().get(title).map(|page| {
            let mut page = page.clone();
            page.properties.retain(|key, _| property_keys.contains(key));
            page
        }))
    }

    fn create_page(&self, page: &NewPage<'_>) -> Result<CreatedPage, ConfluenceError> {
        self.record(Call::CreatePage {
            title: page.title.to_owned(),
            body: page.body.to_owned(),
            ancestors: page.ancestors.to_vec(),
            editor_version: page.editor_version.to_string(),
        });
        let id = self.next_id();
        let link = format!("{BASE_URL}/spaces/{}/pages/{id}", page.space_key);
        self.pages.borrow_mut().insert(
            page.title.to_owned(),
            PageInfo {
                id: id.clone(),
                version: 1,
                link: link.clone(),
                properties: HashMap::new(),
            },
        );
        Ok(CreatedPage {
            id,
            version: 1,
            link,
            space_name: Some("Documentation".to_owned()),
        })
    }

    fn update_page(&self, update: &PageUpdate<'_>) -> Result<UpdatedPage, ConfluenceError> {
        self.record(Call::UpdatePage {
            id: update.id.to_owned(),
            body: update.body.to_owned(),
            version: update.version,
            ancestors: update.ancestors.to_vec(),
            labels: update.labels.to_vec(),
        });
        if self.fail_updates.get() {
            return Err(ConfluenceError::HttpResponse {
                status: 409,
                body: "version conflict".to_owned(),
            });
        }
        if let Some(page) = self.pages.borrow_mut().get_mut(update.title) {
            page.version = update.version;
        }
        Ok(UpdatedPage {
            id: update.id.to_owned(),
            version: update.version,
            link: format!("{BASE_URL}/spaces/{}/pages/{}", update.space_key, update.id),
        })
    }

    fn update_property(
        &self,
        page_id: &str,
        property: &PropertyUpdate,
    ) -> Result<(), ConfluenceError> {
        self.record(Call::UpdateProperty {
            page_id: page_id.to_owned(),
            key: property.key.clone(),
            value: property.value.clone(),
            version: property.version,
        });
        Ok(())
    }

    fn delete_page(&self, page_id: &str) -> Result<(), ConfluenceError> {
        self.record(Call::DeletePage {
            page_id: page_id.to_owned(),
        });
        self.pages.borrow_mut().retain(|_, page| page.id != page_id);
        Ok(())
    }

    fn find_attachment(
        &self,
        page_id: &str,
        filename: &str,
    ) -> Result<Option<Attachment>, ConfluenceError> {
        self.record(Call::FindAttachment {
            page_id: page_id.to_owned(),
            filename: filename.to_owned(),
        });
        Ok(self
            .attachments
            .borrow()
            .get(&(page_id.to_owned(), filename.to_owned()))
            .cloned())
    }

    fn create_attachment(
        &self,
        page_id: &str,
        file: &AttachmentFile,
    ) -> Result<Attachment, ConfluenceError> {
        self.record(Call::CreateAttachment {
            page_id: page_id.to_owned(),
            filename: file.filename.clone(),
            content_type: file.content_type.clone(),
            comment: file.comment.clone(),
        });
        let attachment = Attachment {
            id: format!("att{}", self.next_id()),
            title: file.filename.clone(),
        };
        self.attachments.borrow_mut().insert(
            (page_id.to_owned(), file.filename.clone()),
            attachment.clone(),
        );
        Ok(attachment)
    }

    fn update_attachment_data(
        &self,
        page_id: &str,
        attachment_id: &str,
        file: &AttachmentFile,
    ) -> Result<Attachment, ConfluenceError> {
        self.record(Call::UpdateAttachmentData {
            page_id: page_id.to_owned(),
            attachment_id: attachment_id.to_owned(),
            filename: file.filename.clone(),
        });
        Ok(Attachment {
            id: attachment_id.to_owned(),
            title: file.filename.clone(),
        })
    }
}
