//! Page publisher implementation.

use std::collections::HashMap;

use md2wiki_convert::markup;
use md2wiki_convert::{ConvertError, PageLocation, has_local_links, rewrite_local_refs};
use tracing::{debug, info, warn};

use crate::api::{ConfluenceApi, NewPage, PageInfo, PageUpdate, PropertyUpdate, RemoteProperty};
use crate::attachments::{download_path, is_remote_reference, upload_attachment};

use super::PublishConfig;
use super::error::PublishError;
use super::result::{PublishOutcome, PublishedPage};

/// Publishes converted documents to Confluence.
pub struct PagePublisher<'a, A: ConfluenceApi + ?Sized> {
    api: &'a A,
    config: &'a PublishConfig,
}

impl<'a, A: ConfluenceApi + ?Sized> PagePublisher<'a, A> {
    /// Create a new page publisher.
    #[must_use]
    pub fn new(api: &'a A, config: &'a PublishConfig) -> Self {
        Self { api, config }
    }

    /// Create, update or delete the page titled `title`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the configured ancestor doesn't exist
    /// - a local link targets no heading
    /// - a Confluence API call fails
    pub fn publish(&self, title: &str, body: &str) -> Result<PublishOutcome, PublishError> {
        let existing =
            self.api
                .find_page(title, &self.config.space_key, &self.config.property_keys())?;

        if self.config.delete {
            return self.delete(existing);
        }

        let ancestors = self.ancestors()?;

        match existing {
            Some(page) => {
                let properties = next_property_versions(&self.config.properties, &page.properties);
                let published = self.update(&page.id, title, body, page.version, &ancestors, &properties)?;
                Ok(PublishOutcome::Updated(published))
            }
            None => self.create(title, body, &ancestors),
        }
    }

    fn delete(&self, existing: Option<PageInfo>) -> Result<PublishOutcome, PublishError> {
        let Some(page) = existing else {
            info!("Page does not exist, nothing to delete");
            return Ok(PublishOutcome::NothingToDelete);
        };

        self.api.delete_page(&page.id)?;
        info!("Page {} deleted successfully.", page.id);
        Ok(PublishOutcome::Deleted { page_id: page.id })
    }

    fn ancestors(&self) -> Result<Vec<String>, PublishError> {
        let Some(title) = self.config.ancestor.as_deref() else {
            return Ok(Vec::new());
        };

        match self.api.find_page(title, &self.config.space_key, &[])? {
            Some(parent) => {
                info!("Page {} will be added as a child of {}", parent.id, title);
                Ok(vec![parent.id])
            }
            None => Err(PublishError::AncestorNotFound(title.to_owned())),
        }
    }

    fn create(
        &self,
        title: &str,
        body: &str,
        ancestors: &[String],
    ) -> Result<PublishOutcome, PublishError> {
        let created = self.api.create_page(&NewPage {
            title,
            space_key: &self.config.space_key,
            body,
            ancestors,
            editor_version: self.config.editor_version,
        })?;

        info!(
            "Page created in {} with ID: {}.",
            created.space_name.as_deref().unwrap_or(&self.config.space_key),
            created.id
        );
        info!("URL: {}", created.link);

        if !self.needs_follow_up(body) {
            return Ok(PublishOutcome::Created(PublishedPage {
                id: created.id,
                version: created.version,
                link: created.link,
                attachments_uploaded: 0,
                follow_up_update: false,
            }));
        }

        info!("\tAttachments, local references, content properties or labels found, update procedure called.");
        let properties = next_property_versions(&self.config.properties, &HashMap::new());
        let published = self.update(
            &created.id,
            title,
            body,
            created.version,
            ancestors,
            &properties,
        )?;

        Ok(PublishOutcome::Created(PublishedPage {
            follow_up_update: true,
            ..published
        }))
    }

    fn needs_follow_up(&self, body: &str) -> bool {
        let has_images = markup::find_elements(body, |name| name == "img")
            .map_or_else(|_| body.contains("<img"), |images| !images.is_empty());

        has_images
            || has_local_links(body)
            || !self.config.properties.is_empty()
            || !self.config.attachments.is_empty()
            || !self.config.labels.is_empty()
    }

    fn update(
        &self,
        page_id: &str,
        title: &str,
        body: &str,
        current_version: u32,
        ancestors: &[String],
        properties: &[PropertyUpdate],
    ) -> Result<PublishedPage, PublishError> {
        info!("Updating page...");

        let (body, mut uploaded) = self.attach_images(page_id, body)?;
        uploaded += self.attach_files(page_id)?;

        let location = PageLocation {
            base_url: &self.config.base_url,
            space_key: &self.config.space_key,
            page_id,
            title,
        };
        let body = rewrite_local_refs(
            &body,
            self.config.markdown_source.as_deref(),
            self.config.editor_version,
            &location,
        )?;

        let updated = self.api.update_page(&PageUpdate {
            id: page_id,
            title,
            space_key: &self.config.space_key,
            body: &body,
            version: current_version + 1,
            ancestors,
            labels: &self.config.labels,
        })?;

        info!("Page updated successfully.");
        info!("URL: {}", updated.link);

        if !properties.is_empty() {
            info!("Updating page content properties...");
            for property in properties {
                self.api.update_property(page_id, property)?;
                info!("\tUpdated property {}", property.key);
            }
        }

        Ok(PublishedPage {
            id: updated.id,
            version: updated.version,
            link: updated.link,
            attachments_uploaded: uploaded,
            follow_up_update: false,
        })
    }

    /// Upload every local `<img>` and point its `src` at the attachment.
    fn attach_images(&self, page_id: &str, body: &str) -> Result<(String, usize), PublishError> {
        let images = markup::find_elements(body, |name| name == "img").map_err(ConvertError::from)?;

        // Source reference to its new src, or None when not uploaded
        let mut targets: HashMap<&str, Option<String>> = HashMap::new();
        let mut uploaded = 0;
        let mut edits = Vec::new();

        for image in &images {
            let Some(src) = image.attr("src") else {
                continue;
            };
            if !image.is_complete() {
                warn!("Image {} has no known end, left in place", src);
                continue;
            }
            if is_remote_reference(src) {
                debug!("Leaving remote image {} in place", src);
                continue;
            }

            let target = match targets.get(src) {
                Some(target) => target.clone(),
                None => {
                    let outcome = upload_attachment(
                        self.api,
                        page_id,
                        &self.config.source_dir,
                        src,
                        image.attr("alt"),
                    )?;
                    let target = outcome.attachment().map(|attachment| {
                        uploaded += 1;
                        download_path(&self.config.base_url, page_id, &attachment.title)
                    });
                    targets.insert(src, target.clone());
                    target
                }
            };

            if let Some(new_src) = target {
                edits.push((image.start..image.end, image.open_tag_with("src", &new_src)));
            }
        }

        Ok((markup::splice(body, edits), uploaded))
    }

    fn attach_files(&self, page_id: &str) -> Result<usize, PublishError> {
        let mut uploaded = 0;
        for reference in &self.config.attachments {
            let outcome =
                upload_attachment(self.api, page_id, &self.config.source_dir, reference, None)?;
            if outcome.attachment().is_some() {
                uploaded += 1;
            }
        }
        Ok(uploaded)
    }
}

/// Property writes for the configured properties: `remote + 1`, or 1 when
/// the page doesn't have the property yet.
fn next_property_versions(
    configured: &[(String, String)],
    remote: &HashMap<String, RemoteProperty>,
) -> Vec<PropertyUpdate> {
    configured
        .iter()
        .map(|(key, value)| PropertyUpdate {
            key: key.clone(),
            value: value.clone(),
            version: remote.get(key).map_or(1, |property| property.version + 1),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{BASE_URL, Call, MockConfluence};
    use pretty_assertions::assert_eq;

    fn config(dir: &std::path::Path) -> PublishConfig {
        PublishConfig::new("DOC", BASE_URL, dir)
    }

    fn updates(calls: &[Call]) -> Vec<&Call> {
        calls
            .iter()
            .filter(|call| matches!(call, Call::UpdatePage { .. }))
            .collect()
    }

    #[test]
    fn test_absent_page_created_once() {
        let mock = MockConfluence::new();
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());

        let outcome = PagePublisher::new(&mock, &config)
            .publish("Guide", "<p>plain</p>")
            .unwrap();

        let PublishOutcome::Created(page) = outcome else {
            panic!("expected Created, got {outcome:?}");
        };
        assert_eq!(page.id, "1000");
        assert!(!page.follow_up_update);
        assert_eq!(
            mock.calls(),
            vec![
                Call::FindPage {
                    title: "Guide".to_owned(),
                    property_keys: Vec::new(),
                },
                Call::CreatePage {
                    title: "Guide".to_owned(),
                    body: "<p>plain</p>".to_owned(),
                    ancestors: Vec::new(),
                    editor_version: "v1".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn test_present_page_updated_with_next_version() {
        let mock = MockConfluence::new().with_page("Guide", "55", 4);
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());

        let outcome = PagePublisher::new(&mock, &config)
            .publish("Guide", "<p>new</p>")
            .unwrap();

        assert!(matches!(outcome, PublishOutcome::Updated(ref page) if page.version == 5));
        let calls = mock.calls();
        assert!(!calls.iter().any(|call| matches!(call, Call::CreatePage { .. })));
        assert_eq!(
            updates(&calls),
            vec![&Call::UpdatePage {
                id: "55".to_owned(),
                body: "<p>new</p>".to_owned(),
                version: 5,
                ancestors: Vec::new(),
                labels: Vec::new(),
            }]
        );
    }

    #[test]
    fn test_property_versions() {
        let mock = MockConfluence::new()
            .with_page("Guide", "55", 2)
            .with_property("Guide", "owner", 3);
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.properties = vec![
            ("owner".to_owned(), "team-b".to_owned()),
            ("reviewed".to_owned(), "yes".to_owned()),
        ];

        PagePublisher::new(&mock, &config)
            .publish("Guide", "<p>x</p>")
            .unwrap();

        let calls = mock.calls();
        assert_eq!(
            calls[0],
            Call::FindPage {
                title: "Guide".to_owned(),
                property_keys: vec!["owner".to_owned(), "reviewed".to_owned()],
            }
        );
        let properties: Vec<_> = calls
            .iter()
            .filter_map(|call| match call {
                Call::UpdateProperty { key, version, .. } => Some((key.as_str(), *version)),
                _ => None,
            })
            .collect();
        assert_eq!(properties, vec![("owner", 4), ("reviewed", 1)]);
        // Properties only after the page update
        let update_at = calls.iter().position(|c| matches!(c, Call::UpdatePage { .. })).unwrap();
        let first_property = calls.iter().position(|c| matches!(c, Call::UpdateProperty { .. })).unwrap();
        assert!(update_at < first_property);
    }

    #[test]
    fn test_created_page_properties_start_at_one() {
        let mock = MockConfluence::new();
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.properties = vec![("owner".to_owned(), "team-a".to_owned())];
        config.labels = vec!["docs".to_owned()];

        let outcome = PagePublisher::new(&mock, &config)
            .publish("Guide", "<p>x</p>")
            .unwrap();

        assert!(matches!(outcome, PublishOutcome::Created(ref page) if page.follow_up_update && page.version == 2));
        let calls = mock.calls();
        assert!(calls.contains(&Call::UpdateProperty {
            page_id: "1000".to_owned(),
            key: "owner".to_owned(),
            value: "team-a".to_owned(),
            version: 1,
        }));
        assert!(matches!(
            updates(&calls)[..],
            [Call::UpdatePage { version: 2, labels, .. }] if labels == &vec!["docs".to_owned()]
        ));
    }

    #[test]
    fn test_image_uploaded_and_rewritten_after_create() {
        let mock = MockConfluence::new();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("img.png"), b"\x89PNG").unwrap();
        let config = config(dir.path());

        let body = "<p>Hello <img src=\"img.png\" alt=\"alt\" /></p>\n";
        let outcome = PagePublisher::new(&mock, &config).publish("Title", body).unwrap();

        let PublishOutcome::Created(page) = outcome else {
            panic!("expected Created, got {outcome:?}");
        };
        assert!(page.follow_up_update);
        assert_eq!(page.attachments_uploaded, 1);

        let calls = mock.calls();
        let uploads: Vec<_> = calls
            .iter()
            .filter(|call| matches!(call, Call::CreateAttachment { .. }))
            .collect();
        assert_eq!(
            uploads,
            vec![&Call::CreateAttachment {
                page_id: "1000".to_owned(),
                filename: "img.png".to_owned(),
                content_type: "image/png".to_owned(),
                comment: Some("alt".to_owned()),
            }]
        );
        assert_eq!(
            updates(&calls),
            vec![&Call::UpdatePage {
                id: "1000".to_owned(),
                body: "<p>Hello <img src=\"/wiki/download/attachments/1000/img.png\" alt=\"alt\" /></p>\n"
                    .to_owned(),
                version: 2,
                ancestors: Vec::new(),
                labels: Vec::new(),
            }]
        );
    }

    #[test]
    fn test_unclosed_image_tag_keeps_following_content() {
        let mock = MockConfluence::new().with_page("Guide", "9", 1);
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("d.png"), b"png").unwrap();
        let config = config(dir.path());

        let body = md2wiki_convert::render_markdown(
            "Intro\n\n<img src=\"d.png\" width=\"300\">\n\n## After\n\nMore text here.\n",
        );
        PagePublisher::new(&mock, &config).publish("Guide", &body).unwrap();

        let calls = mock.calls();
        let Call::UpdatePage { body: sent, .. } = updates(&calls)[0] else {
            unreachable!()
        };
        assert!(sent.contains(r#"<img src="/wiki/download/attachments/9/d.png" width="300" />"#));
        assert!(sent.contains("<h2>After</h2>"));
        assert!(sent.contains("<p>More text here.</p>"));
        assert!(!sent.contains(r#"src="d.png""#));
    }

    #[test]
    fn test_missing_and_remote_images_left_alone() {
        let mock = MockConfluence::new().with_page("Guide", "9", 1);
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.attachments = vec!["missing.pdf".to_owned()];

        let body = r#"<p><img src="gone.png" alt="" /><img src="https://x.test/a.png" alt="" /></p>"#;
        let outcome = PagePublisher::new(&mock, &config).publish("Guide", body).unwrap();

        assert!(matches!(outcome, PublishOutcome::Updated(ref page) if page.attachments_uploaded == 0));
        let calls = mock.calls();
        assert!(!calls.iter().any(|call| matches!(
            call,
            Call::FindAttachment { .. } | Call::CreateAttachment { .. }
        )));
        assert!(matches!(updates(&calls)[..], [Call::UpdatePage { body: b, .. }] if b == body));
    }

    #[test]
    fn test_same_image_uploaded_once() {
        let mock = MockConfluence::new().with_page("Guide", "9", 1);
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), b"png").unwrap();
        let config = config(dir.path());

        let body = r#"<p><img src="a.png" alt="" /></p><p><img src="a.png" alt="" /></p>"#;
        PagePublisher::new(&mock, &config).publish("Guide", body).unwrap();

        let calls = mock.calls();
        let uploads = calls
            .iter()
            .filter(|call| matches!(call, Call::CreateAttachment { .. }))
            .count();
        assert_eq!(uploads, 1);
        let Call::UpdatePage { body, .. } = updates(&calls)[0] else {
            unreachable!()
        };
        assert_eq!(body.matches("/wiki/download/attachments/9/a.png").count(), 2);
    }

    #[test]
    fn test_configured_attachments_uploaded() {
        let mock = MockConfluence::new().with_page("Guide", "9", 1);
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("files")).unwrap();
        std::fs::write(dir.path().join("files/manual.pdf"), b"%PDF").unwrap();
        let mut config = config(dir.path());
        config.attachments = vec!["files/manual.pdf".to_owned()];

        let outcome = PagePublisher::new(&mock, &config).publish("Guide", "<p>x</p>").unwrap();

        assert!(matches!(outcome, PublishOutcome::Updated(ref page) if page.attachments_uploaded == 1));
        assert!(mock.calls().contains(&Call::CreateAttachment {
            page_id: "9".to_owned(),
            filename: "manual.pdf".to_owned(),
            content_type: "application/pdf".to_owned(),
            comment: None,
        }));
    }

    #[test]
    fn test_local_links_rewritten_on_update() {
        let mock = MockConfluence::new().with_page("User Guide", "4242", 3);
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.markdown_source = Some("bitbucket".to_owned());

        let body = r##"<h2>Setup</h2><p><a href="#markdown-header-setup">setup</a></p>"##;
        PagePublisher::new(&mock, &config).publish("User Guide", body).unwrap();

        let calls = mock.calls();
        let Call::UpdatePage { body, .. } = updates(&calls)[0] else {
            unreachable!()
        };
        assert!(body.contains(
            r#"href="https://acme.atlassian.net/wiki/spaces/DOC/pages/4242/User+Guide#UserGuide-Setup""#
        ));
    }

    #[test]
    fn test_unresolved_link_fails_before_update() {
        let mock = MockConfluence::new().with_page("Guide", "9", 1);
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.markdown_source = Some("bitbucket".to_owned());

        let body = r##"<h2>A</h2><p><a href="#markdown-header-b">b</a></p>"##;
        let err = PagePublisher::new(&mock, &config).publish("Guide", body).unwrap_err();

        assert!(matches!(
            err,
            PublishError::Convert(ConvertError::UnresolvedReference { .. })
        ));
        assert!(updates(&mock.calls()).is_empty());
    }

    #[test]
    fn test_ancestor_resolved() {
        let mock = MockConfluence::new().with_page("Parent", "77", 1);
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.ancestor = Some("Parent".to_owned());
        config.editor_version = md2wiki_convert::EditorVersion::V2;

        PagePublisher::new(&mock, &config).publish("Child", "<p>x</p>").unwrap();

        assert!(mock.calls().contains(&Call::CreatePage {
            title: "Child".to_owned(),
            body: "<p>x</p>".to_owned(),
            ancestors: vec!["77".to_owned()],
            editor_version: "v2".to_owned(),
        }));
    }

    #[test]
    fn test_missing_ancestor_is_fatal() {
        let mock = MockConfluence::new();
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.ancestor = Some("Nowhere".to_owned());

        let err = PagePublisher::new(&mock, &config).publish("Child", "<p>x</p>").unwrap_err();

        assert!(matches!(err, PublishError::AncestorNotFound(ref t) if t == "Nowhere"));
        assert!(!mock.calls().iter().any(|call| matches!(call, Call::CreatePage { .. })));
    }

    #[test]
    fn test_delete_existing() {
        let mock = MockConfluence::new().with_page("Guide", "9", 1);
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.delete = true;

        let outcome = PagePublisher::new(&mock, &config).publish("Guide", "<p>x</p>").unwrap();

        assert_eq!(
            outcome,
            PublishOutcome::Deleted {
                page_id: "9".to_owned()
            }
        );
        assert_eq!(
            mock.calls()[1],
            Call::DeletePage {
                page_id: "9".to_owned()
            }
        );
    }

    #[test]
    fn test_delete_absent_is_noop() {
        let mock = MockConfluence::new();
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.delete = true;

        let outcome = PagePublisher::new(&mock, &config).publish("Guide", "<p>x</p>").unwrap();

        assert_eq!(outcome, PublishOutcome::NothingToDelete);
        assert_eq!(mock.calls().len(), 1);
    }

    #[test]
    fn test_update_failure_skips_properties() {
        let mock = MockConfluence::new().with_page("Guide", "9", 1).failing_updates();
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.properties = vec![("owner".to_owned(), "a".to_owned())];

        let err = PagePublisher::new(&mock, &config).publish("Guide", "<p>x</p>").unwrap_err();

        assert!(matches!(err, PublishError::Confluence(_)));
        assert!(!mock.calls().iter().any(|call| matches!(call, Call::UpdateProperty { .. })));
    }
}
