//! One entity section of a claim screen: list, draft form and viewer for a
//! single kind under a single parent claim.

use chrono::NaiveDate;
use shared_types::{CurrencyTotals, EntityKind, PolicyConfig};
use std::rc::Rc;

use crate::api::ClaimsApi;
use crate::draft::{DraftForm, FormMode};
use crate::format_helpers::format_totals;
use crate::notify::{NotificationKind, Notifier};
use crate::platform::BlobHost;
use crate::store::{EntityStore, PendingRemoval, RemovalConfirmed};
use crate::viewer::{DocumentViewer, ViewerItem};

/// Capabilities shared by every section of a screen.
pub struct SectionContext<A> {
    pub api: Rc<A>,
    pub host: Rc<dyn BlobHost>,
    pub notifier: Rc<dyn Notifier>,
    pub policy: PolicyConfig,
}

impl<A> Clone for SectionContext<A> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            host: self.host.clone(),
            notifier: self.notifier.clone(),
            policy: self.policy.clone(),
        }
    }
}

pub struct ClaimSection<A: ClaimsApi> {
    kind: EntityKind,
    parent_id: String,
    notifier: Rc<dyn Notifier>,
    store: EntityStore<A>,
    draft: DraftForm,
    viewer: DocumentViewer<A>,
}

impl<A: ClaimsApi> ClaimSection<A> {
    pub fn new(ctx: &SectionContext<A>, kind: EntityKind, parent_id: impl Into<String>) -> Self {
        Self {
            kind,
            parent_id: parent_id.into(),
            notifier: ctx.notifier.clone(),
            store: EntityStore::new(
                kind,
                ctx.api.clone(),
                ctx.notifier.clone(),
                ctx.policy.default_currency.clone(),
            ),
            draft: DraftForm::new(kind, ctx.host.clone(), ctx.notifier.clone()),
            viewer: DocumentViewer::new(kind, ctx.api.clone(), ctx.host.clone(), ctx.notifier.clone()),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn parent_id(&self) -> &str {
        &self.parent_id
    }

    pub fn store(&self) -> &EntityStore<A> {
        &self.store
    }

    pub fn draft(&self) -> &DraftForm {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut DraftForm {
        &mut self.draft
    }

    pub fn viewer(&self) -> &DocumentViewer<A> {
        &self.viewer
    }

    pub fn viewer_mut(&mut self) -> &mut DocumentViewer<A> {
        &mut self.viewer
    }

    pub async fn refresh(&mut self) -> bool {
        self.store.load(&self.parent_id).await
    }

    fn warn(&self, message: &str) {
        self.notifier.notify(NotificationKind::Warning, message);
    }

    /// Staged previews never outlive the staging list they were opened from.
    fn close_staged_preview(&mut self) {
        if self.viewer.shows_staged() {
            self.viewer.close();
        }
    }

    pub fn open_create(&mut self, today: NaiveDate) -> bool {
        match self.draft.open_create(today) {
            Ok(()) => {
                self.close_staged_preview();
                true
            }
            Err(e) => {
                self.warn(&e.message);
                false
            }
        }
    }

    pub fn open_edit(&mut self, id: &str) -> bool {
        let Some(entity) = self.store.get(id) else {
            self.warn(&format!("{} {id} is no longer available", self.kind.label()));
            return false;
        };
        match self.draft.open_edit(entity) {
            Ok(()) => {
                self.close_staged_preview();
                true
            }
            Err(e) => {
                self.warn(&e.message);
                false
            }
        }
    }

    pub fn cancel(&mut self) -> bool {
        match self.draft.cancel() {
            Ok(()) => {
                self.close_staged_preview();
                true
            }
            Err(e) => {
                self.warn(&e.message);
                false
            }
        }
    }

    /// Validate, send and settle the open draft.
    ///
    /// A validation failure sends nothing. A backend failure keeps the
    /// draft and its staged files for a retry.
    pub async fn submit(&mut self) -> bool {
        let submission = match self.draft.begin_submit(&self.parent_id) {
            Ok(submission) => submission,
            Err(e) => {
                let message = if e.is_validation() {
                    "Please correct the highlighted fields".to_string()
                } else {
                    e.message
                };
                self.warn(&message);
                return false;
            }
        };

        let saved = match self.draft.mode() {
            Some(FormMode::Edit { id }) => self.store.update(&id, &submission).await,
            _ => self.store.create(&submission).await,
        };
        let success = saved.is_some();
        self.draft.finish_submit(success);
        if success {
            self.close_staged_preview();
        }
        success
    }

    /// Drop one staged file. A staged preview is closed with it.
    pub fn remove_staged(&mut self, index: usize) -> bool {
        let Some(staging) = self.draft.staging_mut() else {
            return false;
        };
        if staging.remove(index).is_none() {
            return false;
        }
        self.close_staged_preview();
        true
    }

    pub fn request_remove(&self, id: &str) -> Option<PendingRemoval> {
        self.store.request_remove(id)
    }

    /// Delete a confirmed entity. An open draft or viewer for it is closed.
    pub async fn remove(&mut self, confirmed: RemovalConfirmed) -> bool {
        let id = confirmed.entity_id().to_string();
        if !self.store.remove(confirmed).await {
            return false;
        }
        if self.draft.editing_id() == Some(id.as_str()) && !self.draft.is_submitting() {
            let _ = self.draft.cancel();
        }
        if self.viewer.shows_entity(&id) {
            self.viewer.close();
        }
        true
    }

    pub async fn remove_document(&mut self, entity_id: &str, document_id: &str) -> bool {
        if !self.store.remove_document(entity_id, document_id).await {
            return false;
        }
        self.draft.refresh_persisted(self.store.get(entity_id));
        if self.viewer.shows_entity(entity_id) {
            self.viewer.close();
        }
        true
    }

    /// Open the viewer on a persisted document with its siblings.
    pub async fn preview_document(&mut self, entity_id: &str, document_id: &str) -> bool {
        let Some(entity) = self.store.get(entity_id) else {
            return false;
        };
        let Some(index) = entity.document_index(document_id) else {
            return false;
        };
        let items = entity
            .documents
            .iter()
            .map(|d| ViewerItem::Persisted {
                entity_id: entity.id.clone(),
                document: d.clone(),
            })
            .collect();
        self.viewer.open(items, index).await
    }

    /// Open the viewer on a staged file with the rest of the staging list.
    pub async fn preview_staged(&mut self, index: usize) -> bool {
        let items = self.draft.staging().viewer_items();
        self.viewer.open(items, index).await
    }

    pub async fn download_document(&self, entity_id: &str, document_id: &str) -> bool {
        let Some(document) = self.store.get(entity_id).and_then(|e| e.document(document_id)) else {
            return false;
        };
        let item = ViewerItem::Persisted {
            entity_id: entity_id.to_string(),
            document: document.clone(),
        };
        self.viewer.download(&item).await
    }

    pub fn totals(&self) -> CurrencyTotals {
        self.store.totals()
    }

    /// Totals line for the section footer.
    pub fn totals_summary(&self) -> String {
        format_totals(&self.totals())
    }
}
