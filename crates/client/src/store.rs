//! The list of persisted entities of one kind under one parent claim.
//!
//! Every mutation ends with a full reload; the list is never patched locally.
//! Backend failures are downgraded to a notification and a `false`/`None`
//! return so the caller stays interactive.

use shared_types::{
    entity_totals, totals_by_currency, AppError, CurrencyTotals, Entity, EntityKind,
};
use std::rc::Rc;

use crate::api::{ClaimsApi, Submission};
use crate::notify::{NotificationKind, Notifier};

/// A removal the user has been asked to confirm.
#[derive(Debug)]
#[must_use = "a removal only happens after confirm()"]
pub struct PendingRemoval {
    kind: EntityKind,
    entity_id: String,
    document_count: usize,
}

impl PendingRemoval {
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// Text for the confirmation dialog.
    pub fn prompt(&self) -> String {
        match self.document_count {
            0 => format!("Delete this {}?", self.kind.label().to_lowercase()),
            n => format!(
                "Delete this {} and its {n} document(s)? This cannot be undone.",
                self.kind.label().to_lowercase()
            ),
        }
    }

    pub fn confirm(self) -> RemovalConfirmed {
        RemovalConfirmed {
            entity_id: self.entity_id,
        }
    }
}

/// Proof that the user confirmed a removal. Only [`PendingRemoval::confirm`]
/// creates one.
#[derive(Debug)]
pub struct RemovalConfirmed {
    entity_id: String,
}

impl RemovalConfirmed {
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }
}

pub struct EntityStore<A: ClaimsApi> {
    kind: EntityKind,
    api: Rc<A>,
    notifier: Rc<dyn Notifier>,
    default_currency: String,
    parent_id: Option<String>,
    entities: Vec<Entity>,
    loading: bool,
    error: Option<AppError>,
}

impl<A: ClaimsApi> EntityStore<A> {
    pub fn new(
        kind: EntityKind,
        api: Rc<A>,
        notifier: Rc<dyn Notifier>,
        default_currency: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            api,
            notifier,
            default_currency: default_currency.into(),
            parent_id: None,
            entities: Vec::new(),
            loading: false,
            error: None,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Error of the last failed load, cleared by the next successful one.
    pub fn error(&self) -> Option<&AppError> {
        self.error.as_ref()
    }

    fn report(&self, action: &str, error: &AppError) {
        tracing::warn!(
            kind = %self.kind,
            parent_id = self.parent_id.as_deref().unwrap_or_default(),
            "Failed to {action}: {error}"
        );
        self.notifier.notify(
            NotificationKind::Error,
            &format!("Failed to {action}: {}", error.message),
        );
    }

    /// Fetch the list for `parent_id`, replacing the current one on success.
    pub async fn load(&mut self, parent_id: &str) -> bool {
        self.parent_id = Some(parent_id.to_string());
        self.loading = true;
        let result = self.api.list(self.kind, parent_id).await;
        self.loading = false;

        match result {
            Ok(entities) => {
                tracing::debug!(kind = %self.kind, parent_id, count = entities.len(), "Entities loaded");
                self.entities = entities;
                self.error = None;
                true
            }
            Err(e) => {
                self.report(&format!("load {}", self.kind.path_segment()), &e);
                self.error = Some(e);
                false
            }
        }
    }

    /// Reload the current parent. No-op before the first `load`.
    pub async fn reload(&mut self) -> bool {
        match self.parent_id.clone() {
            Some(parent_id) => self.load(&parent_id).await,
            None => false,
        }
    }

    /// Created entity as listed after the reload.
    pub async fn create(&mut self, submission: &Submission) -> Option<Entity> {
        let label = self.kind.label().to_lowercase();
        match self.api.create(self.kind, submission).await {
            Ok(created) => {
                tracing::debug!(kind = %self.kind, entity_id = %created.id, files = submission.files.len(), "Entity created");
                self.notifier
                    .notify(NotificationKind::Success, &format!("Saved new {label}"));
                self.load(&submission.parent_id).await;
                Some(self.get(&created.id).cloned().unwrap_or(created))
            }
            Err(e) => {
                self.report(&format!("save {label}"), &e);
                None
            }
        }
    }

    /// New files are appended to the entity's documents.
    pub async fn update(&mut self, id: &str, submission: &Submission) -> Option<Entity> {
        let label = self.kind.label().to_lowercase();
        match self.api.update(self.kind, id, submission).await {
            Ok(updated) => {
                tracing::debug!(kind = %self.kind, entity_id = id, files = submission.files.len(), "Entity updated");
                self.notifier
                    .notify(NotificationKind::Success, &format!("Saved {label}"));
                self.load(&submission.parent_id).await;
                Some(self.get(id).cloned().unwrap_or(updated))
            }
            Err(e) => {
                self.report(&format!("save {label}"), &e);
                None
            }
        }
    }

    /// First half of a removal. `None` if `id` is not in the list.
    pub fn request_remove(&self, id: &str) -> Option<PendingRemoval> {
        let entity = self.get(id)?;
        Some(PendingRemoval {
            kind: self.kind,
            entity_id: entity.id.clone(),
            document_count: entity.documents.len(),
        })
    }

    /// Delete a confirmed entity with all its documents, then reload.
    pub async fn remove(&mut self, confirmed: RemovalConfirmed) -> bool {
        let label = self.kind.label().to_lowercase();
        match self.api.remove(self.kind, &confirmed.entity_id).await {
            Ok(()) => {
                tracing::debug!(kind = %self.kind, entity_id = %confirmed.entity_id, "Entity removed");
                self.notifier
                    .notify(NotificationKind::Success, &format!("Deleted {label}"));
                self.reload().await;
                true
            }
            Err(e) => {
                self.report(&format!("delete {label}"), &e);
                false
            }
        }
    }

    /// Delete one document, leaving its siblings and entity in place.
    pub async fn remove_document(&mut self, entity_id: &str, document_id: &str) -> bool {
        let Some(document) = self.get(entity_id).and_then(|e| e.document(document_id)).cloned() else {
            self.report(
                "delete document",
                &AppError::not_found(format!("Document {document_id} not found")),
            );
            return false;
        };

        match self.api.remove_document(self.kind, entity_id, &document).await {
            Ok(()) => {
                tracing::debug!(kind = %self.kind, entity_id, document_id, "Document removed");
                self.notifier.notify(
                    NotificationKind::Success,
                    &format!("Deleted {}", document.display_name()),
                );
                self.reload().await;
                true
            }
            Err(e) => {
                self.report(&format!("delete {}", document.display_name()), &e);
                false
            }
        }
    }

    /// Per-currency totals over the current list.
    pub fn totals(&self) -> CurrencyTotals {
        totals_by_currency(&self.entities, self.kind.schema().amounts, &self.default_currency)
    }

    pub fn entity_totals(&self, id: &str) -> Option<CurrencyTotals> {
        self.get(id)
            .map(|e| entity_totals(e, self.kind.schema().amounts, &self.default_currency))
    }
}
