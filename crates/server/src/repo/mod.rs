//! In-memory entity repository.
//!
//! Rows are kept in creation order; documents inside a row in upload order.

pub mod document;
pub mod entity;

use chrono::{DateTime, NaiveDate, Utc};
use shared_types::{DocumentRef, EntityKind, EntityRecord, Fields, PolicyConfig};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

/// Keys the backend owns; client-supplied values for them are dropped.
pub const RESERVED_FIELDS: &[&str] = &[
    "id",
    "parentId",
    "documents",
    "documentPath",
    "documentName",
    "alertDays",
    "alert",
];

#[derive(Debug, Clone)]
pub struct DocumentRow {
    pub id: Uuid,
    pub storage_key: String,
    pub file_name: String,
    pub original_file_name: String,
    pub content_type: String,
    pub size: u64,
    pub sha256: String,
    pub description: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<&DocumentRow> for DocumentRef {
    fn from(d: &DocumentRow) -> Self {
        Self {
            id: d.id.to_string(),
            file_name: d.file_name.clone(),
            original_file_name: d.original_file_name.clone(),
            content_type: Some(d.content_type.clone()),
            size: Some(d.size),
            sha256: Some(d.sha256.clone()),
            description: d.description.clone(),
            uploaded_at: Some(d.uploaded_at.to_rfc3339()),
            legacy: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EntityRow {
    pub id: Uuid,
    pub kind: EntityKind,
    pub parent_id: String,
    pub fields: Fields,
    pub documents: Vec<DocumentRow>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EntityRow {
    /// Wire shape for this row, with the alert counter computed for `today`.
    pub fn to_record(&self, policy: &PolicyConfig, today: NaiveDate) -> EntityRecord {
        let mut fields = self.fields.clone();
        if let Some(days) = self.kind.schema().alert_days(&self.fields, today) {
            fields.insert("alertDays".to_string(), days.into());
            fields.insert(
                "alert".to_string(),
                (days >= policy.alert_after_days).into(),
            );
        }

        if self.kind.uses_legacy_document() {
            let doc = self.documents.last();
            EntityRecord {
                id: self.id.to_string(),
                parent_id: self.parent_id.clone(),
                documents: None,
                document_path: doc.map(|d| d.storage_key.clone()),
                document_name: doc.map(|d| d.original_file_name.clone()),
                fields,
            }
        } else {
            EntityRecord {
                id: self.id.to_string(),
                parent_id: self.parent_id.clone(),
                documents: Some(self.documents.iter().map(DocumentRef::from).collect()),
                document_path: None,
                document_name: None,
                fields,
            }
        }
    }
}

/// Drop backend-owned keys from client-supplied fields.
pub fn sanitize_fields(mut fields: Fields) -> Fields {
    for key in RESERVED_FIELDS {
        fields.remove(*key);
    }
    fields
}

/// All entities of every kind, in creation order.
#[derive(Default)]
pub struct ClaimRepo {
    rows: RwLock<Vec<EntityRow>>,
}

impl ClaimRepo {
    pub fn new() -> Self {
        Self::default()
    }

    // Every write is a single push, remove or swap, so poisoned rows are intact.
    pub(crate) fn read(&self) -> RwLockReadGuard<'_, Vec<EntityRow>> {
        self.rows.read().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, Vec<EntityRow>> {
        self.rows.write().unwrap_or_else(|e| e.into_inner())
    }

    /// (entities, documents) currently stored.
    pub fn counts(&self) -> (usize, usize) {
        let rows = self.read();
        let documents = rows.iter().map(|r| r.documents.len()).sum();
        (rows.len(), documents)
    }
}
