use chrono::Utc;
use shared_types::{EntityKind, Fields};
use uuid::Uuid;

use super::{ClaimRepo, DocumentRow, EntityRow};

/// Entities of `kind` owned by `parent_id`, in creation order.
pub fn list_by_parent(repo: &ClaimRepo, kind: EntityKind, parent_id: &str) -> Vec<EntityRow> {
    repo.read()
        .iter()
        .filter(|r| r.kind == kind && r.parent_id == parent_id)
        .cloned()
        .collect()
}

pub fn find_by_id(repo: &ClaimRepo, kind: EntityKind, id: Uuid) -> Option<EntityRow> {
    repo.read()
        .iter()
        .find(|r| r.kind == kind && r.id == id)
        .cloned()
}

/// Insert a new entity together with its already-stored documents.
pub fn create(
    repo: &ClaimRepo,
    id: Uuid,
    kind: EntityKind,
    parent_id: &str,
    fields: Fields,
    documents: Vec<DocumentRow>,
) -> EntityRow {
    let now = Utc::now();
    let row = EntityRow {
        id,
        kind,
        parent_id: parent_id.to_string(),
        fields,
        documents,
        created_at: now,
        updated_at: now,
    };
    repo.write().push(row.clone());
    row
}

/// Replace an entity's fields and append `documents`.
///
/// For single-document kinds the appended document replaces the existing
/// one. Returns the updated row and the rows it displaced (whose stored
/// objects the caller should delete), or `None` if the entity is gone.
pub fn update(
    repo: &ClaimRepo,
    kind: EntityKind,
    id: Uuid,
    fields: Fields,
    documents: Vec<DocumentRow>,
) -> Option<(EntityRow, Vec<DocumentRow>)> {
    let mut rows = repo.write();
    let row = rows.iter_mut().find(|r| r.kind == kind && r.id == id)?;
    row.fields = fields;
    let mut displaced = Vec::new();
    if kind.schema().single_document && !documents.is_empty() {
        displaced = std::mem::take(&mut row.documents);
    }
    row.documents.extend(documents);
    row.updated_at = Utc::now();
    Some((row.clone(), displaced))
}

/// Remove an entity and return it, documents included.
pub fn delete(repo: &ClaimRepo, kind: EntityKind, id: Uuid) -> Option<EntityRow> {
    let mut rows = repo.write();
    let pos = rows.iter().position(|r| r.kind == kind && r.id == id)?;
    Some(rows.remove(pos))
}
