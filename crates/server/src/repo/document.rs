use shared_types::EntityKind;
use uuid::Uuid;

use super::{ClaimRepo, DocumentRow};

/// A document of a specific entity.
pub fn find(repo: &ClaimRepo, kind: EntityKind, entity_id: Uuid, document_id: Uuid) -> Option<DocumentRow> {
    repo.read()
        .iter()
        .find(|r| r.kind == kind && r.id == entity_id)?
        .documents
        .iter()
        .find(|d| d.id == document_id)
        .cloned()
}

/// The single document of a legacy entity.
pub fn find_single(repo: &ClaimRepo, kind: EntityKind, entity_id: Uuid) -> Option<DocumentRow> {
    repo.read()
        .iter()
        .find(|r| r.kind == kind && r.id == entity_id)?
        .documents
        .last()
        .cloned()
}

/// Detach one document from its entity, leaving siblings untouched.
pub fn delete(repo: &ClaimRepo, kind: EntityKind, entity_id: Uuid, document_id: Uuid) -> Option<DocumentRow> {
    let mut rows = repo.write();
    let row = rows.iter_mut().find(|r| r.kind == kind && r.id == entity_id)?;
    let pos = row.documents.iter().position(|d| d.id == document_id)?;
    Some(row.documents.remove(pos))
}

/// Detach a document by id alone, whichever entity owns it.
pub fn delete_any(repo: &ClaimRepo, document_id: Uuid) -> Option<DocumentRow> {
    let mut rows = repo.write();
    for row in rows.iter_mut() {
        if let Some(pos) = row.documents.iter().position(|d| d.id == document_id) {
            return Some(row.documents.remove(pos));
        }
    }
    None
}

/// Detach every document of a legacy entity.
pub fn delete_single(repo: &ClaimRepo, kind: EntityKind, entity_id: Uuid) -> Option<Vec<DocumentRow>> {
    let mut rows = repo.write();
    let row = rows.iter_mut().find(|r| r.kind == kind && r.id == entity_id)?;
    if row.documents.is_empty() {
        return None;
    }
    Some(std::mem::take(&mut row.documents))
}
