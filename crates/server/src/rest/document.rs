use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
};
use shared_types::{AppError, EntityKind};
use uuid::Uuid;

use crate::db::AppState;
use crate::repo::{self, DocumentRow};
use crate::rest::upload::discard_objects;
use crate::rest::{parse_kind, parse_uuid};
use crate::storage::ObjectStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    Inline,
    Attachment,
}

/// `Content-Disposition` value carrying the original file name.
///
/// The quoted `filename` is an ASCII fallback; `filename*` carries the exact
/// UTF-8 name for clients that understand RFC 5987.
pub fn content_disposition(inline: bool, file_name: &str) -> String {
    let disposition = if inline { "inline" } else { "attachment" };
    let fallback: String = file_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();
    format!(
        "{disposition}; filename=\"{fallback}\"; filename*=UTF-8''{}",
        urlencoding::encode(file_name)
    )
}

async fn serve(
    state: &AppState,
    doc: &DocumentRow,
    disposition: Disposition,
) -> Result<impl IntoResponse, AppError> {
    let bytes = state.storage.get(&doc.storage_key).await.map_err(|e| {
        if e.starts_with("NotFound") {
            AppError::not_found(format!("File {} is missing from storage", doc.original_file_name))
        } else {
            AppError::internal(format!("Failed to read file: {e}"))
        }
    })?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, doc.content_type.clone()),
            (
                header::CONTENT_DISPOSITION,
                content_disposition(disposition == Disposition::Inline, &doc.original_file_name),
            ),
        ],
        bytes,
    ))
}

fn find_document(
    state: &AppState,
    kind: EntityKind,
    entity_id: &str,
    document_id: &str,
) -> Result<DocumentRow, AppError> {
    let id = parse_uuid(entity_id, "id")?;
    let doc_id = parse_uuid(document_id, "document_id")?;
    repo::document::find(&state.repo, kind, id, doc_id)
        .ok_or_else(|| AppError::not_found(format!("Document {document_id} not found")))
}

fn legacy_kind(kind: &str) -> Result<EntityKind, AppError> {
    let kind = parse_kind(kind)?;
    if !kind.uses_legacy_document() {
        return Err(AppError::not_found(format!(
            "{} entities have no single-document endpoint",
            kind.path_segment()
        )));
    }
    Ok(kind)
}

fn find_single(state: &AppState, kind: EntityKind, entity_id: &str) -> Result<DocumentRow, AppError> {
    let id = parse_uuid(entity_id, "id")?;
    repo::document::find_single(&state.repo, kind, id)
        .ok_or_else(|| AppError::not_found(format!("{} {entity_id} has no document", kind.label())))
}

// ---------------------------------------------------------------------------
// Multi-document kinds
// ---------------------------------------------------------------------------

/// GET /api/{kind}/{id}/documents/{document_id}/preview
#[tracing::instrument(skip(state))]
pub async fn preview_document(
    State(state): State<AppState>,
    Path((kind, id, document_id)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let kind = parse_kind(&kind)?;
    let doc = find_document(&state, kind, &id, &document_id)?;
    serve(&state, &doc, Disposition::Inline).await
}

/// GET /api/{kind}/{id}/documents/{document_id}/download
#[tracing::instrument(skip(state))]
pub async fn download_document(
    State(state): State<AppState>,
    Path((kind, id, document_id)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let kind = parse_kind(&kind)?;
    let doc = find_document(&state, kind, &id, &document_id)?;
    serve(&state, &doc, Disposition::Attachment).await
}

/// DELETE /api/{kind}/{id}/documents/{document_id}
///
/// Detach one document. Sibling documents keep their order.
#[tracing::instrument(skip(state))]
pub async fn delete_document(
    State(state): State<AppState>,
    Path((kind, id, document_id)): Path<(String, String, String)>,
) -> Result<StatusCode, AppError> {
    let kind = parse_kind(&kind)?;
    let entity_id = parse_uuid(&id, "id")?;
    let doc_id = parse_uuid(&document_id, "document_id")?;

    let removed = repo::document::delete(&state.repo, kind, entity_id, doc_id)
        .ok_or_else(|| AppError::not_found(format!("Document {document_id} not found")))?;
    discard_objects(&state, std::slice::from_ref(&removed)).await;

    tracing::info!(%kind, %entity_id, document_id = %removed.id, "Document deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/documents/{document_id}
///
/// Detach a document without naming its owner.
#[tracing::instrument(skip(state))]
pub async fn delete_document_by_id(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let doc_id = parse_uuid(&document_id, "document_id")?;
    let removed = repo::document::delete_any(&state.repo, doc_id)
        .ok_or_else(|| AppError::not_found(format!("Document {document_id} not found")))?;
    discard_objects(&state, std::slice::from_ref(&removed)).await;

    tracing::info!(document_id = %removed.id, "Document deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Single-document (legacy) kinds
// ---------------------------------------------------------------------------

/// GET /api/{kind}/{id}/preview
#[tracing::instrument(skip(state))]
pub async fn preview_single(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let kind = legacy_kind(&kind)?;
    let doc = find_single(&state, kind, &id)?;
    serve(&state, &doc, Disposition::Inline).await
}

/// GET /api/{kind}/{id}/download
#[tracing::instrument(skip(state))]
pub async fn download_single(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let kind = legacy_kind(&kind)?;
    let doc = find_single(&state, kind, &id)?;
    serve(&state, &doc, Disposition::Attachment).await
}

/// DELETE /api/{kind}/{id}/document
#[tracing::instrument(skip(state))]
pub async fn delete_single(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let kind = legacy_kind(&kind)?;
    let entity_id = parse_uuid(&id, "id")?;
    let removed = repo::document::delete_single(&state.repo, kind, entity_id)
        .ok_or_else(|| AppError::not_found(format!("{} {id} has no document", kind.label())))?;
    discard_objects(&state, &removed).await;

    tracing::info!(%kind, %entity_id, "Document deleted");
    Ok(StatusCode::NO_CONTENT)
}
