pub mod document;
pub mod entity;
pub mod upload;

use axum::{routing::{delete, get, put}, Router};
use shared_types::{AppError, EntityKind};
use uuid::Uuid;

use crate::db::AppState;

/// Resolve the `{kind}` path segment. Unknown kinds are 404, not 400.
pub(crate) fn parse_kind(segment: &str) -> Result<EntityKind, AppError> {
    EntityKind::from_path_segment(segment)
        .ok_or_else(|| AppError::not_found(format!("Unknown entity kind: {segment}")))
}

pub(crate) fn parse_uuid(value: &str, name: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(value).map_err(|_| AppError::bad_request(format!("Invalid {name} UUID format")))
}

/// Build the claim-entity REST router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        // Documents addressed by id alone
        .route("/api/documents/{document_id}", delete(document::delete_document_by_id))
        // Entity CRUD
        .route("/api/{kind}", get(entity::list_entities).post(entity::create_entity))
        .route("/api/{kind}/{id}", put(entity::update_entity).delete(entity::delete_entity))
        // Single-document kinds
        .route("/api/{kind}/{id}/preview", get(document::preview_single))
        .route("/api/{kind}/{id}/download", get(document::download_single))
        .route("/api/{kind}/{id}/document", delete(document::delete_single))
        // Multi-document kinds
        .route("/api/{kind}/{id}/documents/{document_id}", delete(document::delete_document))
        .route("/api/{kind}/{id}/documents/{document_id}/preview", get(document::preview_document))
        .route("/api/{kind}/{id}/documents/{document_id}/download", get(document::download_document))
}
