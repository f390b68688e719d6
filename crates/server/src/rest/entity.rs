use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use shared_types::{AppError, EntityRecord};
use uuid::Uuid;

use crate::db::AppState;
use crate::repo::{self, sanitize_fields};
use crate::rest::upload::{discard_objects, read_upload_form, store_uploads};
use crate::rest::{parse_kind, parse_uuid};

/// Query string of the list endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub parent_id: Option<String>,
}

/// GET /api/{kind}?parentId=
///
/// Entities of one kind owned by one claim, in creation order.
#[tracing::instrument(skip(state))]
pub async fn list_entities(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<EntityRecord>>, AppError> {
    let kind = parse_kind(&kind)?;
    let parent_id = query
        .parent_id
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("parentId is required"))?;

    let today = Utc::now().date_naive();
    let records = repo::entity::list_by_parent(&state.repo, kind, &parent_id)
        .iter()
        .map(|row| row.to_record(&state.policy, today))
        .collect();

    Ok(Json(records))
}

/// POST /api/{kind}
///
/// Create an entity from a `fields` part plus zero or more `files` parts.
#[tracing::instrument(skip(state, multipart))]
pub async fn create_entity(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<EntityRecord>), AppError> {
    let kind = parse_kind(&kind)?;
    let form = read_upload_form(multipart).await?;
    let raw = form
        .fields
        .ok_or_else(|| AppError::bad_request("fields part is required"))?;

    let parent_id = raw
        .get("parentId")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::bad_request("fields.parentId is required"))?;

    let fields = sanitize_fields(raw);
    kind.schema().validate(&fields)?;

    if kind.schema().single_document && form.files.len() > 1 {
        return Err(AppError::bad_request(format!(
            "{} entities hold a single document",
            kind.path_segment()
        )));
    }

    let id = Uuid::new_v4();
    let documents = store_uploads(&state, kind, id, form.files, form.description.as_deref()).await?;
    let row = repo::entity::create(&state.repo, id, kind, &parent_id, fields, documents);

    tracing::info!(%kind, entity_id = %row.id, documents = row.documents.len(), "Entity created");
    let record = row.to_record(&state.policy, Utc::now().date_naive());
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /api/{kind}/{id}
///
/// Replace the entity's fields and append any uploaded files.
#[tracing::instrument(skip(state, multipart))]
pub async fn update_entity(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    multipart: Multipart,
) -> Result<Json<EntityRecord>, AppError> {
    let kind = parse_kind(&kind)?;
    let entity_id = parse_uuid(&id, "id")?;

    let existing = repo::entity::find_by_id(&state.repo, kind, entity_id)
        .ok_or_else(|| AppError::not_found(format!("{} {} not found", kind.label(), id)))?;

    let form = read_upload_form(multipart).await?;
    let fields = match form.fields {
        Some(raw) => sanitize_fields(raw),
        None => existing.fields.clone(),
    };
    kind.schema().validate(&fields)?;

    if kind.schema().single_document && form.files.len() > 1 {
        return Err(AppError::bad_request(format!(
            "{} entities hold a single document",
            kind.path_segment()
        )));
    }

    let documents =
        store_uploads(&state, kind, entity_id, form.files, form.description.as_deref()).await?;
    let added = documents.len();

    let Some((row, displaced)) =
        repo::entity::update(&state.repo, kind, entity_id, fields, documents.clone())
    else {
        // Deleted while the upload was in flight.
        discard_objects(&state, &documents).await;
        return Err(AppError::not_found(format!("{} {} not found", kind.label(), id)));
    };
    discard_objects(&state, &displaced).await;

    tracing::info!(%kind, entity_id = %row.id, added, "Entity updated");
    Ok(Json(row.to_record(&state.policy, Utc::now().date_naive())))
}

/// DELETE /api/{kind}/{id}
///
/// Delete the entity and every document it owns.
#[tracing::instrument(skip(state))]
pub async fn delete_entity(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let kind = parse_kind(&kind)?;
    let entity_id = parse_uuid(&id, "id")?;

    let row = repo::entity::delete(&state.repo, kind, entity_id)
        .ok_or_else(|| AppError::not_found(format!("{} {} not found", kind.label(), id)))?;
    discard_objects(&state, &row.documents).await;

    tracing::info!(%kind, entity_id = %row.id, documents = row.documents.len(), "Entity deleted");
    Ok(StatusCode::NO_CONTENT)
}
