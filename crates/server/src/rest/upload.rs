use axum::extract::Multipart;
use axum::http::StatusCode;
use chrono::Utc;
use sha2::{Digest, Sha256};
use shared_types::{content_type_for, file_extension, AppError, EntityKind, Fields};
use uuid::Uuid;

use crate::repo::DocumentRow;
use crate::storage::ObjectStore;
use crate::db::AppState;

/// One file part of an upload request.
#[derive(Debug, Clone)]
pub struct IncomingUpload {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Parsed `multipart/form-data` body of a create/update request.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: Option<Fields>,
    pub description: Option<String>,
    /// In part order.
    pub files: Vec<IncomingUpload>,
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::payload_too_large("Upload exceeds the maximum allowed size")
    } else {
        AppError::bad_request(format!("Malformed multipart body: {}", e.body_text()))
    }
}

/// Read the `fields`, `description` and file parts of an upload request.
pub async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let part_name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);

        match (part_name.as_str(), file_name) {
            ("fields", None) => {
                let text = field.text().await.map_err(multipart_error)?;
                let value: serde_json::Value = serde_json::from_str(&text)
                    .map_err(|e| AppError::bad_request(format!("fields is not valid JSON: {e}")))?;
                match value {
                    serde_json::Value::Object(map) => form.fields = Some(map),
                    _ => return Err(AppError::bad_request("fields must be a JSON object")),
                }
            }
            ("description", None) => {
                let text = field.text().await.map_err(multipart_error)?;
                let text = text.trim();
                if !text.is_empty() {
                    form.description = Some(text.to_string());
                }
            }
            (_, Some(name)) => {
                let bytes = field.bytes().await.map_err(multipart_error)?;
                // Browsers send an empty nameless part when no file was picked.
                if name.trim().is_empty() && bytes.is_empty() {
                    continue;
                }
                if name.trim().is_empty() {
                    return Err(AppError::bad_request("Uploaded file has no name"));
                }
                form.files.push(IncomingUpload {
                    name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            (other, None) => {
                tracing::debug!(part = other, "Ignoring unknown multipart part");
            }
        }
    }

    Ok(form)
}

/// Storage key for a document: `<kind>/<entity>/<document>[.ext]`.
pub fn storage_key(kind: EntityKind, entity_id: Uuid, file_name: &str) -> String {
    format!("{}/{}/{}", kind.path_segment(), entity_id, file_name)
}

/// Write every upload to object storage and build its row.
///
/// Either all uploads are stored or none: on failure the objects written so
/// far are deleted again before the error is returned.
pub async fn store_uploads(
    state: &AppState,
    kind: EntityKind,
    entity_id: Uuid,
    uploads: Vec<IncomingUpload>,
    description: Option<&str>,
) -> Result<Vec<DocumentRow>, AppError> {
    let mut rows: Vec<DocumentRow> = Vec::with_capacity(uploads.len());

    for upload in uploads {
        let id = Uuid::new_v4();
        let file_name = match file_extension(&upload.name) {
            Some(ext) => format!("{id}.{ext}"),
            None => id.to_string(),
        };
        let key = storage_key(kind, entity_id, &file_name);
        let content_type = upload
            .content_type
            .filter(|ct| !ct.is_empty() && ct != "application/octet-stream")
            .unwrap_or_else(|| content_type_for(&upload.name).to_string());
        let sha256 = hex::encode(Sha256::digest(&upload.bytes));
        let size = upload.bytes.len() as u64;

        if let Err(e) = state.storage.put(&key, upload.bytes).await {
            for stored in &rows {
                let _ = state.storage.delete(&stored.storage_key).await;
            }
            return Err(AppError::internal(format!("Failed to store {}: {e}", upload.name)));
        }

        rows.push(DocumentRow {
            id,
            storage_key: key,
            file_name,
            original_file_name: upload.name,
            content_type,
            size,
            sha256,
            description: description.map(str::to_string),
            uploaded_at: Utc::now(),
        });
    }

    Ok(rows)
}

/// Delete the stored objects behind `rows`, logging failures.
pub async fn discard_objects(state: &AppState, rows: &[DocumentRow]) {
    for row in rows {
        if let Err(e) = state.storage.delete(&row.storage_key).await {
            tracing::warn!(key = %row.storage_key, "Failed to delete stored object: {e}");
        }
    }
}
