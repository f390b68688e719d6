//! Backend access for claim entities and their documents.
//!
//! `ClaimsApi` is the seam between the headless state machines and the REST
//! backend. `HttpClaimsApi` speaks the `/api/{kind}` contract over reqwest;
//! tests substitute an in-memory fake.

use reqwest::multipart::{Form, Part};
use shared_types::{AppError, ClientSettings, DocumentRef, Entity, EntityKind, EntityRecord, Fields};
use std::time::Duration;

use crate::platform::Blob;

/// One file sent with a create or update request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Entity fields plus the files staged for one create or update call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Submission {
    pub parent_id: String,
    pub fields: Fields,
    /// In staging order.
    pub files: Vec<UploadFile>,
    /// Batch description shared by every file.
    pub description: Option<String>,
}

/// A document body fetched for preview or download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFile {
    /// Original file name to save under.
    pub file_name: String,
    pub blob: Blob,
}

#[allow(async_fn_in_trait)]
pub trait ClaimsApi {
    async fn list(&self, kind: EntityKind, parent_id: &str) -> Result<Vec<Entity>, AppError>;

    async fn create(&self, kind: EntityKind, submission: &Submission) -> Result<Entity, AppError>;

    async fn update(&self, kind: EntityKind, id: &str, submission: &Submission) -> Result<Entity, AppError>;

    async fn remove(&self, kind: EntityKind, id: &str) -> Result<(), AppError>;

    async fn remove_document(
        &self,
        kind: EntityKind,
        entity_id: &str,
        document: &DocumentRef,
    ) -> Result<(), AppError>;

    async fn fetch_preview(
        &self,
        kind: EntityKind,
        entity_id: &str,
        document: &DocumentRef,
    ) -> Result<FetchedFile, AppError>;

    async fn fetch_download(
        &self,
        kind: EntityKind,
        entity_id: &str,
        document: &DocumentRef,
    ) -> Result<FetchedFile, AppError>;

    /// Server-rendered view of a document, for types with no local preview.
    fn viewer_url(&self, kind: EntityKind, entity_id: &str, document: &DocumentRef) -> String;
}

/// `ClaimsApi` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpClaimsApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpClaimsApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn document_path(kind: EntityKind, entity_id: &str, document: &DocumentRef, action: &str) -> String {
        let entity = urlencoding::encode(entity_id);
        if document.legacy {
            format!("/{}/{}/{}", kind.path_segment(), entity, action)
        } else {
            format!(
                "/{}/{}/documents/{}/{}",
                kind.path_segment(),
                entity,
                urlencoding::encode(&document.id),
                action
            )
        }
    }

    async fn fetch_file(&self, path: &str, document: &DocumentRef) -> Result<FetchedFile, AppError> {
        let response = self.client.get(self.url(path)).send().await.map_err(transport)?;
        let response = check(response).await?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or_else(|| document.content_type.clone())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let header_name = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(disposition_file_name);
        let file_name = if !document.original_file_name.is_empty() {
            document.original_file_name.clone()
        } else {
            header_name.unwrap_or_else(|| document.file_name.clone())
        };

        let bytes = response.bytes().await.map_err(transport)?;
        Ok(FetchedFile {
            file_name,
            blob: Blob {
                bytes: bytes.to_vec(),
                content_type,
            },
        })
    }
}

fn transport(e: reqwest::Error) -> AppError {
    AppError::network(format!("Request failed: {e}"))
}

/// Pass 2xx responses through; turn anything else into the backend's error.
async fn check(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AppError::from_body(&body).unwrap_or_else(|| {
        AppError::from_status(status.as_u16(), format!("Request failed with status {status}"))
    }))
}

async fn read_entity(response: reqwest::Response) -> Result<Entity, AppError> {
    let record: EntityRecord = check(response)
        .await?
        .json()
        .await
        .map_err(|e| AppError::network(format!("Unreadable entity response: {e}")))?;
    Ok(Entity::from(record))
}

/// Build the multipart body: a `fields` JSON part, an optional
/// `description` part and one `files` part per upload.
fn upload_form(submission: &Submission, parent_id: Option<&str>) -> Result<Form, AppError> {
    let mut fields = submission.fields.clone();
    if let Some(parent_id) = parent_id {
        fields.insert("parentId".to_string(), parent_id.into());
    }
    let json = serde_json::to_string(&fields)
        .map_err(|e| AppError::internal(format!("Failed to encode fields: {e}")))?;

    let fields_part = Part::text(json)
        .mime_str("application/json")
        .map_err(|e| AppError::internal(e.to_string()))?;
    let mut form = Form::new().part("fields", fields_part);

    if let Some(description) = submission.description.as_deref().filter(|d| !d.trim().is_empty()) {
        form = form.text("description", description.to_string());
    }
    for file in &submission.files {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| AppError::bad_request(format!("Invalid content type for {}: {e}", file.name)))?;
        form = form.part("files", part);
    }
    Ok(form)
}

/// File name from a `Content-Disposition` value, preferring `filename*`.
pub fn disposition_file_name(header: &str) -> Option<String> {
    let mut plain = None;
    for param in header.split(';').map(str::trim) {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => {
                let value = value.trim().trim_matches('"');
                let encoded = value.split_once("''").map(|(_, rest)| rest).unwrap_or(value);
                if let Ok(name) = urlencoding::decode(encoded) {
                    return Some(name.into_owned());
                }
            }
            "filename" => plain = Some(value.trim().trim_matches('"').to_string()),
            _ => {}
        }
    }
    plain.filter(|n| !n.is_empty())
}

impl ClaimsApi for HttpClaimsApi {
    async fn list(&self, kind: EntityKind, parent_id: &str) -> Result<Vec<Entity>, AppError> {
        let response = self
            .client
            .get(self.url(&format!("/{}", kind.path_segment())))
            .query(&[("parentId", parent_id)])
            .send()
            .await
            .map_err(transport)?;
        let records: Vec<EntityRecord> = check(response)
            .await?
            .json()
            .await
            .map_err(|e| AppError::network(format!("Unreadable list response: {e}")))?;
        Ok(records.into_iter().map(Entity::from).collect())
    }

    async fn create(&self, kind: EntityKind, submission: &Submission) -> Result<Entity, AppError> {
        let form = upload_form(submission, Some(&submission.parent_id))?;
        let response = self
            .client
            .post(self.url(&format!("/{}", kind.path_segment())))
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;
        read_entity(response).await
    }

    async fn update(&self, kind: EntityKind, id: &str, submission: &Submission) -> Result<Entity, AppError> {
        let form = upload_form(submission, None)?;
        let response = self
            .client
            .put(self.url(&format!("/{}/{}", kind.path_segment(), urlencoding::encode(id))))
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;
        read_entity(response).await
    }

    async fn remove(&self, kind: EntityKind, id: &str) -> Result<(), AppError> {
        let response = self
            .client
            .delete(self.url(&format!("/{}/{}", kind.path_segment(), urlencoding::encode(id))))
            .send()
            .await
            .map_err(transport)?;
        check(response).await?;
        Ok(())
    }

    async fn remove_document(
        &self,
        kind: EntityKind,
        entity_id: &str,
        document: &DocumentRef,
    ) -> Result<(), AppError> {
        let path = if document.legacy {
            format!("/{}/{}/document", kind.path_segment(), urlencoding::encode(entity_id))
        } else {
            format!(
                "/{}/{}/documents/{}",
                kind.path_segment(),
                urlencoding::encode(entity_id),
                urlencoding::encode(&document.id)
            )
        };
        let response = self.client.delete(self.url(&path)).send().await.map_err(transport)?;
        check(response).await?;
        Ok(())
    }

    async fn fetch_preview(
        &self,
        kind: EntityKind,
        entity_id: &str,
        document: &DocumentRef,
    ) -> Result<FetchedFile, AppError> {
        let path = Self::document_path(kind, entity_id, document, "preview");
        self.fetch_file(&path, document).await
    }

    async fn fetch_download(
        &self,
        kind: EntityKind,
        entity_id: &str,
        document: &DocumentRef,
    ) -> Result<FetchedFile, AppError> {
        let path = Self::document_path(kind, entity_id, document, "download");
        self.fetch_file(&path, document).await
    }

    fn viewer_url(&self, kind: EntityKind, entity_id: &str, document: &DocumentRef) -> String {
        self.url(&Self::document_path(kind, entity_id, document, "preview"))
    }
}
