use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// File classification
// ---------------------------------------------------------------------------

/// File-type tag derived from a filename extension.
///
/// Only used to decide how (and whether) a file can be previewed; it is never
/// stored apart from the name it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Image,
    Excel,
    Docx,
    Kmz,
    Other,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Image => "image",
            FileType::Excel => "excel",
            FileType::Docx => "docx",
            FileType::Kmz => "kmz",
            FileType::Other => "other",
        }
    }

    /// `Other` is download-only.
    pub fn is_previewable(&self) -> bool {
        !matches!(self, FileType::Other)
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowercase extension of `file_name`, without the dot.
///
/// A leading dot (`.env`) or a trailing one (`scan.`) does not count as an
/// extension.
pub fn file_extension(file_name: &str) -> Option<String> {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    match base.rfind('.') {
        Some(0) | None => None,
        Some(pos) if pos + 1 == base.len() => None,
        Some(pos) => Some(base[pos + 1..].to_ascii_lowercase()),
    }
}

/// Classify a file by its name.
pub fn get_file_type(file_name: &str) -> FileType {
    match file_extension(file_name).as_deref() {
        Some("pdf") => FileType::Pdf,
        Some("jpg" | "jpeg" | "png" | "gif" | "bmp") => FileType::Image,
        Some("xls" | "xlsx") => FileType::Excel,
        Some("doc" | "docx") => FileType::Docx,
        Some("kmz") => FileType::Kmz,
        _ => FileType::Other,
    }
}

/// Best-effort MIME type for a filename, used when the browser or the
/// clipboard did not supply one.
pub fn content_type_for(file_name: &str) -> &'static str {
    match file_extension(file_name).as_deref() {
        Some("pdf") => "application/pdf",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("xls") => "application/vnd.ms-excel",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("kmz") => "application/vnd.google-earth.kmz",
        Some("txt") => "text/plain",
        Some("msg") => "application/vnd.ms-outlook",
        Some("eml") => "message/rfc822",
        _ => "application/octet-stream",
    }
}

// ---------------------------------------------------------------------------
// DocumentRef
// ---------------------------------------------------------------------------

/// Metadata pointer to one server-stored file attached to an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRef {
    pub id: String,
    /// Server-side storage name.
    pub file_name: String,
    /// Name the user uploaded the file under. Used verbatim for labels and downloads.
    pub original_file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    /// Free-text description entered for the upload batch this file came in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<String>,
    /// Set when this ref was synthesized from a flat `documentPath`/`documentName`
    /// pair. Such documents are addressed through the entity, not by id.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub legacy: bool,
}

impl DocumentRef {
    /// Build the single document of a legacy entity.
    ///
    /// The entity id doubles as the document id since the backend exposes no
    /// separate identity for it.
    pub fn from_legacy(entity_id: &str, document_path: String, document_name: Option<String>) -> Self {
        let original_file_name = document_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| {
                document_path
                    .rsplit(['/', '\\'])
                    .next()
                    .unwrap_or(&document_path)
                    .to_string()
            });
        Self {
            id: entity_id.to_string(),
            file_name: document_path,
            original_file_name,
            content_type: None,
            size: None,
            sha256: None,
            description: None,
            uploaded_at: None,
            legacy: true,
        }
    }

    /// Name shown to the user and used when saving the file.
    pub fn display_name(&self) -> &str {
        if self.original_file_name.is_empty() {
            &self.file_name
        } else {
            &self.original_file_name
        }
    }

    pub fn file_type(&self) -> FileType {
        get_file_type(self.display_name())
    }
}
