use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::document::DocumentRef;

/// Free-form domain fields of an entity (dates, amounts, status, description).
pub type Fields = Map<String, Value>;

/// An entity as it travels over the wire.
///
/// Most kinds carry `documents[]`; legacy kinds carry a single flat
/// `documentPath`/`documentName` pair instead. Everything else lands in
/// `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
    pub id: String,
    pub parent_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents: Option<Vec<DocumentRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_name: Option<String>,
    #[serde(flatten)]
    pub fields: Fields,
}

/// A persisted entity with its documents normalized into one list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: String,
    pub parent_id: String,
    pub fields: Fields,
    /// Insertion order as returned by the backend.
    pub documents: Vec<DocumentRef>,
}

impl From<EntityRecord> for Entity {
    fn from(record: EntityRecord) -> Self {
        let documents = match (record.documents, record.document_path) {
            (Some(docs), _) => docs,
            (None, Some(path)) if !path.trim().is_empty() => {
                vec![DocumentRef::from_legacy(&record.id, path, record.document_name)]
            }
            _ => Vec::new(),
        };
        Self {
            id: record.id,
            parent_id: record.parent_id,
            fields: record.fields,
            documents,
        }
    }
}

impl Entity {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// String value of a field; empty strings count as absent.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        field_str(&self.fields, name)
    }

    pub fn document(&self, document_id: &str) -> Option<&DocumentRef> {
        self.documents.iter().find(|d| d.id == document_id)
    }

    pub fn document_index(&self, document_id: &str) -> Option<usize> {
        self.documents.iter().position(|d| d.id == document_id)
    }
}

/// String value of `name` in `fields`; empty or whitespace-only strings count as absent.
pub fn field_str<'a>(fields: &'a Fields, name: &str) -> Option<&'a str> {
    fields
        .get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
