//! Host capabilities for transient preview URLs and file downloads.
//!
//! In a browser these are object URLs and anchor-click downloads. Headless
//! hosts either record calls in memory or write files to a directory.

use shared_types::AppError;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Binary content with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Handle to a short-lived local URL. Must be revoked exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransientUrl(pub String);

impl TransientUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub trait BlobHost {
    fn create_transient_url(&self, blob: &Blob) -> Result<TransientUrl, AppError>;

    fn revoke(&self, url: &TransientUrl);

    /// Save `blob` under `file_name` on the user's side.
    fn trigger_download(&self, blob: &Blob, file_name: &str) -> Result<(), AppError>;
}

// ---------------------------------------------------------------------------
// MemoryBlobHost
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct HostLog {
    next_id: u64,
    created: Vec<TransientUrl>,
    revocations: HashMap<TransientUrl, usize>,
    downloads: Vec<(String, Blob)>,
}

/// Records every URL and download; used by tests and headless runs.
#[derive(Debug, Default)]
pub struct MemoryBlobHost {
    log: RefCell<HostLog>,
}

impl MemoryBlobHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created_count(&self) -> usize {
        self.log.borrow().created.len()
    }

    pub fn revoked_count(&self) -> usize {
        self.log.borrow().revocations.values().sum()
    }

    /// How many times `url` was revoked.
    pub fn revocations_of(&self, url: &TransientUrl) -> usize {
        self.log.borrow().revocations.get(url).copied().unwrap_or(0)
    }

    /// URLs created and not yet revoked.
    pub fn live_urls(&self) -> Vec<TransientUrl> {
        let log = self.log.borrow();
        log.created
            .iter()
            .filter(|u| !log.revocations.contains_key(*u))
            .cloned()
            .collect()
    }

    /// True when every created URL was revoked exactly once and nothing
    /// unknown was revoked.
    pub fn is_balanced(&self) -> bool {
        let log = self.log.borrow();
        log.created.len() == log.revocations.len()
            && log.created.iter().all(|u| log.revocations.get(u) == Some(&1))
    }

    /// File names passed to `trigger_download`, in call order.
    pub fn downloaded_names(&self) -> Vec<String> {
        self.log.borrow().downloads.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn last_download(&self) -> Option<(String, Blob)> {
        self.log.borrow().downloads.last().cloned()
    }
}

impl BlobHost for MemoryBlobHost {
    fn create_transient_url(&self, blob: &Blob) -> Result<TransientUrl, AppError> {
        let mut log = self.log.borrow_mut();
        log.next_id += 1;
        let url = TransientUrl(format!("blob:memory/{}?type={}", log.next_id, blob.content_type));
        log.created.push(url.clone());
        Ok(url)
    }

    fn revoke(&self, url: &TransientUrl) {
        *self.log.borrow_mut().revocations.entry(url.clone()).or_insert(0) += 1;
    }

    fn trigger_download(&self, blob: &Blob, file_name: &str) -> Result<(), AppError> {
        self.log
            .borrow_mut()
            .downloads
            .push((file_name.to_string(), blob.clone()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// DirBlobHost
// ---------------------------------------------------------------------------

/// Writes transient files and downloads under a directory.
///
/// Transient URLs are `file://` URLs of files in `<root>/transient`;
/// revoking one deletes the file. Downloads land in `<root>/downloads`
/// under their original name, suffixed ` (n)` on collision.
#[derive(Debug, Clone)]
pub struct DirBlobHost {
    root: PathBuf,
}

impl DirBlobHost {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, AppError> {
        let root = root.into();
        for dir in [root.join("transient"), root.join("downloads")] {
            std::fs::create_dir_all(&dir)
                .map_err(|e| AppError::internal(format!("Failed to create {}: {e}", dir.display())))?;
        }
        Ok(Self { root })
    }

    pub fn downloads_dir(&self) -> PathBuf {
        self.root.join("downloads")
    }

    fn transient_path(url: &TransientUrl) -> Option<&Path> {
        url.as_str().strip_prefix("file://").map(Path::new)
    }
}

/// Strip path separators and control characters from a user-facing name.
fn safe_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "download".to_string()
    } else {
        cleaned
    }
}

impl BlobHost for DirBlobHost {
    fn create_transient_url(&self, blob: &Blob) -> Result<TransientUrl, AppError> {
        let path = self.root.join("transient").join(uuid::Uuid::new_v4().to_string());
        std::fs::write(&path, &blob.bytes)
            .map_err(|e| AppError::internal(format!("Failed to write preview file: {e}")))?;
        Ok(TransientUrl(format!("file://{}", path.display())))
    }

    fn revoke(&self, url: &TransientUrl) {
        let Some(path) = Self::transient_path(url) else {
            tracing::warn!(url = url.as_str(), "Revoking a URL this host did not create");
            return;
        };
        if let Err(e) = std::fs::remove_file(path) {
            tracing::warn!(url = url.as_str(), "Failed to remove preview file: {e}");
        }
    }

    fn trigger_download(&self, blob: &Blob, file_name: &str) -> Result<(), AppError> {
        let name = safe_file_name(file_name);
        let dir = self.downloads_dir();
        let mut path = dir.join(&name);
        let mut n = 1;
        while path.exists() {
            let candidate = match name.rsplit_once('.') {
                Some((stem, ext)) if !stem.is_empty() => format!("{stem} ({n}).{ext}"),
                _ => format!("{name} ({n})"),
            };
            path = dir.join(candidate);
            n += 1;
        }
        std::fs::write(&path, &blob.bytes)
            .map_err(|e| AppError::internal(format!("Failed to save {file_name}: {e}")))?;
        tracing::debug!(path = %path.display(), "Download saved");
        Ok(())
    }
}
