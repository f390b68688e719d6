use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

// ── Trait ────────────────────────────────────────────────────────────

/// Object storage for uploaded document bytes.
#[allow(async_fn_in_trait)]
pub trait ObjectStore: Send + Sync {
    /// Store bytes under `key`, replacing any previous object.
    async fn put(&self, key: &str, body: Vec<u8>) -> Result<(), String>;

    /// Fetch the bytes stored under `key`.
    async fn get(&self, key: &str) -> Result<Vec<u8>, String>;

    /// Check if an object exists.
    async fn head(&self, key: &str) -> Result<bool, String>;

    /// Delete an object. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), String>;

    /// Number of stored objects.
    async fn len(&self) -> Result<usize, String>;
}

// ── In-memory implementation ────────────────────────────────────────

/// Process-local object store. Contents vanish on restart.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, body: Vec<u8>) -> Result<(), String> {
        self.objects
            .write()
            .map_err(|e| e.to_string())?
            .insert(key.to_string(), body);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, String> {
        self.objects
            .read()
            .map_err(|e| e.to_string())?
            .get(key)
            .cloned()
            .ok_or_else(|| format!("NotFound: {key}"))
    }

    async fn head(&self, key: &str) -> Result<bool, String> {
        Ok(self
            .objects
            .read()
            .map_err(|e| e.to_string())?
            .contains_key(key))
    }

    async fn delete(&self, key: &str) -> Result<(), String> {
        self.objects.write().map_err(|e| e.to_string())?.remove(key);
        Ok(())
    }

    async fn len(&self) -> Result<usize, String> {
        Ok(self.objects.read().map_err(|e| e.to_string())?.len())
    }
}

// ── Local directory implementation ──────────────────────────────────

/// Stores each object as a file under `root`. Keys may contain `/`.
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the root directory if it does not exist yet.
    pub async fn ensure_root(&self) -> Result<(), String> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| format!("Failed to create {}: {e}", self.root.display()))
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, String> {
        if key.split('/').any(|part| part.is_empty() || part == "." || part == "..") {
            return Err(format!("Invalid object key: {key}"));
        }
        Ok(self.root.join(key))
    }
}

impl ObjectStore for LocalObjectStore {
    async fn put(&self, key: &str, body: Vec<u8>) -> Result<(), String> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| e.to_string())?;
        }
        tokio::fs::write(&path, body).await.map_err(|e| e.to_string())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, String> {
        let path = self.path_for(key)?;
        tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                format!("NotFound: {key}")
            } else {
                e.to_string()
            }
        })
    }

    async fn head(&self, key: &str) -> Result<bool, String> {
        let path = self.path_for(key)?;
        tokio::fs::try_exists(&path).await.map_err(|e| e.to_string())
    }

    async fn delete(&self, key: &str) -> Result<(), String> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.to_string()),
        }
    }

    async fn len(&self) -> Result<usize, String> {
        let mut count = 0;
        let mut stack = vec![self.root.clone()];
        while let Some(dir) = stack.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.to_string()),
            };
            while let Some(entry) = entries.next_entry().await.map_err(|e| e.to_string())? {
                let file_type = entry.file_type().await.map_err(|e| e.to_string())?;
                if file_type.is_dir() {
                    stack.push(entry.path());
                } else {
                    count += 1;
                }
            }
        }
        Ok(count)
    }
}

// ── Configured backend ──────────────────────────────────────────────

/// The object store selected by configuration.
pub enum DocumentStorage {
    Memory(MemoryObjectStore),
    Local(LocalObjectStore),
}

impl DocumentStorage {
    /// In-memory when `storage_dir` is absent, a local directory otherwise.
    pub async fn from_settings(storage_dir: Option<&str>) -> Result<Self, String> {
        match storage_dir {
            None => Ok(DocumentStorage::Memory(MemoryObjectStore::new())),
            Some(dir) => {
                let store = LocalObjectStore::new(dir);
                store.ensure_root().await?;
                tracing::info!("Storing documents under {dir}");
                Ok(DocumentStorage::Local(store))
            }
        }
    }
}

impl ObjectStore for DocumentStorage {
    async fn put(&self, key: &str, body: Vec<u8>) -> Result<(), String> {
        match self {
            DocumentStorage::Memory(s) => s.put(key, body).await,
            DocumentStorage::Local(s) => s.put(key, body).await,
        }
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, String> {
        match self {
            DocumentStorage::Memory(s) => s.get(key).await,
            DocumentStorage::Local(s) => s.get(key).await,
        }
    }

    async fn head(&self, key: &str) -> Result<bool, String> {
        match self {
            DocumentStorage::Memory(s) => s.head(key).await,
            DocumentStorage::Local(s) => s.head(key).await,
        }
    }

    async fn delete(&self, key: &str) -> Result<(), String> {
        match self {
            DocumentStorage::Memory(s) => s.delete(key).await,
            DocumentStorage::Local(s) => s.delete(key).await,
        }
    }

    async fn len(&self) -> Result<usize, String> {
        match self {
            DocumentStorage::Memory(s) => s.len().await,
            DocumentStorage::Local(s) => s.len().await,
        }
    }
}
