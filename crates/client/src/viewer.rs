//! Preview and download of staged or persisted documents.
//!
//! The viewer owns at most one transient URL at a time: the one behind the
//! current item. Showing another item, closing the viewer or dropping it
//! revokes that URL. Loads are tagged with a generation so a response that
//! arrives after the user moved on is discarded before any URL is created
//! for it.

use shared_types::{get_file_type, AppError, DocumentRef, EntityKind, FileType};
use std::rc::Rc;

use crate::api::{ClaimsApi, FetchedFile};
use crate::notify::{NotificationKind, Notifier};
use crate::platform::{Blob, BlobHost, TransientUrl};

/// Something the viewer can show.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerItem {
    Staged { name: String, blob: Blob },
    Persisted { entity_id: String, document: DocumentRef },
}

impl ViewerItem {
    pub fn name(&self) -> &str {
        match self {
            ViewerItem::Staged { name, .. } => name,
            ViewerItem::Persisted { document, .. } => document.display_name(),
        }
    }

    pub fn file_type(&self) -> FileType {
        get_file_type(self.name())
    }
}

/// What the presentation layer should render for the current item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerContent {
    /// Embedded frame (pdf, docx, kmz).
    Frame(TransientUrl),
    Image(TransientUrl),
    /// Server-rendered view; nothing local to revoke.
    Remote(String),
    /// Not previewable, download only.
    Placeholder,
}

impl ViewerContent {
    fn transient_url(&self) -> Option<&TransientUrl> {
        match self {
            ViewerContent::Frame(url) | ViewerContent::Image(url) => Some(url),
            ViewerContent::Remote(_) | ViewerContent::Placeholder => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchTarget {
    pub entity_id: String,
    pub document: DocumentRef,
}

/// One in-flight load. Only the most recent ticket can be resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadTicket {
    generation: u64,
    index: usize,
    fetch: Option<FetchTarget>,
}

impl LoadTicket {
    pub fn index(&self) -> usize {
        self.index
    }

    /// The document to fetch, or `None` when the content was ready at once.
    pub fn fetch_target(&self) -> Option<&FetchTarget> {
        self.fetch.as_ref()
    }
}

pub struct DocumentViewer<A: ClaimsApi> {
    kind: EntityKind,
    api: Rc<A>,
    host: Rc<dyn BlobHost>,
    notifier: Rc<dyn Notifier>,
    items: Vec<ViewerItem>,
    index: usize,
    content: Option<ViewerContent>,
    generation: u64,
}

impl<A: ClaimsApi> DocumentViewer<A> {
    pub fn new(kind: EntityKind, api: Rc<A>, host: Rc<dyn BlobHost>, notifier: Rc<dyn Notifier>) -> Self {
        Self {
            kind,
            api,
            host,
            notifier,
            items: Vec::new(),
            index: 0,
            content: None,
            generation: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn current(&self) -> Option<&ViewerItem> {
        self.items.get(self.index)
    }

    /// `None` while a fetch is pending or the viewer is closed.
    pub fn content(&self) -> Option<&ViewerContent> {
        self.content.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.is_open() && self.content.is_none()
    }

    /// Next/previous controls are only offered for more than one item.
    pub fn can_navigate(&self) -> bool {
        self.items.len() > 1
    }

    /// Whether any item of the sibling set belongs to `entity_id`.
    pub fn shows_entity(&self, entity_id: &str) -> bool {
        self.items.iter().any(|item| {
            matches!(item, ViewerItem::Persisted { entity_id: id, .. } if id == entity_id)
        })
    }

    /// Whether the sibling set comes from the draft's staging list.
    pub fn shows_staged(&self) -> bool {
        self.items.iter().any(|item| matches!(item, ViewerItem::Staged { .. }))
    }

    fn release_content(&mut self) {
        if let Some(url) = self.content.take().as_ref().and_then(ViewerContent::transient_url) {
            self.host.revoke(url);
        }
    }

    /// Replace the sibling set without loading anything.
    pub fn set_items(&mut self, items: Vec<ViewerItem>) {
        self.close();
        self.items = items;
    }

    /// Start showing the item at `index`.
    ///
    /// Revokes the previous URL and invalidates any pending load. Content
    /// that needs no fetch is installed immediately.
    pub fn begin_load(&mut self, index: usize) -> Option<LoadTicket> {
        let item = self.items.get(index)?.clone();
        self.release_content();
        self.generation += 1;
        self.index = index;

        let file_type = item.file_type();
        let mut fetch = None;
        match item {
            _ if !file_type.is_previewable() => self.content = Some(ViewerContent::Placeholder),
            ViewerItem::Staged { name, blob } => {
                if file_type == FileType::Excel {
                    // Spreadsheets only render server-side.
                    self.content = Some(ViewerContent::Placeholder);
                } else {
                    match self.host.create_transient_url(&blob) {
                        Ok(url) => self.content = Some(Self::content_for(file_type, url)),
                        Err(e) => {
                            self.fail(&name, e);
                            return None;
                        }
                    }
                }
            }
            ViewerItem::Persisted { entity_id, document } => {
                if file_type == FileType::Excel {
                    let url = self.api.viewer_url(self.kind, &entity_id, &document);
                    self.content = Some(ViewerContent::Remote(url));
                } else {
                    fetch = Some(FetchTarget { entity_id, document });
                }
            }
        }

        Some(LoadTicket {
            generation: self.generation,
            index,
            fetch,
        })
    }

    /// Install the outcome of a ticket's fetch.
    ///
    /// Stale tickets are ignored and no URL is created for them. A failed
    /// fetch notifies and closes the viewer. Returns true when content was
    /// installed.
    pub fn resolve(&mut self, ticket: LoadTicket, result: Result<FetchedFile, AppError>) -> bool {
        if ticket.generation != self.generation || !self.is_open() {
            tracing::debug!(index = ticket.index, "Discarding stale preview response");
            return false;
        }
        let Some(item) = self.items.get(ticket.index) else {
            return false;
        };
        let name = item.name().to_string();
        let file_type = item.file_type();

        let url = result.and_then(|fetched| self.host.create_transient_url(&fetched.blob));
        match url {
            Ok(url) => {
                self.content = Some(Self::content_for(file_type, url));
                true
            }
            Err(e) => {
                self.fail(&name, e);
                false
            }
        }
    }

    fn content_for(file_type: FileType, url: TransientUrl) -> ViewerContent {
        match file_type {
            FileType::Image => ViewerContent::Image(url),
            _ => ViewerContent::Frame(url),
        }
    }

    fn fail(&mut self, name: &str, error: AppError) {
        tracing::warn!(kind = %self.kind, file = name, "Preview failed: {error}");
        self.notifier.notify(
            NotificationKind::Error,
            &format!("Failed to open preview of {name}: {}", error.message),
        );
        self.close();
    }

    async fn show(&mut self, index: usize) -> bool {
        let Some(ticket) = self.begin_load(index) else {
            return false;
        };
        let Some(target) = ticket.fetch_target().cloned() else {
            return true;
        };
        let result = self
            .api
            .fetch_preview(self.kind, &target.entity_id, &target.document)
            .await;
        self.resolve(ticket, result)
    }

    /// Open the viewer on `items[index]`.
    pub async fn open(&mut self, items: Vec<ViewerItem>, index: usize) -> bool {
        if index >= items.len() {
            return false;
        }
        self.set_items(items);
        self.show(index).await
    }

    pub async fn next(&mut self) -> bool {
        if !self.can_navigate() {
            return false;
        }
        let index = (self.index + 1) % self.items.len();
        self.show(index).await
    }

    pub async fn prev(&mut self) -> bool {
        if !self.can_navigate() {
            return false;
        }
        let len = self.items.len();
        let index = (self.index + len - 1) % len;
        self.show(index).await
    }

    /// Revoke the current URL and forget the sibling set.
    pub fn close(&mut self) {
        self.release_content();
        self.generation += 1;
        self.items.clear();
        self.index = 0;
    }

    /// Save `item` under its original name. Persisted documents are always
    /// fetched fresh. Viewer state is left untouched.
    pub async fn download(&self, item: &ViewerItem) -> bool {
        let result = match item {
            ViewerItem::Staged { name, blob } => self.host.trigger_download(blob, name),
            ViewerItem::Persisted { entity_id, document } => {
                match self.api.fetch_download(self.kind, entity_id, document).await {
                    Ok(fetched) => {
                        let name = if document.original_file_name.is_empty() {
                            fetched.file_name.as_str()
                        } else {
                            document.original_file_name.as_str()
                        };
                        self.host.trigger_download(&fetched.blob, name)
                    }
                    Err(e) => Err(e),
                }
            }
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(kind = %self.kind, file = item.name(), "Download failed: {e}");
                self.notifier.notify(
                    NotificationKind::Error,
                    &format!("Failed to download {}: {}", item.name(), e.message),
                );
                false
            }
        }
    }

    pub async fn download_current(&self) -> bool {
        match self.current() {
            Some(item) => self.download(item).await,
            None => false,
        }
    }
}

impl<A: ClaimsApi> Drop for DocumentViewer<A> {
    fn drop(&mut self) {
        self.release_content();
    }
}
