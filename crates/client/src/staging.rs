//! Files picked, dropped or pasted for a draft, held until submit.

use shared_types::{content_type_for, get_file_type, FileType};
use std::rc::Rc;

use crate::api::UploadFile;
use crate::format_helpers::{format_file_size, pluralize_files};
use crate::notify::{NotificationKind, Notifier};
use crate::platform::{Blob, BlobHost, TransientUrl};
use crate::viewer::ViewerItem;

/// Drag payload types that carry files.
pub const FILE_DRAG_TYPES: &[&str] = &["Files", "application/x-moz-file"];

/// Drag payload types Outlook uses for attachments and messages.
pub const OUTLOOK_DRAG_TYPES: &[&str] = &["FileGroupDescriptor", "FileGroupDescriptorW", "FileContents"];

/// A file the user picked but has not uploaded yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    name: String,
    content_type: String,
    bytes: Vec<u8>,
}

impl StagedFile {
    /// Content type is guessed from the name; see [`StagedFile::with_content_type`].
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let content_type = content_type_for(&name).to_string();
        Self {
            name,
            content_type,
            bytes,
        }
    }

    /// Override the guessed type with one the picker or clipboard reported.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        let content_type = content_type.into();
        if !content_type.trim().is_empty() {
            self.content_type = content_type;
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn file_type(&self) -> FileType {
        get_file_type(&self.name)
    }

    pub fn blob(&self) -> Blob {
        Blob {
            bytes: self.bytes.clone(),
            content_type: self.content_type.clone(),
        }
    }

    pub fn to_upload(&self) -> UploadFile {
        UploadFile {
            name: self.name.clone(),
            content_type: self.content_type.clone(),
            bytes: self.bytes.clone(),
        }
    }
}

/// Where staged files came from. Only affects logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeChannel {
    Picker,
    Drop,
    Paste,
}

/// One entry of a clipboard paste.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardItem {
    File(StagedFile),
    Text(String),
    Other { mime: String },
}

/// Drag-over affordance shown above the drop zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragIndicator {
    #[default]
    Idle,
    Files,
    Outlook,
}

impl DragIndicator {
    /// Indicator for a drag carrying `types`.
    pub fn for_types(types: &[&str]) -> Self {
        if types.iter().any(|t| OUTLOOK_DRAG_TYPES.contains(t)) {
            DragIndicator::Outlook
        } else if types.iter().any(|t| FILE_DRAG_TYPES.contains(t)) {
            DragIndicator::Files
        } else {
            DragIndicator::Idle
        }
    }
}

#[derive(Debug)]
struct Entry {
    file: StagedFile,
    thumbnail: Option<TransientUrl>,
}

/// Ordered staging buffer with a batch description.
///
/// Every thumbnail URL handed out is revoked when its file is removed, when
/// the area is cleared and when the area is dropped.
pub struct StagingArea {
    entries: Vec<Entry>,
    description: String,
    drag: DragIndicator,
    host: Rc<dyn BlobHost>,
    notifier: Rc<dyn Notifier>,
}

impl StagingArea {
    pub fn new(host: Rc<dyn BlobHost>, notifier: Rc<dyn Notifier>) -> Self {
        Self {
            entries: Vec::new(),
            description: String::new(),
            drag: DragIndicator::Idle,
            host,
            notifier,
        }
    }

    /// Append `files` after the ones already staged. Returns how many were added.
    pub fn add(&mut self, files: Vec<StagedFile>, channel: IntakeChannel) -> usize {
        let count = files.len();
        if count == 0 {
            return 0;
        }
        let bytes: u64 = files.iter().map(StagedFile::size).sum();
        self.entries.extend(files.into_iter().map(|file| Entry {
            file,
            thumbnail: None,
        }));

        tracing::debug!(?channel, count, total = self.entries.len(), "Files staged");
        self.notifier.notify(
            NotificationKind::Info,
            &format!("Added {} ({})", pluralize_files(count), format_file_size(bytes)),
        );
        count
    }

    /// Remove the file at `index`, revoking its thumbnail.
    pub fn remove(&mut self, index: usize) -> Option<StagedFile> {
        if index >= self.entries.len() {
            return None;
        }
        let entry = self.entries.remove(index);
        if let Some(url) = &entry.thumbnail {
            self.host.revoke(url);
        }
        if self.entries.is_empty() {
            self.description.clear();
        }
        Some(entry.file)
    }

    pub fn remove_all(&mut self) {
        for entry in self.entries.drain(..) {
            if let Some(url) = &entry.thumbnail {
                self.host.revoke(url);
            }
        }
        self.description.clear();
        self.drag = DragIndicator::Idle;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn file(&self, index: usize) -> Option<&StagedFile> {
        self.entries.get(index).map(|e| &e.file)
    }

    pub fn files(&self) -> impl Iterator<Item = &StagedFile> {
        self.entries.iter().map(|e| &e.file)
    }

    pub fn names(&self) -> Vec<&str> {
        self.files().map(StagedFile::name).collect()
    }

    /// The description field is only offered while something is staged.
    pub fn description_enabled(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn description(&self) -> Option<&str> {
        let text = self.description.trim();
        (!text.is_empty()).then_some(text)
    }

    /// Ignored while nothing is staged.
    pub fn set_description(&mut self, text: impl Into<String>) -> bool {
        if !self.description_enabled() {
            return false;
        }
        self.description = text.into();
        true
    }

    /// Preview URL for the list row of `index`, created on first use.
    pub fn thumbnail_url(&mut self, index: usize) -> Option<TransientUrl> {
        let entry = self.entries.get_mut(index)?;
        if entry.thumbnail.is_none() {
            match self.host.create_transient_url(&entry.file.blob()) {
                Ok(url) => entry.thumbnail = Some(url),
                Err(e) => {
                    tracing::warn!(file = entry.file.name(), "Failed to create thumbnail: {e}");
                    return None;
                }
            }
        }
        entry.thumbnail.clone()
    }

    pub fn drag_indicator(&self) -> DragIndicator {
        self.drag
    }

    pub fn drag_over(&mut self, types: &[&str]) -> DragIndicator {
        self.drag = DragIndicator::for_types(types);
        self.drag
    }

    pub fn drag_leave(&mut self) {
        self.drag = DragIndicator::Idle;
    }

    /// Complete a drop. Dropped files are handled like picked ones.
    pub fn drop_files(&mut self, files: Vec<StagedFile>) -> usize {
        self.drag = DragIndicator::Idle;
        self.add(files, IntakeChannel::Drop)
    }

    /// Stage the file entries of a paste; other clipboard content is ignored.
    pub fn paste(&mut self, items: Vec<ClipboardItem>) -> usize {
        let files: Vec<StagedFile> = items
            .into_iter()
            .filter_map(|item| match item {
                ClipboardItem::File(file) => Some(file),
                _ => None,
            })
            .collect();
        self.add(files, IntakeChannel::Paste)
    }

    pub fn upload_files(&self) -> Vec<UploadFile> {
        self.files().map(StagedFile::to_upload).collect()
    }

    pub fn viewer_items(&self) -> Vec<ViewerItem> {
        self.files()
            .map(|f| ViewerItem::Staged {
                name: f.name().to_string(),
                blob: f.blob(),
            })
            .collect()
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        for entry in &self.entries {
            if let Some(url) = &entry.thumbnail {
                self.host.revoke(url);
            }
        }
    }
}
