//! Headless core of a claim screen's entity sections.
//!
//! Each section pairs an [`EntityStore`] with a [`DraftForm`] (which embeds a
//! [`StagingArea`]) and a [`DocumentViewer`]. Backend access goes through
//! [`ClaimsApi`]; object URLs, downloads and toasts go through the injected
//! [`BlobHost`] and [`Notifier`].

pub mod api;
pub mod draft;
pub mod format_helpers;
pub mod notify;
pub mod platform;
pub mod section;
pub mod staging;
pub mod store;
pub mod viewer;


pub use api::{ClaimsApi, FetchedFile, HttpClaimsApi, Submission, UploadFile};
pub use draft::{DraftForm, DraftState, FormMode};
pub use notify::{LogNotifier, Notification, NotificationKind, Notifier, ToastQueue};
pub use platform::{Blob, BlobHost, DirBlobHost, MemoryBlobHost, TransientUrl};
pub use section::{ClaimSection, SectionContext};
pub use staging::{ClipboardItem, DragIndicator, IntakeChannel, StagedFile, StagingArea};
pub use store::{EntityStore, PendingRemoval, RemovalConfirmed};
pub use viewer::{DocumentViewer, LoadTicket, ViewerContent, ViewerItem};
