use std::cell::RefCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Info,
    Warning,
    Error,
}

/// User-facing notification sink (toasts, banners).
pub trait Notifier {
    fn notify(&self, kind: NotificationKind, message: &str);
}

/// Routes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, kind: NotificationKind, message: &str) {
        match kind {
            NotificationKind::Error => tracing::error!(target: "notify", "{message}"),
            NotificationKind::Warning => tracing::warn!(target: "notify", "{message}"),
            NotificationKind::Success | NotificationKind::Info => {
                tracing::info!(target: "notify", ?kind, "{message}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

/// Collects notifications for a presentation layer to drain.
#[derive(Debug, Default)]
pub struct ToastQueue {
    items: RefCell<Vec<Notification>>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every pending notification, oldest first.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.items.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    pub fn last(&self) -> Option<Notification> {
        self.items.borrow().last().cloned()
    }

    pub fn count(&self, kind: NotificationKind) -> usize {
        self.items.borrow().iter().filter(|n| n.kind == kind).count()
    }
}

impl Notifier for ToastQueue {
    fn notify(&self, kind: NotificationKind, message: &str) {
        self.items.borrow_mut().push(Notification {
            kind,
            message: message.to_string(),
        });
    }
}
