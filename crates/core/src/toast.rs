//! User-facing notifications.

use std::sync::{Mutex, MutexGuard};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ToastVariant {
    #[default]
    Default,
    Destructive,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub description: Option<String>,
    pub variant: ToastVariant,
}

impl Toast {
    pub fn success(title: impl Into<String>, description: Option<&str>) -> Self {
        Self {
            title: title.into(),
            description: description.map(str::to_owned),
            variant: ToastVariant::Default,
        }
    }

    pub fn error(title: impl Into<String>, description: Option<String>) -> Self {
        Self {
            title: title.into(),
            description,
            variant: ToastVariant::Destructive,
        }
    }
}

/// Receives notifications raised by the form and dialog controllers.
pub trait Toaster: Send + Sync {
    fn toast(&self, toast: Toast);
}

/// Toasts waiting to be shown, in the order they were raised.
#[derive(Debug, Default)]
pub struct ToastQueue {
    pending: Mutex<Vec<Toast>>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn pending(&self) -> MutexGuard<'_, Vec<Toast>> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Removes and returns everything queued so far.
    pub fn drain(&self) -> Vec<Toast> {
        std::mem::take(&mut *self.pending())
    }

    pub fn len(&self) -> usize {
        self.pending().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Toaster for ToastQueue {
    fn toast(&self, toast: Toast) {
        match toast.variant {
            ToastVariant::Default => tracing::info!(title = %toast.title, "toast"),
            ToastVariant::Destructive => tracing::warn!(
                title = %toast.title,
                description = toast.description.as_deref().unwrap_or_default(),
                "error toast"
            ),
        }
        self.pending().push(toast);
    }
}

impl<T: Toaster + ?Sized> Toaster for std::sync::Arc<T> {
    fn toast(&self, toast: Toast) {
        (**self).toast(toast)
    }
}
