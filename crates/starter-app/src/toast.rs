//! User-facing notifications.
//!
//! Components never return errors to the page; they push a toast instead.
//! A renderer drains the queue and shows whatever is there.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

/// Shared toast queue. Clones push into the same queue.
#[derive(Debug, Clone, Default)]
pub struct Toaster {
    queue: Arc<Mutex<Vec<Toast>>>,
}

impl Toaster {
    pub fn new() -> Self {
        Self::default()
    }

    fn queue(&self) -> MutexGuard<'_, Vec<Toast>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(ToastKind::Success, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(ToastKind::Error, message.into());
    }

    fn push(&self, kind: ToastKind, message: String) {
        self.queue().push(Toast { kind, message });
    }

    /// Take every pending toast, oldest first.
    pub fn drain(&self) -> Vec<Toast> {
        std::mem::take(&mut *self.queue())
    }

    pub fn last(&self) -> Option<Toast> {
        self.queue().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.queue().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue().is_empty()
    }
}
