//! Transient user notifications ("toasts").
//!
//! Toasts are published on a broadcast channel; whatever renders them (a
//! terminal, a page) subscribes. Nothing is persisted.

use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tokio::time::Duration;

/// Default display time for success and error toasts.
pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToastKind {
    Pending,
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ToastId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: ToastId,
    pub kind: ToastKind,
    pub message: String,
    /// `None` stays up until dismissed (pending toasts).
    pub duration: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToastEvent {
    Show(Toast),
    Dismiss(ToastId),
}

/// Publishes toasts to every subscriber.
#[derive(Debug)]
pub struct Toaster {
    tx: broadcast::Sender<ToastEvent>,
    next_id: AtomicU64,
}

impl Default for Toaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Toaster {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            tx,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ToastEvent> {
        self.tx.subscribe()
    }

    /// Shows a pending toast that stays until [Toaster::dismiss].
    pub fn loading(&self, message: impl Into<String>) -> ToastId {
        self.show(ToastKind::Pending, message.into(), None)
    }

    pub fn success(&self, message: impl Into<String>, duration: Duration) -> ToastId {
        self.show(ToastKind::Success, message.into(), Some(duration))
    }

    pub fn error(&self, message: impl Into<String>) -> ToastId {
        self.show(ToastKind::Error, message.into(), Some(DEFAULT_TOAST_DURATION))
    }

    pub fn dismiss(&self, id: ToastId) {
        // No subscribers is fine: nobody is looking.
        let _ = self.tx.send(ToastEvent::Dismiss(id));
    }

    fn show(&self, kind: ToastKind, message: String, duration: Option<Duration>) -> ToastId {
        let id = ToastId(self.next_id.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(?kind, %message, "toast");
        let _ = self.tx.send(ToastEvent::Show(Toast {
            id,
            kind,
            message,
            duration,
        }));
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_events_ordered() {
        let toaster = Toaster::new();
        let mut rx = toaster.subscribe();
        let a = toaster.loading("Minting NFT...");
        let b = toaster.error("Whoops!");
        toaster.dismiss(a);
        assert_ne!(a, b);

        match rx.try_recv().unwrap() {
            ToastEvent::Show(t) => {
                assert_eq!(t.kind, ToastKind::Pending);
                assert_eq!(t.duration, None);
            }
            other => panic!("unexpected {:?}", other),
        }
        match rx.try_recv().unwrap() {
            ToastEvent::Show(t) => {
                assert_eq!(t.kind, ToastKind::Error);
                assert_eq!(t.duration, Some(DEFAULT_TOAST_DURATION));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(rx.try_recv().unwrap(), ToastEvent::Dismiss(a));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_does_not_fail() {
        let toaster = Toaster::new();
        let id = toaster.success("done", Duration::from_secs(8));
        toaster.dismiss(id);
    }
}
