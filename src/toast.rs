//! Imperative toast notifications
//!
//! Toasts are shown and dismissed through [`ToastService`] instead of being
//! rendered ad hoc, so notification behaviour (auto-dismiss, de-duplication)
//! is testable without any renderer attached. Renderers subscribe to
//! [`ToastEvent`]s.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

const EVENT_CAPACITY: usize = 64;

/// Severity of a toast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for ToastLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        write!(f, "{}", name)
    }
}

/// Toast identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ToastId(Uuid);

impl fmt::Display for ToastId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A visible toast
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub id: ToastId,
    pub level: ToastLevel,
    pub message: String,
    pub shown_at: DateTime<Utc>,
}

/// Change notifications for renderers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToastEvent {
    Shown(Toast),
    Dismissed(ToastId),
}

#[derive(Default)]
struct Inner {
    toasts: Vec<Toast>,
    timers: HashMap<ToastId, JoinHandle<()>>,
}

/// Shared toast registry; clones refer to the same toasts
#[derive(Clone)]
pub struct ToastService {
    inner: Arc<Mutex<Inner>>,
    events: broadcast::Sender<ToastEvent>,
}

impl Default for ToastService {
    fn default() -> Self {
        Self::new()
    }
}

impl ToastService {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ToastEvent> {
        self.events.subscribe()
    }

    /// Show a toast, dismissing it automatically after `auto_dismiss`
    ///
    /// Auto-dismiss requires a running Tokio runtime.
    pub fn show(
        &self,
        level: ToastLevel,
        message: impl Into<String>,
        auto_dismiss: Option<Duration>,
    ) -> ToastId {
        let toast = Toast {
            id: ToastId(Uuid::new_v4()),
            level,
            message: message.into(),
            shown_at: Utc::now(),
        };
        let id = toast.id;
        debug!("Toast {} [{}]: {}", id, level, toast.message);

        let mut inner = self.lock();
        inner.toasts.push(toast.clone());
        if let Some(delay) = auto_dismiss {
            let service = self.clone();
            let timer = tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                service.remove(id, false);
            });
            inner.timers.insert(id, timer);
        }
        drop(inner);

        // No subscribers is fine
        let _ = self.events.send(ToastEvent::Shown(toast));
        id
    }

    /// Show a toast unless an identical one is already visible
    pub fn show_once(
        &self,
        level: ToastLevel,
        message: impl Into<String>,
        auto_dismiss: Option<Duration>,
    ) -> ToastId {
        let message = message.into();
        let existing = self
            .lock()
            .toasts
            .iter()
            .find(|t| t.level == level && t.message == message)
            .map(|t| t.id);

        match existing {
            Some(id) => id,
            None => self.show(level, message, auto_dismiss),
        }
    }

    /// Dismiss a toast; returns false if it was not visible
    pub fn dismiss(&self, id: ToastId) -> bool {
        self.remove(id, true)
    }

    /// Dismiss every visible toast
    pub fn dismiss_all(&self) {
        let ids: Vec<ToastId> = self.lock().toasts.iter().map(|t| t.id).collect();
        for id in ids {
            self.remove(id, true);
        }
    }

    /// Currently visible toasts, oldest first
    pub fn active(&self) -> Vec<Toast> {
        self.lock().toasts.clone()
    }

    fn remove(&self, id: ToastId, cancel_timer: bool) -> bool {
        let mut inner = self.lock();
        let before = inner.toasts.len();
        inner.toasts.retain(|t| t.id != id);
        let removed = inner.toasts.len() != before;

        if let Some(timer) = inner.timers.remove(&id) {
            if cancel_timer {
                timer.abort();
            }
        }
        drop(inner);

        if removed {
            let _ = self.events.send(ToastEvent::Dismissed(id));
        }
        removed
    }
}
