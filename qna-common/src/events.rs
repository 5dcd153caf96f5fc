//! Event types for the Q&A panel event system
//!
//! Components never call into each other's internals or share ambient
//! buses; the store and the adapters publish typed events here and the
//! presentation layer subscribes.

use crate::message::Message;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Severity/flavor of a toast side effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToastKind {
    Announcement,
    Answer,
    Error,
}

/// Q&A panel event types
///
/// Events are broadcast via [`EventBus`] and can be serialized for
/// transmission to a rendering host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum QnaEvent {
    /// Message store contents changed
    ///
    /// Carries the full current top-level collection in display order.
    MessagesUpdated {
        threads: Vec<Message>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A transient toast should be shown
    ToastRequested {
        kind: ToastKind,
        text: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The menu icon should indicate unseen activity
    MenuIndicatorRequested {
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An answer-on-air banner became active at the current virtual time
    AnswerOnAirShown {
        message: Message,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The active answer-on-air banner left its display window
    AnswerOnAirHidden {
        id: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// No message data arrived before the give-up timer fired; the panel
    /// should swap its loading spinner for the empty state
    PanelEmptyState {
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl QnaEvent {
    /// Get event type as string for filtering
    pub fn event_type(&self) -> &str {
        match self {
            QnaEvent::MessagesUpdated { .. } => "MessagesUpdated",
            QnaEvent::ToastRequested { .. } => "ToastRequested",
            QnaEvent::MenuIndicatorRequested { .. } => "MenuIndicatorRequested",
            QnaEvent::AnswerOnAirShown { .. } => "AnswerOnAirShown",
            QnaEvent::AnswerOnAirHidden { .. } => "AnswerOnAirHidden",
            QnaEvent::PanelEmptyState { .. } => "PanelEmptyState",
        }
    }
}

/// Central event distribution bus for panel-wide events
///
/// Wraps `tokio::broadcast`, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<QnaEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<QnaEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` when at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: QnaEvent) -> Result<usize, broadcast::error::SendError<QnaEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring whether anyone is listening
    ///
    /// Side-effect events (toasts, indicators) are fire-and-forget: a host
    /// that never mounted the chrome simply misses them.
    pub fn emit_lossy(&self, event: QnaEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
