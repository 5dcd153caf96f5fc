//! Announcement adapter
//!
//! Announcements are store-displayed, not time-windowed banners: deletions
//! route to store removal, everything else to an idempotent add. Toast and
//! menu-indicator side effects fire only for messages created within the
//! recency window of wall-clock now, so an initial backlog load stays
//! silent.

use crate::store::MessageStore;
use qna_common::{time, EventBus, Message, MessageKind, QnaEvent, ToastKind};

pub struct AnnouncementAdapter {
    bus: EventBus,
    recency_window_ms: u64,
}

impl AnnouncementAdapter {
    pub fn new(bus: EventBus, recency_window_ms: u64) -> Self {
        Self {
            bus,
            recency_window_ms,
        }
    }

    /// Route one parsed push batch into the store
    pub fn on_messages(&self, store: &mut MessageStore, messages: &[Message], now_wall_ms: u64) {
        for message in messages {
            if message.kind != MessageKind::Announcement {
                continue;
            }
            if message.is_deleted() {
                store.delete_message(&message.id);
                continue;
            }

            // A replayed batch (push-channel reconnect) changes nothing in
            // the store and must stay silent
            if !store.add_quiet(message.clone()) {
                continue;
            }
            store.emit_updated();

            let recent = time::within_window(message.start_time_ms, now_wall_ms, self.recency_window_ms);
            if recent {
                self.bus.emit_lossy(QnaEvent::ToastRequested {
                    kind: ToastKind::Announcement,
                    text: message.content.clone(),
                    timestamp: time::now(),
                });
                self.bus.emit_lossy(QnaEvent::MenuIndicatorRequested {
                    timestamp: time::now(),
                });
            }
        }
    }
}
