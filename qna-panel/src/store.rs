//! In-memory message store
//!
//! Thread roots live in an id-indexed arena with a monotonically
//! increasing insertion sequence; display order is derived on demand, so
//! no caller ever holds a reference into a shared mutable array. Replies
//! are owned by their root and kept ascending by creation time.
//!
//! Every mutating operation emits a single `MessagesUpdated` event carrying
//! the full top-level collection in display order; the `_quiet` variants
//! skip the event for batch mutation.

use qna_common::{time, DeliveryStatus, EventBus, Message, MessageKind, QnaEvent};
use std::collections::HashMap;
use tracing::{debug, warn};

struct ThreadSlot {
    /// Insertion sequence; the stable tie-break for equal thread times
    seq: u64,
    message: Message,
}

/// Id-indexed store of message threads
pub struct MessageStore {
    threads: HashMap<String, ThreadSlot>,
    next_seq: u64,
    bus: EventBus,
}

impl MessageStore {
    pub fn new(bus: EventBus) -> Self {
        Self {
            threads: HashMap::new(),
            next_seq: 0,
            bus,
        }
    }

    /// Number of thread roots
    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    /// Look up a thread root by id
    pub fn get(&self, id: &str) -> Option<&Message> {
        self.threads.get(id).map(|slot| &slot.message)
    }

    /// Top-level messages in display order
    ///
    /// Ascending by thread time, insertion order breaking ties.
    pub fn threads(&self) -> Vec<Message> {
        let mut slots: Vec<&ThreadSlot> = self.threads.values().collect();
        slots.sort_by_key(|slot| (thread_time(&slot.message), slot.seq));
        slots.iter().map(|slot| slot.message.clone()).collect()
    }

    /// Add a top-level message
    ///
    /// Supersedes a still-`Sending` local placeholder the message
    /// acknowledges, then appends if the id is unknown. A second add of the
    /// same id is a no-op regardless of field differences; updates happen
    /// only through the explicit update operations.
    pub fn add(&mut self, message: Message) {
        if self.add_quiet(message) {
            self.emit_updated();
        }
    }

    /// [`MessageStore::add`] without the update event; returns whether the
    /// store changed
    pub fn add_quiet(&mut self, message: Message) -> bool {
        let superseded = self.remove_acknowledged_placeholder(&message);

        if self.threads.contains_key(&message.id) {
            debug!("ignoring duplicate message {}", message.id);
            return superseded;
        }
        self.insert_thread(message);
        true
    }

    /// Add a reply under `parent_id`
    ///
    /// Same supersede-then-idempotent-append semantics scoped to the
    /// parent's reply list. A reply whose parent is unknown is dropped;
    /// no reattachment is attempted if the parent appears later.
    pub fn add_reply(&mut self, parent_id: &str, reply: Message) {
        if self.add_reply_quiet(parent_id, reply) {
            self.emit_updated();
        }
    }

    /// [`MessageStore::add_reply`] without the update event
    pub fn add_reply_quiet(&mut self, parent_id: &str, reply: Message) -> bool {
        let Some(slot) = self.threads.get_mut(parent_id) else {
            warn!("dropping reply {}: no thread root {parent_id}", reply.id);
            return false;
        };
        let replies = &mut slot.message.replies;

        let mut changed = false;
        if let Some(pending_id) = reply.pending_message_id.as_deref() {
            if let Some(pos) = replies.iter().position(|r| {
                r.id == pending_id && r.delivery_status == Some(DeliveryStatus::Sending)
            }) {
                replies.remove(pos);
                changed = true;
            }
        }

        if replies.iter().any(|r| r.id == reply.id) {
            debug!("ignoring duplicate reply {}", reply.id);
            return changed;
        }
        replies.push(reply);
        replies.sort_by_key(|r| r.start_time_ms);
        true
    }

    /// Remove a top-level message by id, if present
    pub fn delete_message(&mut self, id: &str) {
        if self.threads.remove(id).is_some() {
            self.emit_updated();
        }
    }

    /// Remove one reply from `parent_id`'s thread, if present
    pub fn delete_reply(&mut self, parent_id: &str, reply_id: &str) {
        let Some(slot) = self.threads.get_mut(parent_id) else {
            return;
        };
        let replies = &mut slot.message.replies;
        if let Some(pos) = replies.iter().position(|r| r.id == reply_id) {
            replies.remove(pos);
            self.emit_updated();
        }
    }

    /// Apply a pure transformation to one message
    ///
    /// The target is top-level when `parent_id` is `None`, otherwise it is
    /// searched in that parent's replies. A modifier returning `None`
    /// signals "no change" and suppresses the update event.
    pub fn update_message_by_id(
        &mut self,
        id: &str,
        parent_id: Option<&str>,
        modifier: impl FnOnce(&Message) -> Option<Message>,
    ) -> bool {
        let target = match parent_id {
            None => self.threads.get_mut(id).map(|slot| &mut slot.message),
            Some(pid) => self
                .threads
                .get_mut(pid)
                .and_then(|slot| slot.message.replies.iter_mut().find(|r| r.id == id)),
        };
        let Some(target) = target else {
            return false;
        };

        match modifier(target) {
            Some(updated) => {
                *target = updated;
                self.emit_updated();
                true
            }
            None => false,
        }
    }

    /// Rewrite a message's identity (retry-with-new-id flows)
    pub fn update_message_id(&mut self, current_id: &str, new_id: &str, parent_id: Option<&str>) {
        match parent_id {
            None => {
                if let Some(mut slot) = self.threads.remove(current_id) {
                    slot.message.id = new_id.to_string();
                    self.threads.insert(new_id.to_string(), slot);
                    self.emit_updated();
                }
            }
            Some(pid) => {
                let Some(slot) = self.threads.get_mut(pid) else {
                    return;
                };
                if let Some(reply) =
                    slot.message.replies.iter_mut().find(|r| r.id == current_id)
                {
                    reply.id = new_id.to_string();
                    self.emit_updated();
                }
            }
        }
    }

    /// Drop all contents (media unload)
    pub fn reset(&mut self) {
        self.threads.clear();
        self.next_seq = 0;
        self.emit_updated();
    }

    /// Publish the current top-level collection
    pub fn emit_updated(&self) {
        self.bus.emit_lossy(QnaEvent::MessagesUpdated {
            threads: self.threads(),
            timestamp: time::now(),
        });
    }

    fn insert_thread(&mut self, message: Message) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.threads.insert(message.id.clone(), ThreadSlot { seq, message });
    }

    /// Remove the still-`Sending` top-level placeholder this server message
    /// acknowledges, when one exists
    fn remove_acknowledged_placeholder(&mut self, message: &Message) -> bool {
        let Some(pending_id) = message.pending_message_id.as_deref() else {
            return false;
        };
        let still_sending = self
            .threads
            .get(pending_id)
            .map(|slot| slot.message.delivery_status == Some(DeliveryStatus::Sending))
            .unwrap_or(false);
        if still_sending {
            self.threads.remove(pending_id);
            return true;
        }
        false
    }
}

/// Sort key for a thread root
///
/// Announcement and answer-on-air roots sort by their own creation time.
/// Question/Answer threads bubble to their most recent question, answer, or
/// announcement-typed activity; a reply of any other kind does not move the
/// thread. Key is 0 when none of those times can be determined.
fn thread_time(root: &Message) -> u64 {
    match root.kind {
        MessageKind::Announcement | MessageKind::AnswerOnAir => root.start_time_ms,
        MessageKind::Question | MessageKind::Answer => {
            let mut key = root.start_time_ms;
            for reply in &root.replies {
                if matches!(reply.kind, MessageKind::Answer | MessageKind::Announcement) {
                    key = key.max(reply.start_time_ms);
                }
            }
            key
        }
    }
}
