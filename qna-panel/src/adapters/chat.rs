//! Chat adapter
//!
//! Routes question/answer traffic into the store and owns the outbound
//! submit flow. A locally authored message is inserted optimistically with
//! `Sending` status; the server ack arrives later as a normal inbound push
//! matched by the client-chosen id, so concurrent submissions never
//! interfere. A failed submit flags the placeholder `SendFailed` in place;
//! resending swaps in a fresh id and reuses the same flow.

use crate::api::{CuePointApi, SubmitRequest};
use crate::error::{Error, Result};
use crate::store::MessageStore;
use qna_common::{time, DeliveryStatus, EventBus, Message, MessageKind, QnaEvent, ToastKind};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

pub struct ChatAdapter {
    bus: EventBus,
    api: Arc<dyn CuePointApi>,
    entry_id: String,
    user_id: String,
    recency_window_ms: u64,
}

impl ChatAdapter {
    pub fn new(
        bus: EventBus,
        api: Arc<dyn CuePointApi>,
        entry_id: String,
        user_id: String,
        recency_window_ms: u64,
    ) -> Self {
        Self {
            bus,
            api,
            entry_id,
            user_id,
            recency_window_ms,
        }
    }

    /// Route one parsed push batch into the store
    ///
    /// A Deleted-state message is a removal signal, routed to store
    /// deletion and never inserted. Side effects fire only when the store
    /// actually changed, so a replayed batch stays silent.
    pub fn on_messages(&self, store: &mut MessageStore, messages: &[Message], now_wall_ms: u64) {
        for message in messages {
            if !matches!(message.kind, MessageKind::Question | MessageKind::Answer) {
                continue;
            }

            match message.parent_id.clone() {
                None => {
                    if message.is_deleted() {
                        store.delete_message(&message.id);
                    } else {
                        store.add(message.clone());
                    }
                }
                Some(parent_id) => {
                    if message.is_deleted() {
                        store.delete_reply(&parent_id, &message.id);
                    } else if store.add_reply_quiet(&parent_id, message.clone()) {
                        store.emit_updated();
                        self.apply_reply_flags(store, &parent_id, message, now_wall_ms);
                    }
                }
            }
        }
    }

    fn apply_reply_flags(
        &self,
        store: &mut MessageStore,
        parent_id: &str,
        reply: &Message,
        now_wall_ms: u64,
    ) {
        if reply.auto_reply {
            store.update_message_by_id(parent_id, None, |parent| {
                if parent.will_be_answered_on_air {
                    return None;
                }
                let mut updated = parent.clone();
                updated.will_be_answered_on_air = true;
                Some(updated)
            });
        }

        let recent_answer = reply.kind == MessageKind::Answer
            && time::within_window(reply.start_time_ms, now_wall_ms, self.recency_window_ms);
        if recent_answer {
            store.update_message_by_id(parent_id, None, |parent| {
                if parent.unread {
                    return None;
                }
                let mut updated = parent.clone();
                updated.unread = true;
                Some(updated)
            });
            self.bus.emit_lossy(QnaEvent::ToastRequested {
                kind: ToastKind::Answer,
                text: reply.content.clone(),
                timestamp: time::now(),
            });
            self.bus.emit_lossy(QnaEvent::MenuIndicatorRequested {
                timestamp: time::now(),
            });
        }
    }

    /// Submit a new top-level question; returns the client-chosen id
    pub async fn send_question(&self, store: &RwLock<MessageStore>, content: &str) -> String {
        self.send(store, content, None).await
    }

    /// Submit a follow-up under an existing thread root
    pub async fn send_reply(
        &self,
        store: &RwLock<MessageStore>,
        parent_id: &str,
        content: &str,
    ) -> String {
        self.send(store, content, Some(parent_id.to_string())).await
    }

    /// Resend a failed message under a fresh id, preserving its content and
    /// parent; returns the new id, or `None` when the target is not a
    /// resendable (`SendFailed`) message
    pub async fn resend(
        &self,
        store: &RwLock<MessageStore>,
        failed_id: &str,
        parent_id: Option<&str>,
    ) -> Option<String> {
        let new_id = Uuid::new_v4().to_string();
        let pending = {
            let mut store = store.write().await;
            let target = match parent_id {
                None => store.get(failed_id).cloned(),
                Some(pid) => store
                    .get(pid)
                    .and_then(|p| p.replies.iter().find(|r| r.id == failed_id).cloned()),
            };
            let Some(target) = target else {
                warn!("resend: no message {failed_id}");
                return None;
            };
            if target.delivery_status != Some(DeliveryStatus::SendFailed) {
                warn!("resend: message {failed_id} is not in SendFailed state");
                return None;
            }

            let pending = Message::pending(new_id.clone(), target.content, target.parent_id);

            // Replace the failed entry rather than duplicating it; the
            // stored entry takes the fresh submission timestamp so store
            // and wire agree on the message's time
            store.update_message_id(failed_id, &new_id, parent_id);
            let resent_at = pending.start_time_ms;
            store.update_message_by_id(&new_id, parent_id, |m| {
                let mut updated = m.with_delivery_status(DeliveryStatus::Sending);
                updated.start_time_ms = resent_at;
                Some(updated)
            });
            pending
        };

        self.submit_and_settle(store, &pending).await;
        Some(new_id)
    }

    async fn send(
        &self,
        store: &RwLock<MessageStore>,
        content: &str,
        parent_id: Option<String>,
    ) -> String {
        let client_id = Uuid::new_v4().to_string();
        let pending = Message::pending(client_id.clone(), content.to_string(), parent_id);

        {
            let mut store = store.write().await;
            match &pending.parent_id {
                None => store.add(pending.clone()),
                Some(parent) => store.add_reply(parent, pending.clone()),
            }
        }

        self.submit_and_settle(store, &pending).await;
        client_id
    }

    /// Run the submit attempt and record its outcome on the placeholder.
    /// Nothing propagates past here; failure is a flag plus a toast.
    async fn submit_and_settle(&self, store: &RwLock<MessageStore>, pending: &Message) {
        if let Err(e) = self.submit(pending).await {
            warn!("submit of {} failed: {e}", pending.id);
            store.write().await.update_message_by_id(
                &pending.id,
                pending.parent_id.as_deref(),
                |m| Some(m.with_delivery_status(DeliveryStatus::SendFailed)),
            );
            self.bus.emit_lossy(QnaEvent::ToastRequested {
                kind: ToastKind::Error,
                text: "Your message could not be sent".to_string(),
                timestamp: time::now(),
            });
        }
    }

    async fn submit(&self, pending: &Message) -> Result<String> {
        if self.entry_id.is_empty() {
            return Err(Error::InvalidState("no entry id configured".to_string()));
        }
        if self.user_id.is_empty() {
            return Err(Error::InvalidState("no user id configured".to_string()));
        }
        let request = SubmitRequest {
            entry_id: self.entry_id.clone(),
            client_id: pending.id.clone(),
            text: pending.content.clone(),
            parent_id: pending.parent_id.clone(),
            thread_creator_id: self.user_id.clone(),
            start_time_ms: pending.start_time_ms,
        };
        self.api.submit_cue_point(&request).await
    }
}
