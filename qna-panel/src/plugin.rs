//! Plugin lifecycle
//!
//! [`QnaPlugin`] is the host-facing surface: the host forwards raw push
//! batches, timed-metadata cues, player status, and media lifecycle calls;
//! the plugin fans them out to the store and the three adapters. All
//! services are constructed explicitly and injected; nothing is ambient.

use crate::adapters::{AnnouncementAdapter, AnswerOnAirAdapter, ChatAdapter};
use crate::api::CuePointApi;
use crate::gateway::{self, PlayerStatus, TimedMetadataCue};
use crate::model;
use crate::state::SharedState;
use crate::store::MessageStore;
use qna_common::{time, EventBus, Message, QnaConfig, QnaEvent};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

pub struct QnaPlugin {
    config: QnaConfig,
    bus: EventBus,
    state: Arc<SharedState>,
    store: RwLock<MessageStore>,
    announcements: AnnouncementAdapter,
    chat: ChatAdapter,
    on_air: RwLock<AnswerOnAirAdapter>,
}

impl QnaPlugin {
    pub fn new(
        config: QnaConfig,
        api: Arc<dyn CuePointApi>,
        entry_id: String,
        user_id: String,
    ) -> Self {
        let bus = EventBus::new(256);
        Self {
            announcements: AnnouncementAdapter::new(bus.clone(), config.recency_window_ms),
            chat: ChatAdapter::new(
                bus.clone(),
                api,
                entry_id,
                user_id,
                config.recency_window_ms,
            ),
            on_air: RwLock::new(AnswerOnAirAdapter::new(
                bus.clone(),
                config.seek_threshold_ms,
                config.live_edge_tolerance_ms,
            )),
            store: RwLock::new(MessageStore::new(bus.clone())),
            state: Arc::new(SharedState::new()),
            bus,
            config,
        }
    }

    /// Activate the plugin and start the loading give-up timer
    ///
    /// Calling twice is a no-op; the first registration wins.
    pub fn register(&self) {
        if !self.state.try_register() {
            warn!("register called twice; ignoring");
            return;
        }
        info!("qna panel registered");
        self.spawn_loading_timer();
    }

    /// Subscribe to panel events
    pub fn subscribe(&self) -> broadcast::Receiver<QnaEvent> {
        self.bus.subscribe()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }

    /// Current top-level threads in display order
    pub async fn threads(&self) -> Vec<Message> {
        self.store.read().await.threads()
    }

    /// Ingest one raw push batch
    pub async fn on_push_batch(&self, batch: &[Value]) {
        let messages: Vec<Message> = gateway::decode_batch(batch)
            .iter()
            .filter_map(|raw| match model::parse_message(raw, &self.config) {
                Ok(message) => Some(message),
                Err(e) => {
                    warn!("dropping unparseable cue point: {e}");
                    None
                }
            })
            .collect();
        if messages.is_empty() {
            return;
        }
        self.state.mark_data_seen();
        debug!("push batch: {} message(s)", messages.len());

        let now_wall_ms = time::now_ms();
        let mut store = self.store.write().await;
        self.chat.on_messages(&mut store, &messages, now_wall_ms);
        self.announcements.on_messages(&mut store, &messages, now_wall_ms);
        self.on_air.write().await.on_messages(&mut store, &messages);
    }

    /// Ingest one batch of timed-metadata cues (virtual-clock ticks)
    pub async fn on_timed_metadata(&self, cues: &[TimedMetadataCue]) {
        let Some(virtual_ms) = gateway::extract_virtual_time(cues) else {
            return;
        };
        *self.state.virtual_time_ms.write().await = Some(virtual_ms);

        let player = *self.state.player.read().await;
        let mut store = self.store.write().await;
        self.on_air
            .write()
            .await
            .on_clock_tick(&mut store, virtual_ms, player);
    }

    /// Record the latest player status snapshot
    pub async fn on_player_status(&self, status: PlayerStatus) {
        *self.state.player.write().await = status;
    }

    /// Drop all per-media state when the media unloads
    pub async fn on_media_unload(&self) {
        info!("media unloaded; resetting panel state");
        self.store.write().await.reset();
        self.on_air.write().await.reset();
        self.state.reset_media().await;
    }

    /// Submit a new top-level question; returns the client-chosen id
    pub async fn send_question(&self, content: &str) -> String {
        self.chat.send_question(&self.store, content).await
    }

    /// Submit a follow-up under an existing thread
    pub async fn send_reply(&self, parent_id: &str, content: &str) -> String {
        self.chat.send_reply(&self.store, parent_id, content).await
    }

    /// Resend a previously failed message; returns the replacement id
    pub async fn resend(&self, failed_id: &str, parent_id: Option<&str>) -> Option<String> {
        self.chat.resend(&self.store, failed_id, parent_id).await
    }

    /// One-shot timer: if no message data arrives within the configured
    /// window, tell the presentation layer to drop its loading spinner.
    /// Purely presentational; data arriving later still renders normally.
    fn spawn_loading_timer(&self) {
        let state = self.state.clone();
        let bus = self.bus.clone();
        let give_up_ms = self.config.loading_give_up_ms;
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(give_up_ms)).await;
            if !state.data_seen() {
                debug!("no data within {give_up_ms} ms; signalling empty state");
                bus.emit_lossy(QnaEvent::PanelEmptyState {
                    timestamp: time::now(),
                });
            }
        });
    }
}
