//! Answer-on-air adapter
//!
//! Owns the engine candidate set for banner-style notifications. A
//! banner's eligibility depends on comparing its start time to the virtual
//! clock, so items arriving before the first clock tick are buffered and
//! flushed once a timestamp exists. Any candidate mutation rebuilds the
//! engine, deliberately resetting continuity so the next tick recomputes a
//! full snapshot regardless of whether the batch or the tick arrived
//! first.

use crate::engine::{CuepointEngine, TimeUpdate};
use crate::gateway::PlayerStatus;
use crate::store::MessageStore;
use qna_common::{time, EventBus, Message, MessageKind, QnaEvent};
use std::collections::HashSet;
use tracing::debug;

pub struct AnswerOnAirAdapter {
    bus: EventBus,
    seek_threshold_ms: u64,
    live_edge_tolerance_ms: u64,

    candidates: Vec<Message>,
    engine: CuepointEngine<Message>,

    /// Arrivals buffered until the first virtual-clock tick
    buffered: Vec<Message>,
    clock_seen: bool,

    /// Ids already inserted into the store, so repeated show/requery never
    /// duplicates entries
    inserted_ids: HashSet<String>,

    /// Id of the banner currently on screen
    current_banner: Option<String>,
}

impl AnswerOnAirAdapter {
    pub fn new(bus: EventBus, seek_threshold_ms: u64, live_edge_tolerance_ms: u64) -> Self {
        Self {
            bus,
            seek_threshold_ms,
            live_edge_tolerance_ms,
            candidates: Vec::new(),
            engine: CuepointEngine::new(Vec::new(), seek_threshold_ms),
            buffered: Vec::new(),
            clock_seen: false,
            inserted_ids: HashSet::new(),
            current_banner: None,
        }
    }

    /// Accept one parsed push batch
    ///
    /// Deletion signals take effect in the store immediately, even while
    /// banner candidates are still buffered pre-clock; only live arrivals
    /// wait for the first tick.
    pub fn on_messages(&mut self, store: &mut MessageStore, messages: &[Message]) {
        let incoming: Vec<Message> = messages
            .iter()
            .filter(|m| m.kind == MessageKind::AnswerOnAir)
            .cloned()
            .collect();
        if incoming.is_empty() {
            return;
        }

        for message in incoming.iter().filter(|m| m.is_deleted()) {
            store.delete_message(&message.id);
            self.inserted_ids.remove(&message.id);
            self.buffered.retain(|b| b.id != message.id);
            if self.current_banner.as_deref() == Some(message.id.as_str()) {
                self.hide_banner();
            }
        }

        if !self.clock_seen {
            let live: Vec<Message> = incoming.into_iter().filter(|m| !m.is_deleted()).collect();
            if !live.is_empty() {
                debug!("buffering {} banner(s) until first clock tick", live.len());
                self.buffered.extend(live);
            }
            return;
        }
        if self.reconcile(&incoming) {
            self.rebuild_engine();
        }
    }

    /// Process one virtual-clock tick
    pub fn on_clock_tick(&mut self, store: &mut MessageStore, virtual_ms: u64, player: PlayerStatus) {
        if !self.clock_seen {
            self.clock_seen = true;
            let buffered = std::mem::take(&mut self.buffered);
            if self.reconcile(&buffered) {
                self.rebuild_engine();
            }
        }

        // Strictly-live viewers see every real-time notification type; in a
        // DVR window only the banner type (itself a delayed republication)
        // remains meaningful.
        let at_edge = player.at_live_edge(self.live_edge_tolerance_ms);
        let filter = move |m: &Message| at_edge || m.kind == MessageKind::AnswerOnAir;

        match self.engine.update_time(virtual_ms, Some(&filter)) {
            TimeUpdate::Snapshot(active) => {
                match CuepointEngine::most_recent(&active).cloned() {
                    Some(banner) => self.show_banner(store, banner),
                    None => self.hide_banner(),
                }
            }
            TimeUpdate::Delta { show, hide } => {
                if let Some(current) = &self.current_banner {
                    if hide.iter().any(|m| &m.id == current) {
                        self.hide_banner();
                    }
                }
                if let Some(banner) = CuepointEngine::most_recent(&show).cloned() {
                    self.show_banner(store, banner);
                }
            }
        }
    }

    /// Drop all adapter state (media unload)
    pub fn reset(&mut self) {
        self.candidates.clear();
        self.buffered.clear();
        self.inserted_ids.clear();
        self.clock_seen = false;
        self.current_banner = None;
        self.rebuild_engine();
    }

    /// Fold one batch into the candidate set; true when anything changed
    ///
    /// Unknown live ids append; a deletion signal for a known id splices it
    /// out. Deletion signals for unknown ids are ignored.
    fn reconcile(&mut self, incoming: &[Message]) -> bool {
        let mut dirty = false;
        for message in incoming {
            let existing = self.candidates.iter().position(|c| c.id == message.id);
            match existing {
                Some(pos) if message.is_deleted() => {
                    self.candidates.remove(pos);
                    dirty = true;
                }
                None if !message.is_deleted() => {
                    self.candidates.push(message.clone());
                    dirty = true;
                }
                _ => {}
            }
        }
        dirty
    }

    fn rebuild_engine(&mut self) {
        self.engine = CuepointEngine::new(self.candidates.clone(), self.seek_threshold_ms);
    }

    fn show_banner(&mut self, store: &mut MessageStore, banner: Message) {
        if self.current_banner.as_deref() != Some(banner.id.as_str()) {
            self.current_banner = Some(banner.id.clone());
            self.bus.emit_lossy(QnaEvent::AnswerOnAirShown {
                message: banner.clone(),
                timestamp: time::now(),
            });
        }
        // One-time store insert per banner id
        if self.inserted_ids.insert(banner.id.clone()) {
            store.add(banner);
        }
    }

    fn hide_banner(&mut self) {
        if let Some(id) = self.current_banner.take() {
            self.bus.emit_lossy(QnaEvent::AnswerOnAirHidden {
                id,
                timestamp: time::now(),
            });
        }
    }
}
