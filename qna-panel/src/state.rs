//! Shared playback-facing state
//!
//! Thread-safe state the plugin entry points read and write: the last
//! observed virtual-clock timestamp, the latest player status snapshot,
//! and the flags that gate one-shot behavior.

use crate::gateway::PlayerStatus;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// Shared state accessible by all plugin entry points
///
/// Uses RwLock for concurrent read access with rare writes.
pub struct SharedState {
    /// Last virtual-clock timestamp observed from timed metadata
    /// (epoch milliseconds); `None` until the first cue arrives
    pub virtual_time_ms: RwLock<Option<u64>>,

    /// Latest player status snapshot
    pub player: RwLock<PlayerStatus>,

    /// Whether any message data has ever arrived (gates the loading
    /// give-up timer)
    data_seen: AtomicBool,

    /// Whether `register` has already run
    registered: AtomicBool,
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            virtual_time_ms: RwLock::new(None),
            player: RwLock::new(PlayerStatus::default()),
            data_seen: AtomicBool::new(false),
            registered: AtomicBool::new(false),
        }
    }

    pub fn mark_data_seen(&self) {
        self.data_seen.store(true, Ordering::SeqCst);
    }

    pub fn data_seen(&self) -> bool {
        self.data_seen.load(Ordering::SeqCst)
    }

    /// Flip to registered; true when this call did the flip
    pub fn try_register(&self) -> bool {
        !self.registered.swap(true, Ordering::SeqCst)
    }

    /// Clear per-media state (virtual clock and data flag); registration
    /// survives media changes
    pub async fn reset_media(&self) {
        *self.virtual_time_ms.write().await = None;
        *self.player.write().await = PlayerStatus::default();
        self.data_seen.store(false, Ordering::SeqCst);
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_one_shot() {
        let state = SharedState::new();
        assert!(state.try_register());
        assert!(!state.try_register());
    }

    #[tokio::test]
    async fn test_reset_media_keeps_registration() {
        let state = SharedState::new();
        state.try_register();
        state.mark_data_seen();
        *state.virtual_time_ms.write().await = Some(1234);

        state.reset_media().await;

        assert_eq!(*state.virtual_time_ms.read().await, None);
        assert!(!state.data_seen());
        assert!(!state.try_register());
    }
}
