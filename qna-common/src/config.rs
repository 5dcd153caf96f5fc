//! Panel configuration
//!
//! All timing windows the panel uses in one place. Values are milliseconds.
//! Defaults match the shipped design; a TOML fragment can override any
//! subset of fields.

use crate::{Error, Result};
use serde::Deserialize;

/// Q&A panel configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QnaConfig {
    /// Maximum forward/backward jump in virtual time between two consecutive
    /// clock ticks that is still treated as continuous playback. Anything
    /// larger is handled as a seek.
    pub seek_threshold_ms: u64,

    /// How close the playback position must be to the stream duration for
    /// the viewer to count as watching at the live edge.
    pub live_edge_tolerance_ms: u64,

    /// Messages created within this window of wall-clock "now" trigger
    /// toast/menu-indicator side effects. Older messages (backlog on initial
    /// load) stay silent.
    pub recency_window_ms: u64,

    /// Loading-spinner give-up timer: if no message data has arrived by
    /// then, the panel shows its empty state. Purely presentational.
    pub loading_give_up_ms: u64,

    /// Display window for answer-on-air banners: a banner's end time is its
    /// start time plus this window.
    pub answer_on_air_window_ms: u64,

    /// System name of the metadata profile used by the submit protocol
    pub metadata_profile_system_name: String,

    /// Tag marking cue points as belonging to the Q&A feature
    pub cue_point_tag: String,
}

impl Default for QnaConfig {
    fn default() -> Self {
        Self {
            seek_threshold_ms: 7000,
            live_edge_tolerance_ms: 2000,
            recency_window_ms: 5000,
            loading_give_up_ms: 3000,
            answer_on_air_window_ms: 60_000,
            metadata_profile_system_name: "Qna".to_string(),
            cue_point_tag: "qna".to_string(),
        }
    }
}

impl QnaConfig {
    /// Parse a configuration from a TOML fragment, filling unset fields
    /// with defaults
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| Error::Config(e.to_string()))
    }
}
