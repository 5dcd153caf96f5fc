//! Push-notification gateway boundary
//!
//! The gateway itself (transport, reconnect, backoff) is external; this
//! module owns only its event contract: the shape of raw pushed annotation
//! batches and the timed-metadata cues that drive the virtual clock.

use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Discriminator carried by raw push objects that are annotation cue points
pub const CUE_POINT_OBJECT_TYPE: &str = "KalturaAnnotation";

/// Related-object key under which the metadata XML document is attached
pub const RESPONSE_PROFILE_KEY: &str = "QandA_ResponseProfile";

/// Cue value key whose payload carries the embedded stream timestamp
pub const TIMESTAMP_CUE_KEY: &str = "TEXT";

/// One raw annotation cue point as delivered by the push gateway
#[derive(Debug, Clone, Deserialize)]
pub struct RawCuePoint {
    #[serde(rename = "objectType")]
    pub object_type: String,

    pub id: String,

    #[serde(rename = "entryId")]
    pub entry_id: Option<String>,

    /// Server creation time, epoch seconds
    #[serde(rename = "createdAt")]
    pub created_at: u64,

    pub text: Option<String>,

    pub tags: Option<String>,

    /// Echo of the client-chosen id used when the cue point was submitted;
    /// matches the local pending placeholder it acknowledges
    #[serde(rename = "systemName")]
    pub system_name: Option<String>,

    #[serde(rename = "relatedObjects")]
    pub related_objects: Option<HashMap<String, RelatedObjectList>>,
}

/// List wrapper for related objects attached to a cue point
#[derive(Debug, Clone, Deserialize)]
pub struct RelatedObjectList {
    #[serde(default)]
    pub objects: Vec<MetadataObject>,
}

/// One attached metadata object carrying the XML blob
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataObject {
    #[serde(default)]
    pub xml: String,
}

/// Decode a raw push batch into annotation cue points
///
/// Only objects carrying the annotation discriminator are considered;
/// anything else in the batch belongs to other features and is skipped
/// silently. Malformed annotation objects are dropped with a warning,
/// never propagated as fatal.
pub fn decode_batch(batch: &[serde_json::Value]) -> Vec<RawCuePoint> {
    let mut cue_points = Vec::new();
    for raw in batch {
        let is_annotation = raw
            .get("objectType")
            .and_then(|v| v.as_str())
            .map(|t| t == CUE_POINT_OBJECT_TYPE)
            .unwrap_or(false);
        if !is_annotation {
            continue;
        }
        match serde_json::from_value::<RawCuePoint>(raw.clone()) {
            Ok(cue_point) => cue_points.push(cue_point),
            Err(e) => warn!("dropping malformed annotation cue point: {e}"),
        }
    }
    cue_points
}

/// One timed-metadata cue encountered during playback
#[derive(Debug, Clone, Deserialize)]
pub struct TimedMetadataCue {
    pub value: Option<CueValue>,
}

/// Key/data pair inside a timed-metadata cue
#[derive(Debug, Clone, Deserialize)]
pub struct CueValue {
    pub key: String,
    #[serde(default)]
    pub data: String,
}

#[derive(Debug, Deserialize)]
struct TimestampPayload {
    timestamp: u64,
}

/// Extract the virtual-clock timestamp from a batch of timed-metadata cues
///
/// Only `TEXT`-keyed entries are considered, and among those the last one's
/// payload is JSON-parsed for a `timestamp` field. Malformed JSON is
/// ignored, not fatal.
pub fn extract_virtual_time(cues: &[TimedMetadataCue]) -> Option<u64> {
    let payload = cues
        .iter()
        .filter_map(|c| c.value.as_ref())
        .filter(|v| v.key == TIMESTAMP_CUE_KEY)
        .next_back()?;

    match serde_json::from_str::<TimestampPayload>(&payload.data) {
        Ok(parsed) => Some(parsed.timestamp),
        Err(e) => {
            debug!("ignoring unparseable timestamp cue: {e}");
            None
        }
    }
}

/// Player-facing queries the panel consumes
///
/// Used only for the live-edge eligibility check; playback position and
/// duration share the virtual-clock millisecond domain.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerStatus {
    pub position_ms: u64,
    pub duration_ms: u64,
    pub is_live: bool,
}

impl PlayerStatus {
    /// True when the viewer is watching strictly live, within `tolerance_ms`
    /// of the stream's live duration edge
    pub fn at_live_edge(&self, tolerance_ms: u64) -> bool {
        self.is_live && self.duration_ms.saturating_sub(self.position_ms) <= tolerance_ms
    }
}
