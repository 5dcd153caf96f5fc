//! Outbound submit protocol
//!
//! The adapters only depend on the semantic contract: one logical
//! submission in, one server cue-point id out (or an error). The wire
//! client lives behind [`CuePointApi`] so tests and alternative hosts can
//! swap the transport.

pub mod client;

pub use client::QnaApiClient;

use crate::error::Result;
use async_trait::async_trait;

/// One logical cue-point submission
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub entry_id: String,

    /// Client-chosen id; the server echoes it back on the inbound push as
    /// the pending-message ack key
    pub client_id: String,

    pub text: String,

    /// Thread root this submission replies to, when it is a reply
    pub parent_id: Option<String>,

    pub thread_creator_id: String,

    pub start_time_ms: u64,
}

/// Transport-independent submit boundary
#[async_trait]
pub trait CuePointApi: Send + Sync {
    /// Submit one annotation cue point with its metadata
    ///
    /// Returns the server-assigned cue-point id. Any failed step of the
    /// composite request, or a missing dependent id, fails the whole
    /// submission.
    async fn submit_cue_point(&self, request: &SubmitRequest) -> Result<String>;
}
