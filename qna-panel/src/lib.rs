//! # Live-Stream Q&A Panel (qna-panel)
//!
//! Plugin machinery for a live-stream question-and-answer panel.
//!
//! **Purpose:** Parse pushed annotation cue points into typed messages,
//! keep a threaded message store, reconcile time-windowed banners against
//! the stream's virtual clock, and submit viewer questions back upstream.
//!
//! **Architecture:** Event-driven core around an [`qna_common::EventBus`];
//! the host forwards push batches, timed-metadata cues, and player status
//! into [`QnaPlugin`], which fans them out to the adapters.

pub mod adapters;
pub mod api;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod model;
pub mod plugin;
pub mod state;
pub mod store;

pub use error::{Error, Result};
pub use plugin::QnaPlugin;
pub use state::SharedState;
pub use store::MessageStore;
