//! # Q&A Panel Common Library
//!
//! Shared code for the Q&A panel crates:
//! - Message types (the typed form of an annotation cue point)
//! - Event types (QnaEvent enum) and the EventBus
//! - Configuration loading
//! - Timestamp utilities

pub mod config;
pub mod error;
pub mod events;
pub mod message;
pub mod time;

pub use config::QnaConfig;
pub use error::{Error, Result};
pub use events::{EventBus, QnaEvent, ToastKind};
pub use message::{DeliveryStatus, Message, MessageKind, MessageState};
