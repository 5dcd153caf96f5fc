//! Message types shared across the panel crates
//!
//! A [`Message`] is the typed form of one annotation cue point: a viewer
//! question, a moderator answer, an announcement, or an answer-on-air
//! banner. Thread roots own their replies; a reply never appears at the
//! top level.

use crate::{time, Error};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Message kind, from the `Type` tag of the metadata XML
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    Question,
    Answer,
    Announcement,
    AnswerOnAir,
}

impl FromStr for MessageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "Question" => Ok(MessageKind::Question),
            "Answer" => Ok(MessageKind::Answer),
            "Announcement" => Ok(MessageKind::Announcement),
            "AnswerOnAir" => Ok(MessageKind::AnswerOnAir),
            other => Err(Error::Parse(format!("unknown message type: {other}"))),
        }
    }
}

/// Message state, from the optional `State` tag of the metadata XML
///
/// `Deleted` is a removal signal: the holder of the message must splice it
/// out of its collection, never flag it in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MessageState {
    Pending,
    Answered,
    Deleted,
    #[default]
    None,
}

impl FromStr for MessageState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "Pending" => Ok(MessageState::Pending),
            "Answered" => Ok(MessageState::Answered),
            "Deleted" => Ok(MessageState::Deleted),
            "None" => Ok(MessageState::None),
            other => Err(Error::Parse(format!("unknown message state: {other}"))),
        }
    }
}

/// Client-only lifecycle tag for messages the local user authored
///
/// Never set on remote messages. `Sending → Created` happens implicitly
/// when the server ack arrives as a normal inbound push; `SendFailed` is
/// terminal unless the user resends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryStatus {
    Created,
    Sending,
    SendFailed,
}

/// One Q&A message, with its reply thread when it is a root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Stable server identity; the dedup key everywhere
    pub id: String,

    /// Server wall-clock time at creation (epoch milliseconds). Used both
    /// as the engine scheduling input and for display sort.
    pub start_time_ms: u64,

    /// End of the display window for banner-style messages
    pub end_time_ms: Option<u64>,

    pub kind: MessageKind,

    pub state: MessageState,

    /// Back-reference to the thread root; `None` means this is a root
    pub parent_id: Option<String>,

    pub content: String,

    /// Replies owned by this root, ascending by creation time
    pub replies: Vec<Message>,

    /// Set only on locally authored messages
    pub delivery_status: Option<DeliveryStatus>,

    /// Client-generated id of the local placeholder this server message
    /// supersedes, when present
    pub pending_message_id: Option<String>,

    /// This message is a moderator auto-reply (derived from cue-point tags)
    pub auto_reply: bool,

    /// A moderator auto-reply promised this question will be answered on air
    pub will_be_answered_on_air: bool,

    /// An answer arrived that the viewer has not opened the panel for yet
    pub unread: bool,
}

impl Message {
    /// Construct a locally authored, not-yet-acknowledged message
    ///
    /// Skips XML parsing entirely; locally authored messages are always
    /// question-typed (top-level questions and thread follow-ups alike).
    pub fn pending(id: String, content: String, parent_id: Option<String>) -> Self {
        Self {
            id,
            start_time_ms: time::now_ms(),
            end_time_ms: None,
            kind: MessageKind::Question,
            state: MessageState::Pending,
            parent_id,
            content,
            replies: Vec::new(),
            delivery_status: Some(DeliveryStatus::Sending),
            pending_message_id: None,
            auto_reply: false,
            will_be_answered_on_air: false,
            unread: false,
        }
    }

    /// True for top-level thread roots
    pub fn is_thread_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// True when this message is a removal signal
    pub fn is_deleted(&self) -> bool {
        self.state == MessageState::Deleted
    }

    /// Copy with a different delivery status (for store modifiers)
    pub fn with_delivery_status(&self, status: DeliveryStatus) -> Self {
        let mut updated = self.clone();
        updated.delivery_status = Some(status);
        updated
    }
}
