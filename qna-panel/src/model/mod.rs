//! Message model: raw annotation → typed [`Message`]
//!
//! Parsing fails closed: a cue point without its metadata XML, with an
//! empty related-object list, or with an unknown `Type`/`State` value is an
//! error. Callers drop such items with a warning rather than defaulting.

pub mod metadata;

use crate::error::{Error, Result};
use crate::gateway::{RawCuePoint, RESPONSE_PROFILE_KEY};
use qna_common::{Message, MessageKind, MessageState, QnaConfig};

/// Parse one raw annotation cue point into a typed message
pub fn parse_message(raw: &RawCuePoint, config: &QnaConfig) -> Result<Message> {
    let xml = metadata_xml(raw)?;

    let kind = metadata::tag_text(xml, "Type")?
        .ok_or_else(|| Error::Parse(format!("cue point {}: metadata has no Type tag", raw.id)))?
        .parse::<MessageKind>()
        .map_err(Error::Common)?;

    let state = match metadata::tag_text(xml, "State")? {
        Some(s) => s.parse::<MessageState>().map_err(Error::Common)?,
        None => MessageState::None,
    };

    // ThreadId is used instead of a native parent-reference field because
    // moderator-authored messages never populate one.
    let parent_id = metadata::tag_text(xml, "ThreadId")?.filter(|s| !s.is_empty());

    let start_time_ms = raw.created_at * 1000;
    let end_time_ms = match kind {
        MessageKind::AnswerOnAir => Some(start_time_ms + config.answer_on_air_window_ms),
        _ => None,
    };

    Ok(Message {
        id: raw.id.clone(),
        start_time_ms,
        end_time_ms,
        kind,
        state,
        parent_id,
        content: raw.text.clone().unwrap_or_default(),
        replies: Vec::new(),
        delivery_status: None,
        pending_message_id: raw.system_name.clone().filter(|s| !s.is_empty()),
        auto_reply: has_auto_reply_tag(raw.tags.as_deref()),
        will_be_answered_on_air: false,
        unread: false,
    })
}

/// Cue-point tag marking moderator auto-replies
pub const AUTO_REPLY_TAG: &str = "qna-auto-reply";

fn has_auto_reply_tag(tags: Option<&str>) -> bool {
    tags.map(|t| t.split(',').any(|tag| tag.trim() == AUTO_REPLY_TAG))
        .unwrap_or(false)
}

/// Locate the metadata XML blob attached to the cue point
fn metadata_xml(raw: &RawCuePoint) -> Result<&str> {
    let related = raw
        .related_objects
        .as_ref()
        .ok_or_else(|| Error::Parse(format!("cue point {}: no related objects", raw.id)))?;
    let profile = related.get(RESPONSE_PROFILE_KEY).ok_or_else(|| {
        Error::Parse(format!("cue point {}: no {RESPONSE_PROFILE_KEY} object", raw.id))
    })?;
    let object = profile
        .objects
        .first()
        .ok_or_else(|| Error::Parse(format!("cue point {}: empty metadata object list", raw.id)))?;
    Ok(&object.xml)
}
