//! Metadata XML tag extraction
//!
//! The metadata attached to an annotation cue point is a flat XML document;
//! the parser only ever needs the text content of a handful of known tags
//! (`Type`, `State`, `ThreadId`, `ThreadCreatorId`).

use crate::error::{Error, Result};
use quick_xml::events::Event;
use quick_xml::reader::Reader;

/// Text content of the first `tag` element in `xml`
///
/// Returns `Ok(None)` when the tag is absent; malformed XML is an error.
pub fn tag_text(xml: &str, tag: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_str(xml);
    let mut inside = false;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == tag.as_bytes() => {
                inside = true;
                text.clear();
            }
            Ok(Event::Text(e)) if inside => {
                let chunk = e
                    .unescape()
                    .map_err(|e| Error::Parse(format!("metadata XML text: {e}")))?;
                text.push_str(&chunk);
            }
            Ok(Event::End(e)) if inside && e.name().as_ref() == tag.as_bytes() => {
                return Ok(Some(text));
            }
            Ok(Event::Eof) => return Ok(None),
            Ok(_) => {}
            Err(e) => return Err(Error::Parse(format!("metadata XML: {e}"))),
        }
    }
}

/// Build the metadata XML blob the submit protocol attaches to a cue point
pub fn build_metadata_xml(
    kind: &str,
    thread_id: Option<&str>,
    thread_creator_id: &str,
) -> String {
    let thread_tag = thread_id
        .map(|id| format!("<ThreadId>{id}</ThreadId>"))
        .unwrap_or_default();
    format!(
        "<metadata><Type>{kind}</Type>{thread_tag}\
         <ThreadCreatorId>{thread_creator_id}</ThreadCreatorId></metadata>"
    )
}
