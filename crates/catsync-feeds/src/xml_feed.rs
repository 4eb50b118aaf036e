//! XML product feeds: one element per record, one child element per field.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::FeedError;
use crate::record::RawRecord;

/// Parses every `<record_element>` in `xml` into a [`RawRecord`].
///
/// Direct children become fields. Text nested deeper is collected under the
/// direct child that contains it, so `<images><image>a</image><image>b</image></images>`
/// yields `images = [a, b]`.
///
/// # Errors
///
/// Returns [`FeedError::Xml`] for malformed XML.
pub fn parse_xml(xml: &str, record_element: &str) -> Result<Vec<RawRecord>, FeedError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut records = Vec::new();
    let mut current: Option<RawRecord> = None;
    // Element names below the record element; `path[0]` is the field.
    let mut path: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if let Some(record) = current.as_mut() {
                    if path.is_empty() {
                        record.touch(&name);
                    }
                    path.push(name);
                } else if name == record_element {
                    current = Some(RawRecord::new());
                    path.clear();
                }
            }
            Ok(Event::Empty(e)) => {
                if let Some(record) = current.as_mut() {
                    if path.is_empty() {
                        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                        record.touch(&name);
                    }
                }
            }
            Ok(Event::End(_)) => {
                if current.is_some() && path.pop().is_none() {
                    if let Some(record) = current.take() {
                        records.push(record);
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if let (Some(record), Some(field)) = (current.as_mut(), path.first()) {
                    let text = e.unescape().unwrap_or_default();
                    record.push(field, &text);
                }
            }
            Ok(Event::CData(e)) => {
                if let (Some(record), Some(field)) = (current.as_mut(), path.first()) {
                    let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                    record.push(field, &text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(FeedError::Xml(e)),
            _ => {}
        }
    }

    tracing::debug!(records = records.len(), record_element, "parsed XML feed");
    Ok(records)
}
