//! Tag extraction from SOAP response documents.

use quick_xml::events::Event;
use quick_xml::Reader;

/// Text content of the first element whose local name is `tag`.
///
/// Namespace prefixes are ignored (`<s:Status>` matches `Status`). An empty
/// element yields `Some("")`. Malformed documents yield whatever was found
/// before the error, or `None`.
pub fn extract_tag(xml: &str, tag: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut inside = false;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if !inside => {
                if local_name(e.name().as_ref()) == tag {
                    inside = true;
                }
            }
            Ok(Event::Empty(ref e)) if !inside => {
                if local_name(e.name().as_ref()) == tag {
                    return Some(String::new());
                }
            }
            Ok(Event::Text(ref e)) if inside => {
                text.push_str(&e.unescape().unwrap_or_default());
            }
            Ok(Event::CData(ref e)) if inside => {
                text.push_str(&String::from_utf8_lossy(e));
            }
            Ok(Event::End(ref e)) if inside => {
                if local_name(e.name().as_ref()) == tag {
                    return Some(text);
                }
            }
            Ok(Event::Eof) => return None,
            Err(e) => {
                log::debug!("XML parse error while looking for <{}>: {}", tag, e);
                return None;
            }
            _ => {}
        }
    }
}

/// Extract the local name from a possibly-namespaced XML tag.
fn local_name(raw: &[u8]) -> String {
    let s = String::from_utf8_lossy(raw);
    match s.rfind(':') {
        Some(pos) => s[pos + 1..].to_string(),
        None => s.to_string(),
    }
}
