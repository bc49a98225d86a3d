use crate::types::ImageMetadata;
use log::debug;

const URL_MARKER: &str = "\"url\":\"";
const TITLE_MARKER: &str = "\"title\":\"";

/// Returns the string value following `marker`, up to the next double quote.
///
/// This is a plain substring scan over the archive response, not a JSON parser:
/// the first occurrence of the marker wins and escapes are not interpreted.
fn extract_quoted(body: &str, marker: &str) -> String {
    let Some(start) = body.find(marker).map(|pos| pos + marker.len()) else {
        return String::new();
    };
    match body[start..].find('"') {
        Some(len) => body[start..start + len].to_string(),
        None => String::new(),
    }
}

pub fn extract_url(body: &str) -> String {
    extract_quoted(body, URL_MARKER)
}

pub fn extract_title(body: &str) -> String {
    extract_quoted(body, TITLE_MARKER)
}

pub fn parse_metadata(body: &[u8]) -> ImageMetadata {
    let text = String::from_utf8_lossy(body);
    let title = extract_title(&text);
    let metadata = ImageMetadata {
        url: extract_url(&text),
        title: Some(title).filter(|s| !s.is_empty()),
    };
    debug!("Parsed metadata: {:?}", metadata);
    metadata
}
