const THUMB_PREFIX: &str = "th?id=";
const HIGH_RES_PREFIX: &str = "OHR.";
const FORBIDDEN_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Strips `prefix` only when something is left behind.
fn strip_non_empty<'a>(segment: &'a str, prefix: &str) -> &'a str {
    match segment.strip_prefix(prefix) {
        Some(rest) if !rest.is_empty() => rest,
        _ => segment,
    }
}

pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if FORBIDDEN_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Turns an archive image URL into a local filename.
///
/// `https://www.bing.com/th?id=OHR.Name_EN-US123.jpg&rf=x` becomes
/// `Name_EN-US123.jpg`. Falls back to `bing_image_<index>.jpg` when nothing
/// usable remains, so the result is never empty.
pub fn derive_filename(url: &str, index: usize) -> String {
    let segment = match url.rfind('/') {
        Some(pos) => &url[pos + 1..],
        None => url,
    };
    let segment = strip_non_empty(segment, THUMB_PREFIX);
    let segment = match segment.find(['?', '&']) {
        Some(cut) => &segment[..cut],
        None => segment,
    };
    let segment = strip_non_empty(segment, HIGH_RES_PREFIX);

    let name = sanitize_filename(segment);
    if name.is_empty() {
        format!("bing_image_{}.jpg", index)
    } else {
        name
    }
}
