//! Key transport over a URL fragment.
//!
//! Everything after `#` in a locator stays with the user agent: HTTP
//! clients strip the fragment before building the request line, so the
//! server never observes the key. Nothing in this module — or anywhere
//! else — may move the fragment into a path, query string, header, or log.

/// Appends `key_b64` to `base` after a fragment delimiter.
pub fn encode_into_locator(base: &str, key_b64: &str) -> String {
    format!("{base}#{key_b64}")
}

/// Extracts the fragment payload, or `None` when the locator carries none.
pub fn decode_from_locator(locator: &str) -> Option<&str> {
    match locator.split_once('#') {
        Some((_, fragment)) if !fragment.is_empty() => Some(fragment),
        _ => None,
    }
}

/// The part of a locator an HTTP client actually transmits.
pub fn request_target(locator: &str) -> &str {
    locator
        .split_once('#')
        .map(|(target, _)| target)
        .unwrap_or(locator)
}
