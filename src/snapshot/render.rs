//! Display rendering for entry values.
//!
//! Formats are stable:
//! - string: the raw value
//! - list and sorted set: `[a, b, c]` in store order
//! - set: `[a, b, c]` sorted lexicographically
//! - hash: `{f1: v1, f2: v2}` sorted by field
//! - stream: `<stream: N entries>`

use crate::error::{EngineError, Result};

/// Suffix appended to truncated displays.
pub const TRUNCATION_MARKER: &str = "...";

/// Decodes raw bytes as UTF-8, naming the key on failure.
pub fn decode(key: &str, bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|_| {
        EngineError::ValueMissing(format!("value of `{}` is not valid UTF-8", key))
    })
}

/// Decodes every element of a collection.
pub fn decode_all(key: &str, items: Vec<Vec<u8>>) -> Result<Vec<String>> {
    items.into_iter().map(|item| decode(key, item)).collect()
}

/// Renders an ordered listing.
pub fn listing(items: &[String]) -> String {
    format!("[{}]", items.join(", "))
}

/// Renders an unordered listing in sorted order.
pub fn sorted_listing(mut items: Vec<String>) -> String {
    items.sort();
    listing(&items)
}

/// Renders hash fields as `{field: value}` pairs sorted by field.
pub fn hash_listing(mut pairs: Vec<(String, String)>) -> String {
    pairs.sort();
    let body = pairs
        .iter()
        .map(|(field, value)| format!("{}: {}", field, value))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{}}}", body)
}

/// Placeholder for stream keys, whose entries are not rendered.
pub fn stream_placeholder(len: u64) -> String {
    format!("<stream: {} entries>", len)
}

/// Caps a display at `max_chars` characters, marking the cut.
pub fn truncate(display: String, max_chars: Option<usize>) -> String {
    let Some(max) = max_chars else {
        return display;
    };
    match display.char_indices().nth(max) {
        Some((cut, _)) => {
            let mut out = display[..cut].to_string();
            out.push_str(TRUNCATION_MARKER);
            out
        }
        None => display,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_listing_keeps_order() {
        assert_eq!(listing(&strings(&["x", "y"])), "[x, y]");
        assert_eq!(listing(&[]), "[]");
    }

    #[test]
    fn test_sorted_listing() {
        assert_eq!(sorted_listing(strings(&["b", "c", "a"])), "[a, b, c]");
    }

    #[test]
    fn test_hash_listing() {
        let pairs = vec![
            ("name".to_string(), "ada".to_string()),
            ("age".to_string(), "36".to_string()),
        ];
        assert_eq!(hash_listing(pairs), "{age: 36, name: ada}");
        assert_eq!(hash_listing(Vec::new()), "{}");
    }

    #[test]
    fn test_decode_invalid_utf8() {
        let err = decode("bin", vec![0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, EngineError::ValueMissing(msg) if msg.contains("bin")));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello".to_string(), Some(10)), "hello");
        assert_eq!(truncate("hello".to_string(), Some(5)), "hello");
        assert_eq!(truncate("hello".to_string(), Some(3)), "hel...");
        assert_eq!(truncate("hello".to_string(), None), "hello");
    }

    #[test]
    fn test_truncate_on_char_boundary() {
        assert_eq!(truncate("héllo".to_string(), Some(2)), "hé...");
    }

    #[test]
    fn test_stream_placeholder() {
        assert_eq!(stream_placeholder(3), "<stream: 3 entries>");
    }
}
