//! Generic fallback for unrecognized JSON: serialize the whole value and
//! pre-split it on JSON key boundaries so each piece stays retrieval-sized.

use serde_json::Value;

use crate::types::{Document, SourceType};

/// Boundary the size-based splitter prefers: the start of a top-indented
/// JSON key in the pretty serialization.
const KEY_MARKER: &str = "\n  \"";

pub fn extract_with_size(value: &Value, filename: &str, chunk_size: usize) -> Vec<Document> {
    let content =
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());

    split_generic(&content, chunk_size)
        .into_iter()
        .map(|piece| Document::new(SourceType::Unknown, filename, piece))
        .collect()
}

pub fn extract(value: &Value, filename: &str) -> Vec<Document> {
    extract_with_size(value, filename, 800)
}

/// Accumulate key-delimited sections into a running buffer, flushing
/// whenever the next section would push it past `chunk_size`.
fn split_generic(content: &str, chunk_size: usize) -> Vec<String> {
    if content.len() <= chunk_size {
        return vec![content.to_string()];
    }

    let mut pieces = Vec::new();
    let mut current = String::new();

    for section in content.split(KEY_MARKER) {
        if current.len() + section.len() > chunk_size {
            if !current.is_empty() {
                pieces.push(current.trim().to_string());
            }
            current = section.to_string();
        } else if current.is_empty() {
            current = section.to_string();
        } else {
            current.push_str(KEY_MARKER);
            current.push_str(section);
        }
    }

    if !current.is_empty() {
        pieces.push(current.trim().to_string());
    }

    pieces
}
