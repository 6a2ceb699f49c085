//! Notes property helpers
//!
//! Notes are a rich text property treated as a list of lines. Appending keeps
//! every existing line and skips lines that are already present.

use serde_json::{json, Value};

/// Maximum characters Notion accepts in a single rich text object.
pub const RICH_TEXT_LIMIT: usize = 2000;

/// Plain text of a rich text or title property value.
///
/// Fragments are concatenated in order; `text.content` is used when a
/// fragment has no `plain_text` (request-shaped values).
pub fn plain_text(property: &Value, kind: &str) -> String {
    property
        .get(kind)
        .and_then(Value::as_array)
        .map(|fragments| {
            fragments
                .iter()
                .filter_map(|f| {
                    f.get("plain_text")
                        .and_then(Value::as_str)
                        .or_else(|| f.pointer("/text/content").and_then(Value::as_str))
                })
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// Existing lines of a Notes property value.
pub fn read_notes_lines(property: &Value) -> Vec<String> {
    plain_text(property, "rich_text")
        .lines()
        .map(|l| l.trim_end().to_string())
        .filter(|l| !l.trim().is_empty())
        .collect()
}

/// Text after appending `line`, or `None` when there is nothing to write.
pub fn merge_notes(existing: &[String], line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() || existing.iter().any(|l| l.trim() == line) {
        return None;
    }

    let mut lines: Vec<&str> = existing.iter().map(String::as_str).collect();
    lines.push(line);
    Some(lines.join("\n"))
}

/// Split text into rich text objects of at most [`RICH_TEXT_LIMIT`] characters.
pub fn rich_text_chunks(text: &str) -> Vec<Value> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(RICH_TEXT_LIMIT)
        .map(|chunk| {
            let content: String = chunk.iter().collect();
            json!({ "type": "text", "text": { "content": content } })
        })
        .collect()
}
