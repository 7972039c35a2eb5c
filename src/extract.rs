//! Locate a JSON object embedded in free text
//!
//! Models often wrap JSON in prose or code fences. The scanner tracks
//! brace depth outside string literals so nested objects and quoted
//! braces do not end the object early.

use serde_json::Value;

/// Find and parse the first balanced `{...}` object in `text`.
///
/// Candidates that balance but fail to parse are skipped and scanning
/// resumes after their opening brace.
pub fn extract_json_object(text: &str) -> Option<Value> {
    let mut from = 0;
    while let Some(offset) = text[from..].find('{') {
        let start = from + offset;
        if let Some(end) = balanced_end(&text[start..])
            && let Ok(value) = serde_json::from_str::<Value>(&text[start..start + end])
            && value.is_object()
        {
            return Some(value);
        }
        from = start + 1;
    }
    None
}

/// Byte length of the balanced object at the start of `text`
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }

    None
}
