//! First-page extraction from a Figma file response.

use serde_json::{json, Value};

/// Returned as `data` when the document has no pages.
pub fn no_pages() -> Value {
    json!({
        "no_pages": true,
        "message": "No pages found in document",
    })
}

/// Narrows a file response (`{document: {children: [...]}}`) to its first
/// top-level page.
pub fn first_page(file: &Value) -> Value {
    file.get("document")
        .and_then(|doc| doc.get("children"))
        .and_then(Value::as_array)
        .and_then(|pages| pages.first())
        .cloned()
        .unwrap_or_else(no_pages)
}
