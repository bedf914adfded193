//! Pointer resolution over a generic JSON tree.
//!
//! Pointers are `/`-joined sequences of object keys and array indices,
//! escaped as JSON Pointer tokens (`~0` for `~`, `~1` for `/`). The empty
//! string addresses the root.

use serde_json::Value;
use std::borrow::Cow;

/// Pointer addressing the tree root.
pub const ROOT: &str = "";

/// Resolves a pointer against a root value.
///
/// Never fails: malformed pointers, missing keys and out-of-range indices
/// all resolve to `None`.
///
/// # Example
///
/// ```ignore
/// let tree = json!({"document": {"pages": [{"name": "Page 1"}]}});
/// assert_eq!(resolve("/document/pages/0/name", &tree), Some(&json!("Page 1")));
/// ```
#[must_use]
pub fn resolve<'a>(pointer: &str, root: &'a Value) -> Option<&'a Value> {
    root.pointer(pointer)
}

/// Returns the pointer one level up.
///
/// A top-level pointer yields [`ROOT`]; the root itself has no parent.
#[must_use]
pub fn parent_of(pointer: &str) -> Option<&str> {
    if pointer.is_empty() {
        return None;
    }
    pointer.rfind('/').map(|idx| &pointer[..idx])
}

/// Appends one escaped segment to a pointer.
#[must_use]
pub fn child(pointer: &str, segment: &str) -> String {
    format!("{pointer}/{}", escape(segment))
}

/// Appends an array index to a pointer.
#[must_use]
pub fn child_index(pointer: &str, index: usize) -> String {
    format!("{pointer}/{index}")
}

fn escape(segment: &str) -> Cow<'_, str> {
    if segment.contains(['~', '/']) {
        Cow::Owned(segment.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(segment)
    }
}
