//! JSON Pointer (RFC 6901) conversion for tree paths.
//!
//! Pointers carry no type information, so every parsed step is a
//! [`PathStep::Key`]. Lookups accept canonical decimal keys against
//! sequences, which lets pointer-derived paths cross arrays.

use thiserror::Error;

use crate::types::{Path, PathStep};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PointerError {
    #[error("pointer {0:?} must be empty or start with '/'")]
    NotAbsolute(String),
}

/// Unescapes a JSON Pointer path component.
///
/// Per RFC 6901, `~1` is replaced with `/` and `~0` is replaced with `~`.
///
/// ```
/// use tree_grafter_path::unescape_component;
///
/// assert_eq!(unescape_component("a~0b"), "a~b");
/// assert_eq!(unescape_component("c~1d"), "c/d");
/// ```
pub fn unescape_component(component: &str) -> String {
    if !component.contains('~') {
        return component.to_string();
    }
    // ~1 before ~0, otherwise "~01" would decode to "/"
    component.replace("~1", "/").replace("~0", "~")
}

/// Escapes a JSON Pointer path component.
///
/// ```
/// use tree_grafter_path::escape_component;
///
/// assert_eq!(escape_component("a~b"), "a~0b");
/// assert_eq!(escape_component("c/d"), "c~1d");
/// ```
pub fn escape_component(component: &str) -> String {
    if !component.contains('/') && !component.contains('~') {
        return component.to_string();
    }
    component.replace('~', "~0").replace('/', "~1")
}

/// Parse a JSON Pointer string into a path.
///
/// The empty pointer is the root. Every other pointer must start with `/`.
///
/// ```
/// use tree_grafter_path::{parse_pointer, path};
///
/// assert_eq!(parse_pointer("").unwrap(), path![]);
/// assert_eq!(parse_pointer("/foo/0").unwrap(), path!["foo", "0"]);
/// assert!(parse_pointer("foo").is_err());
/// ```
pub fn parse_pointer(pointer: &str) -> Result<Path, PointerError> {
    if pointer.is_empty() {
        return Ok(Path::new());
    }
    let Some(rest) = pointer.strip_prefix('/') else {
        return Err(PointerError::NotAbsolute(pointer.to_string()));
    };
    Ok(rest
        .split('/')
        .map(|component| PathStep::Key(unescape_component(component)))
        .collect())
}

/// Format a path as a JSON Pointer string.
///
/// Returns an empty string for the root path.
///
/// ```
/// use tree_grafter_path::{format_pointer, path};
///
/// assert_eq!(format_pointer(&path![]), "");
/// assert_eq!(format_pointer(&path!["a/b", 2usize]), "/a~1b/2");
/// ```
pub fn format_pointer(path: &[PathStep]) -> String {
    let mut out = String::new();
    for step in path {
        out.push('/');
        match step {
            PathStep::Key(key) => out.push_str(&escape_component(key)),
            PathStep::Index(idx) => out.push_str(&idx.to_string()),
        }
    }
    out
}

/// Check if a string is a canonical sequence index (`0`, `17`, not `01`).
pub fn is_valid_index(index: &str) -> bool {
    if index.is_empty() {
        return false;
    }
    let bytes = index.as_bytes();
    if bytes.len() > 1 && bytes[0] == b'0' {
        return false;
    }
    bytes.iter().all(|b| b.is_ascii_digit())
}
