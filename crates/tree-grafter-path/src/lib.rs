//! Path addressing for JSON-like trees.
//!
//! A tree is a [`serde_json::Value`]: nested mappings and sequences with
//! scalar leaves. A [`Path`] is the list of keys and indices leading from the
//! root to a node. This crate reads ([`deep_get`]) and writes ([`deep_set`])
//! values at such paths and reports precisely why a path failed to resolve.
//!
//! # Example
//!
//! ```
//! use tree_grafter_path::{deep_get, deep_set, path};
//! use serde_json::json;
//!
//! let mut doc = json!({"foo": {"bar": [1, 2, 3]}});
//! assert_eq!(deep_get(&doc, &path!["foo", "bar", 1usize]), Ok(&json!(2)));
//!
//! deep_set(&mut doc, &path!["foo", "bar", 1usize], json!("two")).unwrap();
//! assert_eq!(doc, json!({"foo": {"bar": [1, "two", 3]}}));
//! ```

use serde_json::Value;
use thiserror::Error;

pub mod types;
pub use types::{Path, PathStep};

pub mod pointer;
pub use pointer::{
    escape_component, format_pointer, is_valid_index, parse_pointer, unescape_component,
    PointerError,
};

/// Failure to resolve one step of a path.
///
/// `depth` is the position of the failing step within the path.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("key {key:?} not found at depth {depth}")]
    KeyNotFound { key: String, depth: usize },
    #[error("index {index} out of range for sequence of length {len} at depth {depth}")]
    IndexOutOfRange {
        index: usize,
        len: usize,
        depth: usize,
    },
    #[error("{step:?} is not a valid sequence index at depth {depth}")]
    InvalidIndex { step: String, depth: usize },
    #[error("cannot index into {kind} with {step} at depth {depth}")]
    NotAContainer {
        step: PathStep,
        kind: &'static str,
        depth: usize,
    },
}

impl LookupError {
    /// True when the container exists but the key or index does not.
    pub fn is_absent(&self) -> bool {
        matches!(
            self,
            LookupError::KeyNotFound { .. } | LookupError::IndexOutOfRange { .. }
        )
    }
}

/// Failure to write a value into a tree.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathWriteError {
    #[error("cannot replace the root of a tree")]
    Root,
    #[error("failed to write at {pointer:?}: {source}")]
    Unreachable {
        pointer: String,
        #[source]
        source: LookupError,
    },
}

impl PathWriteError {
    /// True when the write failed because part of the path no longer
    /// exists in the tree, i.e. the path went stale.
    pub fn is_stale(&self) -> bool {
        matches!(self, PathWriteError::Unreachable { .. })
    }
}

/// Short name for the kind of a value, used in error messages.
pub fn kind_of(val: &Value) -> &'static str {
    match val {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

fn sequence_index(step: &PathStep, depth: usize) -> Result<usize, LookupError> {
    match step {
        PathStep::Index(idx) => Ok(*idx),
        PathStep::Key(key) => {
            let invalid = || LookupError::InvalidIndex {
                step: key.clone(),
                depth,
            };
            if !is_valid_index(key) {
                return Err(invalid());
            }
            key.parse().map_err(|_| invalid())
        }
    }
}

fn mapping_key(step: &PathStep) -> String {
    match step {
        PathStep::Key(key) => key.clone(),
        PathStep::Index(idx) => idx.to_string(),
    }
}

fn step_into<'a>(node: &'a Value, step: &PathStep, depth: usize) -> Result<&'a Value, LookupError> {
    match node {
        Value::Object(map) => {
            let key = mapping_key(step);
            map.get(&key)
                .ok_or(LookupError::KeyNotFound { key, depth })
        }
        Value::Array(arr) => {
            let index = sequence_index(step, depth)?;
            arr.get(index).ok_or(LookupError::IndexOutOfRange {
                index,
                len: arr.len(),
                depth,
            })
        }
        other => Err(LookupError::NotAContainer {
            step: step.clone(),
            kind: kind_of(other),
            depth,
        }),
    }
}

fn step_into_mut<'a>(
    node: &'a mut Value,
    step: &PathStep,
    depth: usize,
) -> Result<&'a mut Value, LookupError> {
    match node {
        Value::Object(map) => {
            let key = mapping_key(step);
            map.get_mut(&key)
                .ok_or(LookupError::KeyNotFound { key, depth })
        }
        Value::Array(arr) => {
            let index = sequence_index(step, depth)?;
            let len = arr.len();
            arr.get_mut(index)
                .ok_or(LookupError::IndexOutOfRange { index, len, depth })
        }
        other => Err(LookupError::NotAContainer {
            step: step.clone(),
            kind: kind_of(other),
            depth,
        }),
    }
}

/// Get the value at `path`.
///
/// The empty path resolves to the root itself.
///
/// # Errors
///
/// Returns a [`LookupError`] naming the first step that could not be
/// resolved.
pub fn deep_get<'a>(tree: &'a Value, path: &[PathStep]) -> Result<&'a Value, LookupError> {
    let mut current = tree;
    for (depth, step) in path.iter().enumerate() {
        current = step_into(current, step, depth)?;
    }
    Ok(current)
}

/// Get a mutable reference to the value at `path`.
pub fn deep_get_mut<'a>(
    tree: &'a mut Value,
    path: &[PathStep],
) -> Result<&'a mut Value, LookupError> {
    let mut current = tree;
    for (depth, step) in path.iter().enumerate() {
        current = step_into_mut(current, step, depth)?;
    }
    Ok(current)
}

/// Write `value` at `path`, mutating `tree` in place.
///
/// Every step but the last must resolve. The last step may name a key the
/// mapping does not have yet; a sequence index must be in range.
///
/// # Errors
///
/// - [`PathWriteError::Root`] if `path` is empty
/// - [`PathWriteError::Unreachable`] if any step cannot be navigated
///
/// ```
/// use tree_grafter_path::{deep_set, path, PathWriteError};
/// use serde_json::json;
///
/// let mut doc = json!({"a": {}});
/// deep_set(&mut doc, &path!["a", "b"], json!(1)).unwrap();
/// assert_eq!(doc, json!({"a": {"b": 1}}));
///
/// let err = deep_set(&mut doc, &path!["x", "y"], json!(1)).unwrap_err();
/// assert!(err.is_stale());
/// assert_eq!(deep_set(&mut doc, &path![], json!(1)), Err(PathWriteError::Root));
/// ```
pub fn deep_set(tree: &mut Value, path: &[PathStep], value: Value) -> Result<(), PathWriteError> {
    let Some((last, init)) = path.split_last() else {
        return Err(PathWriteError::Root);
    };
    let unreachable = |source| PathWriteError::Unreachable {
        pointer: format_pointer(path),
        source,
    };
    let depth = init.len();
    let container = deep_get_mut(tree, init).map_err(unreachable)?;
    match container {
        Value::Object(map) => {
            map.insert(mapping_key(last), value);
            Ok(())
        }
        Value::Array(arr) => {
            let index = sequence_index(last, depth).map_err(unreachable)?;
            let len = arr.len();
            match arr.get_mut(index) {
                Some(slot) => {
                    *slot = value;
                    Ok(())
                }
                None => Err(unreachable(LookupError::IndexOutOfRange { index, len, depth })),
            }
        }
        other => Err(unreachable(LookupError::NotAContainer {
            step: last.clone(),
            kind: kind_of(other),
            depth,
        })),
    }
}

/// The path with its last `levels` steps dropped.
///
/// Returns `None` when `levels` exceeds the length of the path.
///
/// ```
/// use tree_grafter_path::{ancestor, path};
///
/// let p = path!["a", "b", "c"];
/// assert_eq!(ancestor(&p, 1), Some(&p[..2]));
/// assert_eq!(ancestor(&p, 3), Some(&p[..0]));
/// assert_eq!(ancestor(&p, 4), None);
/// ```
pub fn ancestor(path: &[PathStep], levels: usize) -> Option<&[PathStep]> {
    let len = path.len().checked_sub(levels)?;
    Some(&path[..len])
}

/// The parent path, or `None` for the root.
pub fn parent(path: &[PathStep]) -> Option<&[PathStep]> {
    ancestor(path, 1)
}

/// Check if `ancestor` is a strict prefix of `path`.
///
/// ```
/// use tree_grafter_path::{is_ancestor, path};
///
/// assert!(is_ancestor(&path!["foo"], &path!["foo", "bar"]));
/// assert!(!is_ancestor(&path!["foo"], &path!["foo"]));
/// ```
pub fn is_ancestor(ancestor: &[PathStep], path: &[PathStep]) -> bool {
    ancestor.len() < path.len() && path.starts_with(ancestor)
}
