//! Truncating trees at a fixed depth.

use serde_json::{Map, Value};
use tree_grafter_path::{deep_get, parent, PathStep};

use crate::signal::ReplaceNode;
use crate::transform::{TransformResult, Transformer};

/// Replaces every container whose children sit deeper than `max_path_len`
/// with an empty container of the same kind.
///
/// A limit of `0` would have to empty the root, which the walker refuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthLimit {
    max_path_len: usize,
}

impl DepthLimit {
    pub fn new(max_path_len: usize) -> Self {
        Self { max_path_len }
    }

    pub fn unlimited() -> Self {
        Self::new(usize::MAX)
    }

    pub fn max_path_len(&self) -> usize {
        self.max_path_len
    }
}

impl Default for DepthLimit {
    fn default() -> Self {
        Self::unlimited()
    }
}

impl Transformer for DepthLimit {
    fn transform(&self, tree: &Value, path: &[PathStep], _node: &Value) -> TransformResult {
        if path.len() <= self.max_path_len {
            return Ok(None);
        }
        let Some(parent_path) = parent(path) else {
            return Ok(None);
        };
        Ok(match deep_get(tree, parent_path)? {
            Value::Object(_) => Some(ReplaceNode::parent(Value::Object(Map::new()))),
            Value::Array(_) => Some(ReplaceNode::parent(Value::Array(Vec::new()))),
            _ => None,
        })
    }

    fn name(&self) -> &str {
        "limit_depth"
    }
}

/// Transformer truncating trees below `max_path_len`.
pub fn limit_depth(max_path_len: usize) -> DepthLimit {
    DepthLimit::new(max_path_len)
}
