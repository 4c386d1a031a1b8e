//! Instructions a caller hands back to the [`TreeWalker`](crate::TreeWalker).

use serde_json::Value;
use thiserror::Error;
use tree_grafter_path::{ancestor, PathStep};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignalError {
    #[error("cannot replace a descendant of the current node (depth {0})")]
    Descendant(isize),
}

/// Replace the current node, or one of its ancestors, with `value`.
///
/// `levels_up` counts the path steps dropped to reach the target: `0` is the
/// current node, `1` its parent, and so on.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaceNode {
    value: Value,
    levels_up: usize,
}

impl ReplaceNode {
    /// Build a replacement from a signed distance: `0` for the current node,
    /// `-1` for the parent, `-2` for the grandparent.
    ///
    /// # Errors
    ///
    /// A positive depth would name a descendant and is rejected.
    ///
    /// ```
    /// use tree_grafter::ReplaceNode;
    /// use serde_json::json;
    ///
    /// assert_eq!(ReplaceNode::new(json!(1), -1).unwrap().levels_up(), 1);
    /// assert!(ReplaceNode::new(json!(1), 1).is_err());
    /// ```
    pub fn new(value: Value, depth: isize) -> Result<Self, SignalError> {
        if depth > 0 {
            return Err(SignalError::Descendant(depth));
        }
        Ok(Self {
            value,
            levels_up: depth.unsigned_abs(),
        })
    }

    /// Replace the current node.
    pub fn this(value: Value) -> Self {
        Self::ancestor(value, 0)
    }

    /// Replace the parent of the current node.
    pub fn parent(value: Value) -> Self {
        Self::ancestor(value, 1)
    }

    /// Replace the ancestor `levels_up` steps above the current node.
    pub fn ancestor(value: Value, levels_up: usize) -> Self {
        Self { value, levels_up }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    pub fn levels_up(&self) -> usize {
        self.levels_up
    }

    /// The signed distance, `0` or negative.
    pub fn depth(&self) -> isize {
        -(self.levels_up as isize)
    }

    /// The path this replacement writes to when offered at `path`.
    ///
    /// Returns `None` if the target would be the root or lie above it.
    pub fn target<'p>(&self, path: &'p [PathStep]) -> Option<&'p [PathStep]> {
        ancestor(path, self.levels_up).filter(|target| !target.is_empty())
    }
}

/// What the caller wants the walker to do with the node on offer.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Write a value, then offer the current path again.
    Replace(ReplaceNode),
    /// Stop offering the current node and discover its children.
    Advance,
}

impl From<ReplaceNode> for Instruction {
    fn from(replace: ReplaceNode) -> Self {
        Instruction::Replace(replace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tree_grafter_path::path;

    #[test]
    fn test_new_normalizes_depth() {
        let r = ReplaceNode::new(json!("v"), 0).unwrap();
        assert_eq!(r, ReplaceNode::this(json!("v")));
        let r = ReplaceNode::new(json!("v"), -2).unwrap();
        assert_eq!(r.levels_up(), 2);
        assert_eq!(r.depth(), -2);
    }

    #[test]
    fn test_new_rejects_descendant() {
        assert_eq!(
            ReplaceNode::new(json!(null), 3),
            Err(SignalError::Descendant(3))
        );
    }

    #[test]
    fn test_target() {
        let p = path!["a", "b", "c"];
        assert_eq!(ReplaceNode::this(json!(1)).target(&p), Some(&p[..]));
        assert_eq!(ReplaceNode::parent(json!(1)).target(&p), Some(&p[..2]));
        assert_eq!(ReplaceNode::ancestor(json!(1), 2).target(&p), Some(&p[..1]));
        assert_eq!(ReplaceNode::ancestor(json!(1), 3).target(&p), None);
        assert_eq!(ReplaceNode::ancestor(json!(1), 9).target(&p), None);
    }

    #[test]
    fn test_into_instruction() {
        let r = ReplaceNode::parent(json!([]));
        assert_eq!(Instruction::from(r.clone()), Instruction::Replace(r));
    }
}
