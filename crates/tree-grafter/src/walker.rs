//! The tree walker: a depth-first traversal that can be rewritten as it goes.
//!
//! The walker owns the tree and a LIFO queue of pending paths. It suspends
//! at every node, exposing it as an [`Offer`], and resumes when the caller
//! submits an [`Instruction`]:
//!
//! - [`Instruction::Replace`] writes a value at the current path or at one of
//!   its ancestors, then offers the current path again with whatever now
//!   lives there. If the write removed the current node, the path is
//!   released instead.
//! - [`Instruction::Advance`] queues the children of the current node and
//!   moves on.
//!
//! A replaced node is queued again, unless it was written back unchanged,
//! so that it is offered once more after its children.
//!
//! Queued paths that stop resolving because of an earlier replacement are
//! dropped without being offered, so the former descendants of a replaced
//! node are never visited.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, trace};
use tree_grafter_path::{deep_get, deep_set, format_pointer, Path, PathStep, PathWriteError};

use crate::signal::{Instruction, ReplaceNode};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WalkError {
    #[error("no node is on offer")]
    NoOffer,
    #[error("replacement at {pointer:?} going {levels_up} level(s) up would replace the root")]
    RootReplacement { pointer: String, levels_up: usize },
    #[error(transparent)]
    Write(#[from] PathWriteError),
}

/// A node on offer: the whole tree, the node's path, and the node itself.
#[derive(Debug, Clone, Copy)]
pub struct Offer<'a> {
    pub tree: &'a Value,
    pub path: &'a [PathStep],
    pub node: &'a Value,
}

/// Outcome of [`TreeWalker::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submitted {
    /// The same path is on offer again, holding the refreshed node.
    Reoffered,
    /// The walker is done with the path; call [`TreeWalker::next_offer`].
    Released,
}

#[derive(Debug)]
enum State {
    Discover,
    Offer(Path),
    Done,
}

#[derive(Debug)]
pub struct TreeWalker {
    tree: Value,
    queue: Vec<Path>,
    state: State,
}

/// Paths of the direct children of `node`, which lives at `prefix`.
fn child_paths(node: &Value, prefix: &[PathStep]) -> Vec<Path> {
    let child = |step: PathStep| {
        let mut path = Vec::with_capacity(prefix.len() + 1);
        path.extend_from_slice(prefix);
        path.push(step);
        path
    };
    match node {
        Value::Object(map) => map.keys().map(|k| child(PathStep::Key(k.clone()))).collect(),
        Value::Array(arr) => (0..arr.len()).map(|i| child(PathStep::Index(i))).collect(),
        _ => Vec::new(),
    }
}

impl TreeWalker {
    /// Start walking `tree`. The root itself is never offered; a scalar root
    /// has nothing to walk.
    pub fn new(tree: Value) -> Self {
        let queue = child_paths(&tree, &[]);
        let state = if queue.is_empty() {
            State::Done
        } else {
            State::Discover
        };
        Self { tree, queue, state }
    }

    pub fn tree(&self) -> &Value {
        &self.tree
    }

    /// Give up the tree, in whatever state the walk left it.
    pub fn into_tree(self) -> Value {
        self.tree
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, State::Done)
    }

    /// The node currently on offer, if any.
    pub fn current(&self) -> Option<Offer<'_>> {
        let State::Offer(path) = &self.state else {
            return None;
        };
        let node = deep_get(&self.tree, path).ok()?;
        Some(Offer {
            tree: &self.tree,
            path,
            node,
        })
    }

    /// Move to the next node and offer it.
    ///
    /// While a node is on offer this keeps returning that node. Returns
    /// `None` once the queue is exhausted.
    pub fn next_offer(&mut self) -> Option<Offer<'_>> {
        loop {
            match self.state {
                State::Offer(_) => break,
                State::Done => return None,
                State::Discover => {
                    let Some(path) = self.queue.pop() else {
                        self.state = State::Done;
                        return None;
                    };
                    match deep_get(&self.tree, &path) {
                        Ok(_) => self.state = State::Offer(path),
                        Err(err) => {
                            trace!(path = %format_pointer(&path), %err, "dropping stale path");
                        }
                    }
                }
            }
        }
        self.current()
    }

    /// Apply an instruction to the node on offer.
    ///
    /// # Errors
    ///
    /// - [`WalkError::NoOffer`] if no node is on offer
    /// - [`WalkError::RootReplacement`] if a replacement targets the root
    pub fn submit(&mut self, instruction: Instruction) -> Result<Submitted, WalkError> {
        match instruction {
            Instruction::Replace(replace) => self.replace(replace),
            Instruction::Advance => self.advance(),
        }
    }

    /// Shorthand for submitting [`Instruction::Advance`].
    pub fn advance(&mut self) -> Result<Submitted, WalkError> {
        let State::Offer(path) = std::mem::replace(&mut self.state, State::Discover) else {
            self.restore_idle();
            return Err(WalkError::NoOffer);
        };
        if let Ok(node) = deep_get(&self.tree, &path) {
            let children = child_paths(node, &path);
            self.queue.extend(children);
        }
        Ok(Submitted::Released)
    }

    /// Shorthand for submitting [`Instruction::Replace`].
    pub fn replace(&mut self, replace: ReplaceNode) -> Result<Submitted, WalkError> {
        let State::Offer(path) = &self.state else {
            return Err(WalkError::NoOffer);
        };
        let Some(target) = replace.target(path) else {
            return Err(WalkError::RootReplacement {
                pointer: format_pointer(path),
                levels_up: replace.levels_up(),
            });
        };
        let target = target.to_vec();
        let path = path.clone();
        debug!(
            path = %format_pointer(&path),
            target = %format_pointer(&target),
            "replacing node"
        );

        // a node written back unchanged is not requeued
        let changed = target != path
            || deep_get(&self.tree, &target).map_or(true, |old| old != replace.value());
        deep_set(&mut self.tree, &target, replace.into_value())?;

        // Visit the rewritten node again later, so rules see their own output
        // and the new children are discovered.
        if changed && !self.queue.contains(&target) {
            self.queue.push(target);
        }
        if deep_get(&self.tree, &path).is_err() {
            debug!(path = %format_pointer(&path), "node replaced away");
            self.state = State::Discover;
            return Ok(Submitted::Released);
        }
        Ok(Submitted::Reoffered)
    }

    fn restore_idle(&mut self) {
        if self.queue.is_empty() && matches!(self.state, State::Discover) {
            self.state = State::Done;
        }
    }
}

/// Iterate over every `(path, node)` of a tree without changing it.
///
/// ```
/// use tree_grafter::stroll;
/// use serde_json::json;
///
/// let visited: Vec<_> = stroll(&json!({"a": [1, 2]})).map(|(_, node)| node).collect();
/// assert_eq!(visited, vec![json!([1, 2]), json!(2), json!(1)]);
/// ```
pub fn stroll(tree: &Value) -> Stroll {
    Stroll {
        walker: TreeWalker::new(tree.clone()),
    }
}

#[derive(Debug)]
pub struct Stroll {
    walker: TreeWalker,
}

impl Iterator for Stroll {
    type Item = (Path, Value);

    fn next(&mut self) -> Option<Self::Item> {
        let item = {
            let offer = self.walker.next_offer()?;
            (offer.path.to_vec(), offer.node.clone())
        };
        self.walker.advance().ok()?;
        Some(item)
    }
}
