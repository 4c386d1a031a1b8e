//! Driving the walker with a list of transformers.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, trace};
use tree_grafter_path::{format_pointer, LookupError, PathStep};

use crate::openapi::{CombinatorError, ReferenceError};
use crate::signal::ReplaceNode;
use crate::walker::{Submitted, TreeWalker, WalkError};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransformError {
    #[error(transparent)]
    Walk(#[from] WalkError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Reference(#[from] ReferenceError),
    #[error(transparent)]
    Combinator(#[from] CombinatorError),
    #[error("{0}")]
    Custom(String),
}

pub type TransformResult = Result<Option<ReplaceNode>, TransformError>;

/// A rewrite rule.
///
/// Given the whole tree, the path of the node on offer and the node itself,
/// a transformer either declines (`Ok(None)`) or asks for a replacement.
/// Transformers must not rely on side effects; their return value is the
/// only channel back to the walker.
pub trait Transformer {
    fn transform(&self, tree: &Value, path: &[PathStep], node: &Value) -> TransformResult;

    /// Name used in log output.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> Transformer for F
where
    F: Fn(&Value, &[PathStep], &Value) -> TransformResult,
{
    fn transform(&self, tree: &Value, path: &[PathStep], node: &Value) -> TransformResult {
        self(tree, path, node)
    }
}

/// Pin a closure to the transformer signature so its argument types can be
/// inferred.
///
/// ```
/// use tree_grafter::{from_fn, Transformation};
/// use serde_json::json;
///
/// let identity = Transformation::new().with(from_fn(|_, _, _| Ok(None)));
/// assert_eq!(identity.apply(&json!({"a": [1]})).unwrap(), json!({"a": [1]}));
/// ```
pub fn from_fn<F>(f: F) -> F
where
    F: Fn(&Value, &[PathStep], &Value) -> TransformResult,
{
    f
}

/// An ordered list of transformers applied in one walk over a tree.
///
/// At every node the transformers take turns in order. Each one that asks
/// for a replacement has it applied at once, and the following transformers
/// see the updated node. Once every transformer had its turn the walker
/// advances to the node's children. If a replacement removes the node on
/// offer, the remaining transformers are skipped for it.
///
/// A rewritten node is offered again after its children, so every rule must
/// eventually leave its own output alone, for instance by returning it
/// unchanged or declining.
#[derive(Default)]
pub struct Transformation {
    transformers: Vec<Box<dyn Transformer>>,
}

impl Transformation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transformer.
    pub fn with(mut self, transformer: impl Transformer + 'static) -> Self {
        self.transformers.push(Box::new(transformer));
        self
    }

    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }

    /// Rewrite a copy of `tree`. The input is left untouched.
    ///
    /// # Errors
    ///
    /// The first error raised by a transformer or by the walker aborts the
    /// pass; no partially rewritten tree is returned.
    pub fn apply(&self, tree: &Value) -> Result<Value, TransformError> {
        debug!(transformers = self.transformers.len(), "starting pass");
        let mut walker = TreeWalker::new(tree.clone());
        let mut offers = 0usize;
        while walker.next_offer().is_some() {
            offers += 1;
            if self.offer(&mut walker)? == Submitted::Reoffered {
                walker.advance()?;
            }
        }
        debug!(offers, "pass finished");
        Ok(walker.into_tree())
    }

    fn offer(&self, walker: &mut TreeWalker) -> Result<Submitted, TransformError> {
        for transformer in &self.transformers {
            let Some(offer) = walker.current() else {
                return Ok(Submitted::Released);
            };
            let Some(replace) = transformer.transform(offer.tree, offer.path, offer.node)? else {
                continue;
            };
            trace!(
                transformer = transformer.name(),
                path = %format_pointer(offer.path),
                levels_up = replace.levels_up(),
                "transformer matched"
            );
            if walker.replace(replace)? == Submitted::Released {
                return Ok(Submitted::Released);
            }
        }
        Ok(Submitted::Reoffered)
    }
}

impl<T: Transformer + 'static> FromIterator<T> for Transformation {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), |t, transformer| t.with(transformer))
    }
}

/// Build a transformation from boxed transformers, tried in the given order.
pub fn apply_transformations(transformers: Vec<Box<dyn Transformer>>) -> Transformation {
    Transformation { transformers }
}

/// Transformations run one after the other, each on the output of the
/// previous one.
///
/// Rule families that must not interleave, such as reference resolution and
/// `allOf` merging, go into separate passes.
#[derive(Default)]
pub struct Pipeline {
    passes: Vec<Transformation>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, pass: Transformation) -> Self {
        self.passes.push(pass);
        self
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    pub fn apply(&self, tree: &Value) -> Result<Value, TransformError> {
        let mut passes = self.passes.iter();
        let Some(first) = passes.next() else {
            return Ok(tree.clone());
        };
        passes.try_fold(first.apply(tree)?, |tree, pass| pass.apply(&tree))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tree_grafter_path::{path, Path};

    fn never(_: &Value, _: &[PathStep], _: &Value) -> TransformResult {
        Ok(None)
    }

    #[test]
    fn test_no_transformers_is_identity() {
        let doc = json!({"a": [1, {"b": null}], "c": "s"});
        assert_eq!(Transformation::new().apply(&doc).unwrap(), doc);
    }

    #[test]
    fn test_declining_transformer_is_identity() {
        let doc = json!([{"x": [true, 1.5]}, "y"]);
        let t = Transformation::new().with(never);
        assert_eq!(t.apply(&doc).unwrap(), doc);
    }

    #[test]
    fn test_input_is_not_mutated() {
        let doc = json!({"a": 1});
        let t = Transformation::new().with(from_fn(|_, _, node| {
            Ok(node.is_number().then(|| ReplaceNode::this(json!("changed"))))
        }));
        let out = t.apply(&doc).unwrap();
        assert_eq!(out, json!({"a": "changed"}));
        assert_eq!(doc, json!({"a": 1}));
    }

    #[test]
    fn test_later_transformers_see_replaced_node() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        let t = Transformation::new()
            .with(from_fn(|_, _, node| {
                Ok((node == &json!(1)).then(|| ReplaceNode::this(json!(2))))
            }))
            .with(from_fn(move |_, _, node| {
                log.borrow_mut().push(node.clone());
                Ok(None)
            }));
        t.apply(&json!({"a": 1})).unwrap();
        // the rewritten node is offered once more, and never as the original
        assert_eq!(*seen.borrow(), vec![json!(2), json!(2)]);
    }

    #[test]
    fn test_each_transformer_gets_one_turn() {
        let t = Transformation::new()
            .with(from_fn(|_, _, node| {
                Ok(node.as_i64().map(|n| ReplaceNode::this(json!(format!("n{n}")))))
            }))
            .with(from_fn(|_, _, node| {
                Ok(node
                    .as_str()
                    .filter(|s| s.starts_with('n'))
                    .map(|s| ReplaceNode::this(json!(s.to_uppercase()))))
            }));
        assert_eq!(t.apply(&json!([1, 2])).unwrap(), json!(["N1", "N2"]));
    }

    #[test]
    fn test_released_node_skips_remaining_transformers() {
        let calls = Rc::new(RefCell::new(Vec::<Path>::new()));
        let log = Rc::clone(&calls);
        let t = Transformation::new()
            .with(from_fn(|_, path, _| {
                Ok(path.last()
                    .is_some_and(|s| s.is_key("gone"))
                    .then(|| ReplaceNode::parent(json!({"kept": 1}))))
            }))
            .with(from_fn(move |_, path, _| {
                log.borrow_mut().push(path.to_vec());
                Ok(None)
            }));
        let out = t.apply(&json!({"p": {"gone": 0}})).unwrap();
        assert_eq!(out, json!({"p": {"kept": 1}}));
        assert!(!calls.borrow().contains(&path!["p", "gone"]));
        assert!(calls.borrow().contains(&path!["p", "kept"]));
    }

    #[test]
    fn test_transformer_error_aborts() {
        let t = Transformation::new().with(from_fn(|_, _, node| {
            if node.is_string() {
                return Err(TransformError::Custom("no strings".to_string()));
            }
            Ok(None)
        }));
        assert_eq!(
            t.apply(&json!({"a": [1, "x"]})),
            Err(TransformError::Custom("no strings".to_string()))
        );
    }

    #[test]
    fn test_root_replacement_surfaces_walk_error() {
        let t = Transformation::new()
            .with(from_fn(|_, _, _| Ok(Some(ReplaceNode::parent(json!(0))))));
        let err = t.apply(&json!({"a": 1})).unwrap_err();
        assert!(matches!(
            err,
            TransformError::Walk(WalkError::RootReplacement { .. })
        ));
    }

    #[test]
    fn test_from_iterator() {
        let t: Transformation = [never, never].into_iter().collect();
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_apply_transformations_boxed() {
        let upper: Box<dyn Transformer> = Box::new(from_fn(|_, _, node| {
            Ok(node.as_str().map(|s| ReplaceNode::this(json!(s.to_uppercase()))))
        }));
        let skip: Box<dyn Transformer> = Box::new(never);
        let t = apply_transformations(vec![skip, upper]);
        assert!(!t.is_empty());
        assert_eq!(t.apply(&json!(["a", {"b": "c"}])).unwrap(), json!(["A", {"b": "C"}]));
    }

    #[test]
    fn test_pipeline_runs_passes_in_order() {
        let double = Transformation::new().with(from_fn(|_, _, node| {
            Ok(node.as_i64().map(|n| ReplaceNode::this(json!((n * 2).to_string()))))
        }));
        let increment = Transformation::new().with(from_fn(|_, _, node| {
            Ok(node
                .as_str()
                .and_then(|s| s.parse::<i64>().ok())
                .map(|n| ReplaceNode::this(json!(n + 1))))
        }));
        let pipeline = Pipeline::new().then(double).then(increment);
        assert_eq!(pipeline.len(), 2);
        assert_eq!(pipeline.apply(&json!({"n": 5})).unwrap(), json!({"n": 11}));
        assert_eq!(Pipeline::new().apply(&json!([1])).unwrap(), json!([1]));
    }
}
