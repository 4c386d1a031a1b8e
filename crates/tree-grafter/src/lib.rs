//! Walk and rewrite JSON-like trees.
//!
//! At the core, [`TreeWalker`] visits every node of a [`serde_json::Value`]
//! depth first and accepts instructions to replace the node on offer, or one
//! of its ancestors, while the walk is under way. [`Transformation`] drives
//! the walker with a list of [`Transformer`] rules and returns a rewritten
//! copy of its input.
//!
//! # Example
//!
//! ```
//! use tree_grafter::{from_fn, ReplaceNode, Transformation};
//! use serde_json::json;
//!
//! let shout = Transformation::new().with(from_fn(|_, _, node| {
//!     Ok(node.as_str().map(|s| ReplaceNode::this(json!(s.to_uppercase()))))
//! }));
//!
//! let doc = json!({"greeting": ["hello", {"to": "world"}]});
//! assert_eq!(
//!     shout.apply(&doc).unwrap(),
//!     json!({"greeting": ["HELLO", {"to": "WORLD"}]})
//! );
//! ```

pub mod cli;
pub mod depth;
pub mod openapi;
pub mod signal;
pub mod transform;
pub mod walker;

pub use depth::{limit_depth, DepthLimit};
pub use signal::{Instruction, ReplaceNode, SignalError};
pub use transform::{
    apply_transformations, from_fn, Pipeline, TransformError, TransformResult, Transformation,
    Transformer,
};
pub use walker::{stroll, Offer, Stroll, Submitted, TreeWalker, WalkError};

pub use tree_grafter_path::{
    deep_get, deep_get_mut, deep_set, format_pointer, parse_pointer, LookupError, Path, PathStep,
    PathWriteError,
};
