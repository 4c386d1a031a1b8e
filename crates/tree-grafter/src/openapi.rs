//! Transformers for OpenAPI documents.
//!
//! OpenAPI documents reuse schemas through internal references such as
//! `"$ref": "#/components/schemas/Pet"` and compose them with `allOf`.
//! [`parse_openapi_doc`] inlines every reference and then flattens every
//! `allOf`, in two separate passes so that references nested in `allOf`
//! members are resolved before anything is merged.

use std::collections::HashSet;

use serde_json::{Map, Value};
use thiserror::Error;
use tree_grafter_path::{
    deep_get, format_pointer, kind_of, parse_pointer, path, LookupError, Path, PathStep,
};

use crate::signal::ReplaceNode;
use crate::transform::{Pipeline, TransformError, TransformResult, Transformation, Transformer};

pub const REF_KEY: &str = "$ref";
pub const ALL_OF_KEY: &str = "allOf";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReferenceError {
    #[error("expected '$ref' at {pointer:?} to be a string, found {kind}")]
    NotAString { pointer: String, kind: &'static str },
    #[error("reference {reference:?} at {pointer:?} must start at the document root ('#/')")]
    NotRootAnchored { reference: String, pointer: String },
    #[error("reference {reference:?} at {pointer:?} does not resolve: {source}")]
    Unresolved {
        reference: String,
        pointer: String,
        #[source]
        source: LookupError,
    },
    #[error("reference {reference:?} at {pointer:?} leads back to itself and cannot be inlined")]
    Cyclic { reference: String, pointer: String },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CombinatorError {
    #[error("expected 'allOf' at {pointer:?} to be a sequence, found {kind}")]
    NotASequence { pointer: String, kind: &'static str },
    #[error("'allOf' member {index} at {pointer:?} is a {kind}, not a mapping")]
    MemberNotMapping {
        pointer: String,
        index: usize,
        kind: &'static str,
    },
    #[error("'allOf' member {index} at {pointer:?} still holds an unresolved '$ref'")]
    UnresolvedReference { pointer: String, index: usize },
}

fn ends_with_key(path: &[PathStep], key: &str) -> bool {
    path.last().is_some_and(|step| step.is_key(key))
}

/// The path named by a root-anchored reference such as `#/a/b`.
fn reference_path(reference: &str) -> Option<Path> {
    let rest = reference.strip_prefix('#')?;
    if !rest.starts_with('/') {
        return None;
    }
    parse_pointer(rest).ok()
}

/// Targets of the references at or below `node`. The other keys of a
/// mapping holding `$ref` are skipped, the whole mapping gets replaced.
fn collect_references(node: &Value, out: &mut Vec<Path>) {
    match node {
        Value::Object(map) => match map.get(REF_KEY) {
            Some(Value::String(reference)) => out.extend(reference_path(reference)),
            Some(_) => {}
            None => map.values().for_each(|v| collect_references(v, out)),
        },
        Value::Array(arr) => arr.iter().for_each(|v| collect_references(v, out)),
        _ => {}
    }
}

/// Does inlining `target` ever bring back a reference to something still
/// being inlined? Follows the references below `target` depth first.
fn leads_back(
    tree: &Value,
    target: &[PathStep],
    trail: &mut Vec<Path>,
    cleared: &mut HashSet<Path>,
) -> bool {
    if trail.iter().any(|p| p == target) {
        return true;
    }
    if cleared.contains(target) {
        return false;
    }
    let Ok(node) = deep_get(tree, target) else {
        return false;
    };
    let mut next = Vec::new();
    collect_references(node, &mut next);
    trail.push(target.to_vec());
    let cyclic = next.iter().any(|t| leads_back(tree, t, trail, cleared));
    trail.pop();
    if !cyclic {
        cleared.insert(target.to_vec());
    }
    cyclic
}

/// Is `node` a JSON-schema style property, i.e. a mapping with a `type`
/// that is a string or a list of strings?
pub fn is_property(node: &Value) -> bool {
    node.get("type")
        .is_some_and(|t| t.is_string() || t.is_array())
}

/// Replace the mapping holding a `"$ref"` with the value it points to.
///
/// `{"a": {"$ref": "#/b"}, "b": {"x": 1}}` becomes
/// `{"a": {"x": 1}, "b": {"x": 1}}`.
pub fn fill_refs(tree: &Value, path: &[PathStep], node: &Value) -> TransformResult {
    if !ends_with_key(path, REF_KEY) {
        return Ok(None);
    }
    let pointer = format_pointer(path);
    let Value::String(reference) = node else {
        return Err(ReferenceError::NotAString {
            pointer,
            kind: kind_of(node),
        }
        .into());
    };
    let Some(target) = reference_path(reference) else {
        return Err(ReferenceError::NotRootAnchored {
            reference: reference.clone(),
            pointer,
        }
        .into());
    };

    let resolved = deep_get(tree, &target).map_err(|source| ReferenceError::Unresolved {
        reference: reference.clone(),
        pointer: pointer.clone(),
        source,
    })?;
    if leads_back(tree, &target, &mut Vec::new(), &mut HashSet::new()) {
        return Err(ReferenceError::Cyclic {
            reference: reference.clone(),
            pointer,
        }
        .into());
    }
    Ok(Some(ReplaceNode::parent(resolved.clone())))
}

/// Replace the mapping holding an `"allOf"` with the union of its members.
///
/// Members are merged left to right; on a key conflict the right-most
/// member wins. Keys next to `allOf` in the holding mapping are dropped.
pub fn combine_all_of(_tree: &Value, path: &[PathStep], node: &Value) -> TransformResult {
    if !ends_with_key(path, ALL_OF_KEY) {
        return Ok(None);
    }
    let Value::Array(members) = node else {
        return Err(CombinatorError::NotASequence {
            pointer: format_pointer(path),
            kind: kind_of(node),
        }
        .into());
    };
    let mut merged = Map::new();
    for (index, member) in members.iter().enumerate() {
        let Value::Object(props) = member else {
            return Err(CombinatorError::MemberNotMapping {
                pointer: format_pointer(path),
                index,
                kind: kind_of(member),
            }
            .into());
        };
        if props.contains_key(REF_KEY) {
            return Err(CombinatorError::UnresolvedReference {
                pointer: format_pointer(path),
                index,
            }
            .into());
        }
        for (key, val) in props {
            merged.insert(key.clone(), val.clone());
        }
    }
    Ok(Some(ReplaceNode::parent(Value::Object(merged))))
}

/// Make every property nullable.
///
/// `{"type": "object"}` becomes `{"type": ["null", "object"]}`.
pub fn add_nulls(_tree: &Value, _path: &[PathStep], node: &Value) -> TransformResult {
    if !is_property(node) {
        return Ok(None);
    }
    let types = match &node["type"] {
        Value::Array(types) => types.clone(),
        single => vec![single.clone()],
    };
    let null = Value::String("null".to_string());
    if types.contains(&null) {
        return Ok(None);
    }
    let mut widened = node.clone();
    widened["type"] = Value::Array(std::iter::once(null).chain(types).collect());
    Ok(Some(ReplaceNode::this(widened)))
}

/// Strips properties down to an allow-list of keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveExcessKeys {
    allowed: Vec<String>,
}

impl RemoveExcessKeys {
    pub const DEFAULT_ALLOWED: [&'static str; 4] = ["type", "properties", "items", "format"];

    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    fn is_allowed(&self, key: &str) -> bool {
        self.allowed.iter().any(|k| k == key)
    }
}

impl Default for RemoveExcessKeys {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ALLOWED)
    }
}

impl Transformer for RemoveExcessKeys {
    fn transform(&self, _tree: &Value, _path: &[PathStep], node: &Value) -> TransformResult {
        let Some(props) = node.as_object().filter(|_| is_property(node)) else {
            return Ok(None);
        };
        if props.keys().all(|k| self.is_allowed(k)) {
            return Ok(None);
        }
        let kept: Map<String, Value> = props
            .iter()
            .filter(|(k, _)| self.is_allowed(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(Some(ReplaceNode::this(Value::Object(kept))))
    }

    fn name(&self) -> &str {
        "remove_excess_keys"
    }
}

/// Transformer keeping only `allowed` keys in properties.
pub fn remove_excess_keys<I, S>(allowed: I) -> RemoveExcessKeys
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    RemoveExcessKeys::new(allowed)
}

/// Collapse paginated list schemas to the schema of one page item.
///
/// A property shaped `{"type": ..., "properties": {"data": {"items": X}}}`
/// is replaced by `X`.
pub fn hide_pagination(_tree: &Value, _path: &[PathStep], node: &Value) -> TransformResult {
    if !is_property(node) {
        return Ok(None);
    }
    Ok(deep_get(node, &path!["properties", "data", "items"])
        .ok()
        .map(|items| ReplaceNode::this(items.clone())))
}

/// Inline every `$ref`, then flatten every `allOf`.
pub fn openapi_pipeline() -> Pipeline {
    Pipeline::new()
        .then(Transformation::new().with(fill_refs))
        .then(Transformation::new().with(combine_all_of))
}

/// Fill references and combine `allOf` in an OpenAPI document.
pub fn parse_openapi_doc(doc: &Value) -> Result<Value, TransformError> {
    openapi_pipeline().apply(doc)
}
