//! Type definitions for tree paths.

use std::borrow::Cow;
use std::fmt;

/// A step in a tree path.
///
/// Mappings are addressed by [`PathStep::Key`], sequences by
/// [`PathStep::Index`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathStep {
    Key(String),
    Index(usize),
}

/// A path from the root of a tree to one of its nodes.
pub type Path = Vec<PathStep>;

impl PathStep {
    /// The mapping key, if this step addresses a mapping.
    pub fn as_key(&self) -> Option<&str> {
        match self {
            PathStep::Key(key) => Some(key.as_str()),
            PathStep::Index(_) => None,
        }
    }

    /// The sequence index, if this step addresses a sequence.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathStep::Key(_) => None,
            PathStep::Index(idx) => Some(*idx),
        }
    }

    /// Check if this step is the mapping key `key`.
    pub fn is_key(&self, key: &str) -> bool {
        self.as_key() == Some(key)
    }

    /// The step as it appears in a pointer, ignoring whether it is a key or
    /// an index.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            PathStep::Key(key) => Cow::Borrowed(key.as_str()),
            PathStep::Index(idx) => Cow::Owned(idx.to_string()),
        }
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStep::Key(key) => write!(f, "{key:?}"),
            PathStep::Index(idx) => write!(f, "{idx}"),
        }
    }
}

impl From<&str> for PathStep {
    fn from(key: &str) -> Self {
        PathStep::Key(key.to_string())
    }
}

impl From<String> for PathStep {
    fn from(key: String) -> Self {
        PathStep::Key(key)
    }
}

impl From<usize> for PathStep {
    fn from(idx: usize) -> Self {
        PathStep::Index(idx)
    }
}

/// Build a [`Path`] from a list of keys and indices.
///
/// ```
/// use tree_grafter_path::{path, PathStep};
///
/// let p = path!["paths", 0usize, "get"];
/// assert_eq!(p[1], PathStep::Index(0));
/// ```
#[macro_export]
macro_rules! path {
    () => { $crate::Path::new() };
    ($($step:expr),+ $(,)?) => {
        vec![$($crate::PathStep::from($step)),+]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_accessors() {
        let key = PathStep::from("foo");
        assert_eq!(key.as_key(), Some("foo"));
        assert_eq!(key.as_index(), None);
        assert!(key.is_key("foo"));
        assert!(!key.is_key("bar"));

        let idx = PathStep::from(3usize);
        assert_eq!(idx.as_index(), Some(3));
        assert_eq!(idx.as_key(), None);
        assert!(!idx.is_key("3"));
        assert_eq!(idx.as_text(), "3");
        assert_eq!(key.as_text(), "foo");
    }

    #[test]
    fn test_step_display() {
        assert_eq!(PathStep::from("a b").to_string(), "\"a b\"");
        assert_eq!(PathStep::Index(7).to_string(), "7");
    }

    #[test]
    fn test_path_macro() {
        let p: Path = path!["a", 1usize, "b"];
        assert_eq!(
            p,
            vec![
                PathStep::Key("a".to_string()),
                PathStep::Index(1),
                PathStep::Key("b".to_string()),
            ]
        );
        assert!(path![].is_empty());
    }
}
