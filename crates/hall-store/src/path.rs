//! Tree paths - slash-separated locations in the realtime tree

use std::fmt;

/// Location of a node in the tree, e.g. `messages/group/<push-id>`.
///
/// Stored in normalized form: no leading, trailing, or doubled slashes. The
/// empty path is the tree root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TreePath(String);

impl TreePath {
    /// The tree root
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Build a path from a raw string, normalizing slashes
    pub fn new(raw: impl AsRef<str>) -> Self {
        let joined = raw
            .as_ref()
            .split('/')
            .filter(|seg| !seg.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        Self(joined)
    }

    /// Append one segment
    pub fn child(&self, segment: &str) -> Self {
        if self.0.is_empty() {
            Self::new(segment)
        } else {
            Self::new(format!("{}/{segment}", self.0))
        }
    }

    /// Parent path and final segment, or `None` at the root
    pub fn parent(&self) -> Option<(TreePath, &str)> {
        if self.0.is_empty() {
            return None;
        }
        match self.0.rsplit_once('/') {
            Some((head, key)) => Some((Self(head.to_owned()), key)),
            None => Some((Self::root(), self.0.as_str())),
        }
    }

    /// Iterate over the path segments
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|seg| !seg.is_empty())
    }

    /// Check if this is the root path
    #[inline]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the normalized string form
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TreePath {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}
