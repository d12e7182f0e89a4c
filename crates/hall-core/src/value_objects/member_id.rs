//! Member identifier - opaque id issued by the hosted auth provider

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque member identifier.
///
/// Ids come from the hosted auth provider and are treated as plain strings.
/// They participate in pairwise room ids (sorted and joined with `_`), so an
/// id must not itself contain an underscore; [`MemberId::new`] does not
/// enforce this, but [`crate::RoomId`] parsing assumes it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(String);

impl MemberId {
    /// Create a member id from a raw string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if the id is empty (uninitialized)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemberId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for MemberId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
