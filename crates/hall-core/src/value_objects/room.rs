//! Room identifier - the singleton group channel or a pairwise channel
//!
//! Rooms are never materialized as entities. A pairwise id is the pure
//! function `sorted(a, b).join("_")`, so both participants derive the same id
//! independently and "the id exists" is equivalent to "these two members have
//! a conversation".

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use super::member_id::MemberId;

/// Literal id of the shared group room.
const GROUP: &str = "group";

/// Logical conversation channel id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoomId {
    /// The single shared room every member belongs to
    Group,
    /// Pairwise room; participants are kept in sorted order
    Private(MemberId, MemberId),
}

impl RoomId {
    /// The group room
    #[inline]
    pub fn group() -> Self {
        Self::Group
    }

    /// Pairwise room between two members. Order of arguments is irrelevant.
    pub fn private(a: MemberId, b: MemberId) -> Self {
        if a <= b {
            Self::Private(a, b)
        } else {
            Self::Private(b, a)
        }
    }

    /// Check if this is the group room
    #[inline]
    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group)
    }

    /// Check if the given member participates in this room.
    ///
    /// Everyone participates in the group room.
    pub fn contains(&self, member: &MemberId) -> bool {
        match self {
            Self::Group => true,
            Self::Private(a, b) => a == member || b == member,
        }
    }

    /// The other participant of a pairwise room, if `me` is one of them
    pub fn other_participant(&self, me: &MemberId) -> Option<&MemberId> {
        match self {
            Self::Group => None,
            Self::Private(a, b) if a == me => Some(b),
            Self::Private(a, b) if b == me => Some(a),
            Self::Private(..) => None,
        }
    }

    /// Parse from the canonical string form
    pub fn parse(s: &str) -> Result<Self, RoomIdParseError> {
        if s == GROUP {
            return Ok(Self::Group);
        }
        match s.split_once('_') {
            Some((a, b)) if !a.is_empty() && !b.is_empty() => {
                Ok(Self::private(MemberId::from(a), MemberId::from(b)))
            }
            _ => Err(RoomIdParseError::InvalidFormat(s.to_owned())),
        }
    }
}

/// Error when parsing a room id from string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomIdParseError {
    #[error("invalid room id: {0}")]
    InvalidFormat(String),
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group => f.write_str(GROUP),
            Self::Private(a, b) => write!(f, "{a}_{b}"),
        }
    }
}

impl std::str::FromStr for RoomId {
    type Err = RoomIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoomId::parse(s)
    }
}

impl Serialize for RoomId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RoomId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        RoomId::parse(&s).map_err(serde::de::Error::custom)
    }
}
