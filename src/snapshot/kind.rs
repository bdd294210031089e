//! Key Kind Module
//!
//! Classifies keys by the type name the store reports for them.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

// == Key Kind ==
/// Value type of a key, as reported by `TYPE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    String,
    List,
    Set,
    SortedSet,
    Hash,
    Stream,
}

impl KeyKind {
    /// Returns the store's own name for this type.
    pub fn type_name(&self) -> &'static str {
        match self {
            KeyKind::String => "string",
            KeyKind::List => "list",
            KeyKind::Set => "set",
            KeyKind::SortedSet => "zset",
            KeyKind::Hash => "hash",
            KeyKind::Stream => "stream",
        }
    }
}

impl FromStr for KeyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(KeyKind::String),
            "list" => Ok(KeyKind::List),
            "set" => Ok(KeyKind::Set),
            "zset" => Ok(KeyKind::SortedSet),
            "hash" => Ok(KeyKind::Hash),
            "stream" => Ok(KeyKind::Stream),
            other => Err(format!("unsupported key type `{}`", other)),
        }
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}
