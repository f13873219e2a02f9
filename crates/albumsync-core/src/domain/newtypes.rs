//! Domain newtypes
//!
//! Strongly-typed wrappers for the two string identities that flow through
//! the reconciler: remote item/album identifiers and content checksums.
//! Keeping them distinct prevents the classic bug of indexing a ledger map
//! with the wrong kind of string.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Identifier assigned by the remote store to an album or media item.
///
/// Opaque to this system; only equality and ordering (for deterministic
/// serialization) are meaningful.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(String);

impl RemoteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RemoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RemoteId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Content checksum of a local file.
///
/// Base64-encoded SHA-256 of the file content, or of `path + size` for files
/// above the hashing ceiling (see the fingerprinter). Two checksums compare
/// equal iff the fingerprinter considers the content identical.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checksum(String);

impl Checksum {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Checksum {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
