use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a folder node.
///
/// `0` (or `null` on the wire) marks an empty placeholder slot. Such a folder
/// is part of the structure but never counts as occupied content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "Option<u64>", into = "u64")]
pub struct FolderId(u64);

impl FolderId {
    pub const EMPTY: FolderId = FolderId(0);

    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn is_occupied(self) -> bool {
        self.0 != 0
    }
}

impl From<Option<u64>> for FolderId {
    fn from(raw: Option<u64>) -> Self {
        Self(raw.unwrap_or(0))
    }
}

impl From<u64> for FolderId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<FolderId> for u64 {
    fn from(id: FolderId) -> Self {
        id.0
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "<empty>")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Identifier of a layout template in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayoutId(pub u32);

impl fmt::Display for LayoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Album identifier as issued by the remote system
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlbumId(pub String);

impl AlbumId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AlbumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
