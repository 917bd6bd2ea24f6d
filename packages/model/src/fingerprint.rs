//! # Stripped Serialization
//!
//! Change detection compares trees by a canonical text form that leaves out
//! the version marker. A refresh that only moves the marker (a remote save
//! acknowledgement, a re-render on the server) produces the same text and
//! therefore never looks like a local edit.

use crate::error::{ModelError, ModelResult};
use crate::tree::AlbumTree;
use crc32fast::Hasher;
use serde_json::Value;
use std::fmt;

/// Keys excluded from the stripped form
const VOLATILE_KEYS: [&str; 2] = ["version", "creationTime"];

/// Canonical JSON of the tree without its version marker.
///
/// Object keys come out sorted, so equal trees always produce equal text.
pub fn stripped_json(tree: &AlbumTree) -> ModelResult<String> {
    let mut value = serde_json::to_value(tree)?;

    match &mut value {
        Value::Object(map) => {
            for key in VOLATILE_KEYS {
                map.remove(key);
            }
        }
        other => {
            return Err(ModelError::UnexpectedShape(format!(
                "expected an object, found {}",
                other
            )))
        }
    }

    Ok(serde_json::to_string(&value)?)
}

/// Stripped serialization of a tree, the baseline for change detection.
///
/// Equality compares the full text. The CRC32 is only a short label for
/// display.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(tree: &AlbumTree) -> ModelResult<Self> {
        Ok(Self(stripped_json(tree)?))
    }

    pub fn of_text(text: &str) -> Self {
        Self(text.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn checksum(&self) -> u32 {
        let mut hasher = Hasher::new();
        hasher.update(self.0.as_bytes());
        hasher.finalize()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.checksum())
    }
}
