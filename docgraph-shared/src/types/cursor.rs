//! Opaque pagination cursors.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Base64 encoding of a document's identity path.
///
/// Encoding is deterministic, so the same document always yields the same cursor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Encode the identity path of a document.
    pub fn encode(path: &str) -> Self {
        Self(STANDARD.encode(path.as_bytes()))
    }

    /// Wrap an already encoded cursor received from a caller.
    pub fn from_encoded(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Decode back into the identity path. `None` if not valid base64 or not UTF-8.
    pub fn decode(&self) -> Option<String> {
        let bytes = STANDARD.decode(self.0.as_bytes()).ok()?;
        String::from_utf8(bytes).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
