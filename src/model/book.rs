//! Book identity and catalog records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a book
///
/// Serializes as a plain UUID string, matching the service's path and
/// payload format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(Uuid);

impl BookId {
    /// Create a new random BookId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a BookId from an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID value
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for BookId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl std::str::FromStr for BookId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A book in the user's catalog
///
/// Upload mechanics live elsewhere; this is the read-side record the rest
/// of the engine keys everything on. `is_parsed` gates whether a table of
/// contents exists yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    /// Unique identifier
    pub id: BookId,
    /// Display title
    pub title: String,
    /// Author name as parsed from the upload
    pub author: String,
    /// Upload timestamp
    pub created_at: DateTime<Utc>,
    /// Original file type (epub, pdf, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    /// Base64-encoded cover image, when one was extracted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image_base64: Option<String>,
    /// Whether server-side parsing has produced book parts
    pub is_parsed: bool,
}
