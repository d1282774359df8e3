//! Book part records: the structural segments of a parsed book

use super::book::BookId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a book part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartId(Uuid);

impl PartId {
    /// Create a new random PartId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a PartId from an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID value
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for PartId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PartId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for PartId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl std::str::FromStr for PartId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A flat table-of-contents record
///
/// This is the wire form: parent linkage only, no content, no children.
/// Tree structure exists solely in [`crate::toc::PartArena`], built from a
/// full set of these records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TocPart {
    /// Unique identifier
    pub id: PartId,
    /// Owning book
    pub book_id: BookId,
    /// Parent part; `None` only for the root
    pub parent_id: Option<PartId>,
    /// Display title (chapter or section name)
    pub label: String,
    /// Zero-based position among siblings sharing the same parent
    pub sibling_index: u32,
    /// Whether the part holds narrative content eligible for extraction
    pub is_story_part: bool,
    /// When the part record was created server-side
    pub created_at: DateTime<Utc>,
}

/// A full book part, content included
///
/// Fetched separately from the TOC because `content` can be large; the
/// engine keeps only truncated previews of it cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookPart {
    /// Unique identifier
    pub id: PartId,
    /// Owning book
    pub book_id: BookId,
    /// Parent part; `None` only for the root
    pub parent_id: Option<PartId>,
    /// Display title
    pub label: String,
    /// Zero-based position among siblings
    pub sibling_index: u32,
    /// Whether the part holds narrative content
    pub is_story_part: bool,
    /// Raw extracted text of the part
    pub content: String,
    /// Whether the extraction job has already processed this part
    #[serde(default)]
    pub is_entity_extracted: bool,
    /// When the part record was created server-side
    pub created_at: DateTime<Utc>,
}

impl BookPart {
    /// Project down to the flat TOC record form
    pub fn to_toc_part(&self) -> TocPart {
        TocPart {
            id: self.id,
            book_id: self.book_id,
            parent_id: self.parent_id,
            label: self.label.clone(),
            sibling_index: self.sibling_index,
            is_story_part: self.is_story_part,
            created_at: self.created_at,
        }
    }
}
