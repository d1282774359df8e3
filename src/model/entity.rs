//! Extracted entities and their supporting evidence

use super::part::PartId;
use serde::{Deserialize, Serialize};

/// Semantic category of an extracted entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityCategory {
    Person,
    Location,
    Organization,
    Concept,
}

impl EntityCategory {
    /// Lower-case label for display and filtering
    pub fn label(&self) -> &'static str {
        match self {
            EntityCategory::Person => "person",
            EntityCategory::Location => "location",
            EntityCategory::Organization => "organization",
            EntityCategory::Concept => "concept",
        }
    }
}

impl std::fmt::Display for EntityCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for EntityCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "person" => Ok(EntityCategory::Person),
            "location" => Ok(EntityCategory::Location),
            "organization" => Ok(EntityCategory::Organization),
            "concept" => Ok(EntityCategory::Concept),
            other => Err(format!("unknown entity category: {}", other)),
        }
    }
}

/// Evidence of an entity's presence in a specific book part
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fact {
    /// The part in which the entity was observed
    pub book_part_id: PartId,
    /// Snippet supporting the observation
    pub content: String,
    /// How many times the entity occurs within the part; absent counts as 1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurrences: Option<u64>,
    /// Position of the part among its siblings, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sibling_index: Option<u32>,
    /// Sibling count of the part, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sibling_total: Option<u32>,
}

impl Fact {
    /// Occurrence count with the missing-value default applied
    pub fn occurrence_count(&self) -> u64 {
        self.occurrences.unwrap_or(1)
    }
}

/// An entity extracted from a book's narrative parts
///
/// Immutable once fetched: the result set is a read-only view owned by the
/// extraction run that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Canonical name
    pub name: String,
    /// Other names the entity appears under
    #[serde(default)]
    pub alternative_names: Vec<String>,
    /// Semantic category
    pub category: EntityCategory,
    /// Supporting evidence, in extraction order
    #[serde(default)]
    pub facts: Vec<Fact>,
}

impl Entity {
    /// Total occurrences across all facts
    pub fn total_occurrences(&self) -> u64 {
        self.facts.iter().map(Fact::occurrence_count).sum()
    }
}
