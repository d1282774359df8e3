//! Entity aggregation over a completed extraction run
//!
//! Facts arrive grouped per entity but flat across parts; the rollup
//! regroups them per part, labels each group from the table of contents,
//! and ranks entities by total occurrences. An empty entity set is a valid
//! result, not an error; the distinction from transport failure is made
//! at the client layer.

use crate::model::{Entity, EntityCategory, Fact, PartId};
use crate::toc::PartArena;
use serde::Serialize;
use std::collections::HashMap;

/// Facts an entity has in one book part
#[derive(Debug, Clone, Serialize)]
pub struct PartFacts {
    pub part_id: PartId,
    /// Label from the table of contents; `None` when the part is no longer
    /// in the tree (the facts still count)
    pub label: Option<String>,
    pub facts: Vec<Fact>,
    /// Sum of occurrence counts within this part
    pub occurrences: u64,
}

/// One entity with its per-part evidence, ranked within a rollup
#[derive(Debug, Clone, Serialize)]
pub struct EntityRollup {
    pub name: String,
    pub alternative_names: Vec<String>,
    pub category: EntityCategory,
    /// Sum of occurrence counts across all parts
    pub total_occurrences: u64,
    /// Per-part groupings, highest occurrence count first
    pub parts: Vec<PartFacts>,
}

/// Group each entity's facts per part and rank entities
///
/// Entities are sorted by descending total occurrence count; ties break by
/// case-insensitive name so equal-count entities order deterministically.
/// Facts without an explicit occurrence count contribute 1.
pub fn aggregate(entities: Vec<Entity>, tree: &PartArena) -> Vec<EntityRollup> {
    let mut rollups: Vec<EntityRollup> = entities
        .into_iter()
        .map(|entity| rollup_entity(entity, tree))
        .collect();

    rollups.sort_by(|a, b| {
        b.total_occurrences
            .cmp(&a.total_occurrences)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    rollups
}

fn rollup_entity(entity: Entity, tree: &PartArena) -> EntityRollup {
    let mut order: Vec<PartId> = Vec::new();
    let mut grouped: HashMap<PartId, Vec<Fact>> = HashMap::new();
    for fact in entity.facts {
        if !grouped.contains_key(&fact.book_part_id) {
            order.push(fact.book_part_id);
        }
        grouped.entry(fact.book_part_id).or_default().push(fact);
    }

    let mut parts: Vec<PartFacts> = order
        .into_iter()
        .map(|part_id| {
            let facts = grouped.remove(&part_id).unwrap_or_default();
            let occurrences = facts.iter().map(Fact::occurrence_count).sum();
            PartFacts {
                part_id,
                label: tree.get(&part_id).map(|p| p.label.clone()),
                facts,
                occurrences,
            }
        })
        .collect();
    // Stable sort: equal-count parts keep fact order.
    parts.sort_by(|a, b| b.occurrences.cmp(&a.occurrences));

    let total_occurrences = parts.iter().map(|p| p.occurrences).sum();
    EntityRollup {
        name: entity.name,
        alternative_names: entity.alternative_names,
        category: entity.category,
        total_occurrences,
        parts,
    }
}

/// Display-side filtering over a rollup
#[derive(Debug, Clone, Default)]
pub struct EntityFilter {
    /// Keep only this category
    pub category: Option<EntityCategory>,
    /// Keep only names containing this term, case-insensitively
    pub search: Option<String>,
}

impl EntityFilter {
    pub fn matches(&self, rollup: &EntityRollup) -> bool {
        if let Some(category) = self.category {
            if rollup.category != category {
                return false;
            }
        }
        if let Some(term) = &self.search {
            if !rollup.name.to_lowercase().contains(&term.to_lowercase()) {
                return false;
            }
        }
        true
    }

    /// Apply the filter, preserving rank order
    pub fn apply<'a>(&self, rollups: &'a [EntityRollup]) -> Vec<&'a EntityRollup> {
        rollups.iter().filter(|r| self.matches(r)).collect()
    }
}
