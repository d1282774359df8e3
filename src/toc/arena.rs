//! Arena-backed table-of-contents tree
//!
//! The flat records from the service become an arena of slots with
//! index-based child lists. Nested ownership is deliberately avoided:
//! integrity checks are bounded passes over the arena, and traversal uses
//! an explicit stack, so arbitrarily deep documents cannot overflow the
//! call stack or loop forever on malformed input.

use crate::model::{BookId, PartId, TocPart};
use std::collections::HashMap;
use thiserror::Error;

/// Structural faults in a flat part set
///
/// A missing or duplicated node would silently exclude a whole subtree
/// from classification review, so every fault is surfaced instead of
/// dropped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("part set is empty or has no root part")]
    NoRoot,

    #[error("{0} parts claim to be the root")]
    MultipleRoots(usize),

    #[error("part {part} references missing parent {parent}")]
    Orphan { part: PartId, parent: PartId },

    #[error("duplicate part id: {0}")]
    DuplicateId(PartId),

    #[error("part {part} belongs to book {book}, not the set's book")]
    ForeignPart { part: PartId, book: BookId },

    #[error("{0} parts are unreachable from the root")]
    Unreachable(usize),
}

/// Result type for tree construction
pub type HierarchyResult<T> = Result<T, HierarchyError>;

/// A book's table of contents as a rooted ordered tree
///
/// Nodes live in a flat arena; children are slot indexes sorted by
/// `sibling_index`. Output order is fully determined by `sibling_index`,
/// never by input order.
#[derive(Debug, Clone)]
pub struct PartArena {
    book_id: BookId,
    nodes: Vec<TocPart>,
    children: Vec<Vec<usize>>,
    depths: Vec<u32>,
    index: HashMap<PartId, usize>,
    root: usize,
}

impl PartArena {
    /// Build the tree from a flat record set
    ///
    /// Grouping is by `parent_id`; each group is attached to its parent
    /// sorted by `sibling_index` ascending. Fails on any structural fault
    /// rather than producing a partial tree.
    pub fn build(parts: Vec<TocPart>) -> HierarchyResult<Self> {
        if parts.is_empty() {
            return Err(HierarchyError::NoRoot);
        }

        let book_id = parts[0].book_id;
        let mut index = HashMap::with_capacity(parts.len());
        for (slot, part) in parts.iter().enumerate() {
            if part.book_id != book_id {
                return Err(HierarchyError::ForeignPart {
                    part: part.id,
                    book: part.book_id,
                });
            }
            if index.insert(part.id, slot).is_some() {
                return Err(HierarchyError::DuplicateId(part.id));
            }
        }

        let roots: Vec<usize> = parts
            .iter()
            .enumerate()
            .filter(|(_, p)| p.parent_id.is_none())
            .map(|(slot, _)| slot)
            .collect();
        let root = match roots.as_slice() {
            [] => return Err(HierarchyError::NoRoot),
            [single] => *single,
            many => return Err(HierarchyError::MultipleRoots(many.len())),
        };

        let mut children: Vec<Vec<usize>> = vec![Vec::new(); parts.len()];
        for (slot, part) in parts.iter().enumerate() {
            if let Some(parent_id) = part.parent_id {
                let parent_slot = *index.get(&parent_id).ok_or(HierarchyError::Orphan {
                    part: part.id,
                    parent: parent_id,
                })?;
                children[parent_slot].push(slot);
            }
        }
        for group in &mut children {
            group.sort_by_key(|&slot| parts[slot].sibling_index);
        }

        // Reachability sweep from the root. A cycle among non-root parts
        // passes the orphan check but leaves its members unreached.
        let mut depths = vec![0u32; parts.len()];
        let mut visited = vec![false; parts.len()];
        let mut stack = vec![root];
        let mut reached = 0usize;
        while let Some(slot) = stack.pop() {
            if visited[slot] {
                continue;
            }
            visited[slot] = true;
            reached += 1;
            for &child in &children[slot] {
                depths[child] = depths[slot] + 1;
                stack.push(child);
            }
        }
        if reached != parts.len() {
            return Err(HierarchyError::Unreachable(parts.len() - reached));
        }

        Ok(Self {
            book_id,
            nodes: parts,
            children,
            depths,
            index,
            root,
        })
    }

    /// The book this tree belongs to
    pub fn book_id(&self) -> BookId {
        self.book_id
    }

    /// Number of parts in the tree
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A built arena always holds at least the root
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The root part
    pub fn root(&self) -> &TocPart {
        &self.nodes[self.root]
    }

    /// Look up a part by id
    pub fn get(&self, id: &PartId) -> Option<&TocPart> {
        self.index.get(id).map(|&slot| &self.nodes[slot])
    }

    /// Whether the tree contains the part
    pub fn contains(&self, id: &PartId) -> bool {
        self.index.contains_key(id)
    }

    /// Children of a part, in sibling order
    pub fn children(&self, id: &PartId) -> Option<impl Iterator<Item = &TocPart>> {
        self.index
            .get(id)
            .map(|&slot| self.children[slot].iter().map(|&child| &self.nodes[child]))
    }

    /// Distance from the root (root is 0)
    pub fn depth(&self, id: &PartId) -> Option<u32> {
        self.index.get(id).map(|&slot| self.depths[slot])
    }

    /// Set a part's narrative flag, returning the previous value
    ///
    /// Returns `None` when the part is not in this tree. The caller owns
    /// rollback: a failed persist must restore the returned value.
    pub fn mark_story_part(&mut self, id: &PartId, value: bool) -> Option<bool> {
        let slot = *self.index.get(id)?;
        let previous = self.nodes[slot].is_story_part;
        self.nodes[slot].is_story_part = value;
        Some(previous)
    }

    /// Iterate the tree in pre-order (parent before children, siblings in
    /// `sibling_index` order), without recursion
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder {
            arena: self,
            stack: vec![self.root],
        }
    }

    /// Pre-order flattening back to flat records
    pub fn flatten(&self) -> Vec<TocPart> {
        self.preorder().cloned().collect()
    }
}

/// Iterative pre-order traversal over a [`PartArena`]
pub struct Preorder<'a> {
    arena: &'a PartArena,
    stack: Vec<usize>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = &'a TocPart;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.stack.pop()?;
        // Push children reversed so the lowest sibling_index pops first.
        for &child in self.arena.children[slot].iter().rev() {
            self.stack.push(child);
        }
        Some(&self.arena.nodes[slot])
    }
}
