//! Narrative classification with optimistic persistence
//!
//! A toggle sets an explicit target value, never a flip of "current"
//! state, which keeps retries and duplicate submissions idempotent. Toggles on
//! the same part serialize behind a per-part lock; the second waits for the
//! first's resolution instead of racing it.

use crate::client::{ApiError, BookService};
use crate::model::{BookId, BookPart, PartId};
use crate::toc::arena::PartArena;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

/// Default preview length, in characters
pub const DEFAULT_PREVIEW_LEN: usize = 120;

/// Errors from a classification toggle
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("part {0} is not in the book's table of contents")]
    UnknownPart(PartId),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Per-part toggle lifecycle
///
/// `Applied` and `RolledBack` describe the most recent resolution; a new
/// attempt moves the part back through `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleState {
    Idle,
    Pending,
    Applied,
    RolledBack,
}

/// Resolution of a successful toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub part_id: PartId,
    /// Value before the attempt
    pub previous: bool,
    /// Persisted value confirmed by the server
    pub persisted: bool,
}

/// Cache of truncated part-content previews, keyed by book
///
/// Content is fetched in bulk and large; the tree view only ever shows a
/// single-line preview. Entries are dropped whole on invalidation and
/// rebuilt from a fresh fetch, never patched in place.
#[derive(Debug)]
pub struct PreviewCache {
    max_len: usize,
    books: DashMap<BookId, HashMap<PartId, String>>,
}

impl PreviewCache {
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len,
            books: DashMap::new(),
        }
    }

    /// Build the preview map for a book from full part records
    pub fn insert_book(&self, book_id: BookId, parts: &[BookPart]) {
        let previews = parts
            .iter()
            .map(|part| (part.id, truncate_preview(&part.content, self.max_len)))
            .collect();
        self.books.insert(book_id, previews);
    }

    /// Look up a part's preview
    pub fn preview(&self, book_id: &BookId, part_id: &PartId) -> Option<String> {
        self.books
            .get(book_id)
            .and_then(|book| book.get(part_id).cloned())
    }

    /// Whether previews for the book are currently cached
    pub fn is_cached(&self, book_id: &BookId) -> bool {
        self.books.contains_key(book_id)
    }

    /// Drop a book's previews; returns whether anything was cached
    pub fn invalidate(&self, book_id: &BookId) -> bool {
        self.books.remove(book_id).is_some()
    }
}

impl Default for PreviewCache {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_LEN)
    }
}

/// Collapse whitespace and truncate on a character boundary
fn truncate_preview(content: &str, max_len: usize) -> String {
    let mut preview = String::with_capacity(max_len + 3);
    let mut chars = 0usize;
    for word in content.split_whitespace() {
        if chars >= max_len {
            preview.push('…');
            return preview;
        }
        if chars > 0 {
            preview.push(' ');
            chars += 1;
        }
        for ch in word.chars() {
            if chars >= max_len {
                preview.push('…');
                return preview;
            }
            preview.push(ch);
            chars += 1;
        }
    }
    preview
}

/// Persists narrative classification with optimistic local updates
///
/// The arena is updated before the server round-trip and restored to the
/// pre-attempt value when the round-trip fails, so a failed toggle never
/// corrupts the local tree.
pub struct Classifier {
    service: Arc<dyn BookService>,
    previews: Arc<PreviewCache>,
    locks: DashMap<PartId, Arc<Mutex<()>>>,
    states: DashMap<PartId, ToggleState>,
}

impl Classifier {
    pub fn new(service: Arc<dyn BookService>, previews: Arc<PreviewCache>) -> Self {
        Self {
            service,
            previews,
            locks: DashMap::new(),
            states: DashMap::new(),
        }
    }

    /// Current toggle state of a part
    pub fn state(&self, part_id: &PartId) -> ToggleState {
        self.states
            .get(part_id)
            .map(|s| *s)
            .unwrap_or(ToggleState::Idle)
    }

    /// Set a part's narrative flag to an explicit target value
    ///
    /// Serialized per part: a concurrent toggle on the same part waits for
    /// this one to resolve. On server rejection the arena value is rolled
    /// back and the error propagated.
    pub async fn set_story_part(
        &self,
        arena: &RwLock<PartArena>,
        part_id: PartId,
        target: bool,
    ) -> Result<ToggleOutcome, ClassifyError> {
        let lock = self
            .locks
            .entry(part_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _serialized = lock.lock().await;

        let (book_id, previous) = {
            let mut tree = arena.write().await;
            let book_id = tree.book_id();
            let previous = tree
                .mark_story_part(&part_id, target)
                .ok_or(ClassifyError::UnknownPart(part_id))?;
            (book_id, previous)
        };
        self.states.insert(part_id, ToggleState::Pending);
        debug!(%part_id, target, "classification update pending");

        match self.service.update_story_part(&part_id, target).await {
            Ok(updated) => {
                // The server value is authoritative; reconcile rather than
                // trusting the optimistic write.
                arena
                    .write()
                    .await
                    .mark_story_part(&part_id, updated.is_story_part);
                self.previews.invalidate(&book_id);
                self.states.insert(part_id, ToggleState::Applied);
                Ok(ToggleOutcome {
                    part_id,
                    previous,
                    persisted: updated.is_story_part,
                })
            }
            Err(err) => {
                arena.write().await.mark_story_part(&part_id, previous);
                self.states.insert(part_id, ToggleState::RolledBack);
                warn!(%part_id, error = %err, "classification update rolled back");
                Err(ClassifyError::Api(err))
            }
        }
    }
}
