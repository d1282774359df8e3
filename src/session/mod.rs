//! Session state: book selection and in-flight operation registry
//!
//! The selected book is explicit state with change notification over a
//! watch channel; components subscribe instead of listening for ambient
//! broadcasts. Every asynchronous operation registers a cancellation token
//! keyed by `(ResourceKind, BookId)`; selecting a different book cancels
//! the previous book's tokens so late responses never cross books.

use crate::model::{Book, BookId};
use crate::tracker::CancelToken;
use dashmap::DashMap;
use tokio::sync::watch;
use tracing::{debug, info};

/// The kinds of per-book asynchronous operations the session tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    TableOfContents,
    PartContent,
    ExtractionStatus,
    Entities,
}

/// Shared session state
#[derive(Debug)]
pub struct Session {
    selected: watch::Sender<Option<BookId>>,
    inflight: DashMap<(ResourceKind, BookId), CancelToken>,
}

impl Session {
    pub fn new() -> Self {
        let (selected, _) = watch::channel(None);
        Self {
            selected,
            inflight: DashMap::new(),
        }
    }

    /// The currently selected book
    pub fn selected(&self) -> Option<BookId> {
        *self.selected.borrow()
    }

    /// Subscribe to selection changes
    pub fn subscribe(&self) -> watch::Receiver<Option<BookId>> {
        self.selected.subscribe()
    }

    /// Change the selected book
    ///
    /// Cancels every registered operation of the previously selected book
    /// before publishing the new value, so nothing started for the old
    /// book can apply its response against the new one.
    pub fn select_book(&self, book_id: Option<BookId>) {
        let previous = self.selected();
        if previous == book_id {
            return;
        }
        if let Some(old) = previous {
            self.cancel_book(&old);
        }
        info!(?previous, selected = ?book_id, "book selection changed");
        self.selected.send_replace(book_id);
    }

    /// Clear a selection whose book vanished from a refreshed listing
    ///
    /// Returns whether the selection was cleared.
    pub fn reconcile_selection(&self, books: &[Book]) -> bool {
        match self.selected() {
            Some(id) if !books.iter().any(|b| b.id == id) => {
                debug!(book_id = %id, "selected book no longer listed");
                self.select_book(None);
                true
            }
            _ => false,
        }
    }

    /// Register an operation, cancelling any previous one under the same key
    ///
    /// Returns the token the operation must check before issuing its
    /// request and before applying the response.
    pub fn register(&self, kind: ResourceKind, book_id: BookId) -> CancelToken {
        let token = CancelToken::new();
        if let Some(old) = self.inflight.insert((kind, book_id), token.clone()) {
            old.cancel();
        }
        token
    }

    /// Drop a finished operation's registration
    ///
    /// Keeps the entry when a newer token has already replaced it.
    pub fn complete(&self, kind: ResourceKind, book_id: BookId, token: &CancelToken) {
        self.inflight
            .remove_if(&(kind, book_id), |_, current| current.same_token(token));
    }

    /// Cancel every registered operation for a book
    pub fn cancel_book(&self, book_id: &BookId) {
        let keys: Vec<(ResourceKind, BookId)> = self
            .inflight
            .iter()
            .filter(|entry| entry.key().1 == *book_id)
            .map(|entry| *entry.key())
            .collect();
        for key in keys {
            if let Some((_, token)) = self.inflight.remove(&key) {
                debug!(kind = ?key.0, book_id = %key.1, "cancelling in-flight operation");
                token.cancel();
            }
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
