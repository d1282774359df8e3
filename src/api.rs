//! Transport-independent API layer
//!
//! `FabulaApi` is the single entry point for consumer-facing operations.
//! Transports (the CLI here, anything else later) call these methods;
//! they never reach into the service client, the session registry, or the
//! arenas directly.

use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::client::{ApiError, BookService};
use crate::entities::{aggregate, EntityRollup};
use crate::model::{Book, BookId, BookPart, ExtractionProcess, PartId, ProcessState};
use crate::session::{ResourceKind, Session};
use crate::toc::{
    ClassifyError, Classifier, HierarchyError, PartArena, PreviewCache, ToggleOutcome,
};
use crate::tracker::{
    EstimatorConfig, ExtractionTracker, ProgressReport, TrackerConfig, TrackerError,
};

/// Errors surfaced by the API layer
#[derive(Debug, Error)]
pub enum FabulaError {
    #[error("no book selected")]
    NoSelection,

    /// The operation was cancelled because a newer selection replaced it;
    /// its response was discarded, not applied
    #[error("request superseded by a newer selection")]
    Superseded,

    #[error("extraction is not complete for book {0}")]
    ExtractionIncomplete(BookId),

    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),

    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error(transparent)]
    Tracker(#[from] TrackerError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Result type for API operations
pub type FabulaResult<T> = Result<T, FabulaError>;

/// Single entry point for all consumer-facing operations
pub struct FabulaApi {
    service: Arc<dyn BookService>,
    session: Session,
    previews: Arc<PreviewCache>,
    classifier: Classifier,
    arenas: DashMap<BookId, Arc<RwLock<PartArena>>>,
    tracker_config: TrackerConfig,
    estimator: EstimatorConfig,
}

impl FabulaApi {
    /// Create an API instance over a service implementation
    pub fn new(service: Arc<dyn BookService>) -> Self {
        let previews = Arc::new(PreviewCache::default());
        let classifier = Classifier::new(service.clone(), previews.clone());
        Self {
            service,
            session: Session::new(),
            previews,
            classifier,
            arenas: DashMap::new(),
            tracker_config: TrackerConfig::default(),
            estimator: EstimatorConfig::default(),
        }
    }

    /// Replace the polling tuning used by trackers this API creates
    pub fn with_tracker_config(mut self, config: TrackerConfig) -> Self {
        self.tracker_config = config;
        self
    }

    /// Replace the estimator tuning used by trackers this API creates
    pub fn with_estimator(mut self, estimator: EstimatorConfig) -> Self {
        self.estimator = estimator;
        self
    }

    /// The session (selection state and subscription)
    pub fn session(&self) -> &Session {
        &self.session
    }

    // --- Books ---

    /// List books and reconcile the selection against the fresh listing
    pub async fn books(&self) -> FabulaResult<Vec<Book>> {
        let books = self.service.list_books().await?;
        self.session.reconcile_selection(&books);
        Ok(books)
    }

    /// Select a book (or clear the selection), cancelling the previous
    /// book's in-flight operations
    pub fn select_book(&self, book_id: Option<BookId>) {
        self.session.select_book(book_id);
    }

    /// The currently selected book
    pub fn selected_book(&self) -> Option<BookId> {
        self.session.selected()
    }

    /// Delete a book and drop every piece of local state derived from it
    pub async fn delete_book(&self, book_id: BookId) -> FabulaResult<Book> {
        let deleted = self.service.delete_book(&book_id).await?;
        self.session.cancel_book(&book_id);
        if self.session.selected() == Some(book_id) {
            self.session.select_book(None);
        }
        self.arenas.remove(&book_id);
        self.previews.invalidate(&book_id);
        Ok(deleted)
    }

    // --- Table of contents ---

    /// Fetch and rebuild a book's part tree
    ///
    /// Keyed in the session registry: a newer refresh or a book switch
    /// cancels this one, and a response arriving after cancellation is
    /// discarded instead of installed.
    pub async fn refresh_toc(&self, book_id: BookId) -> FabulaResult<Arc<RwLock<PartArena>>> {
        let token = self.session.register(ResourceKind::TableOfContents, book_id);
        token.checkpoint().map_err(|_| FabulaError::Superseded)?;
        let flat = self.service.table_of_contents(&book_id).await?;
        token.checkpoint().map_err(|_| FabulaError::Superseded)?;

        let arena = Arc::new(RwLock::new(PartArena::build(flat)?));
        self.arenas.insert(book_id, arena.clone());
        self.session
            .complete(ResourceKind::TableOfContents, book_id, &token);
        Ok(arena)
    }

    /// A book's part tree, cached or freshly built
    pub async fn toc(&self, book_id: BookId) -> FabulaResult<Arc<RwLock<PartArena>>> {
        if let Some(arena) = self.arenas.get(&book_id) {
            return Ok(arena.clone());
        }
        self.refresh_toc(book_id).await
    }

    /// A single part with its full content
    pub async fn part(&self, part_id: PartId) -> FabulaResult<BookPart> {
        Ok(self.service.book_part(&part_id).await?)
    }

    /// Truncated content preview for a part, fetching the book's content
    /// on first access
    pub async fn part_preview(
        &self,
        book_id: BookId,
        part_id: PartId,
    ) -> FabulaResult<Option<String>> {
        if !self.previews.is_cached(&book_id) {
            let token = self.session.register(ResourceKind::PartContent, book_id);
            token.checkpoint().map_err(|_| FabulaError::Superseded)?;
            let parts = self.service.book_parts(&book_id).await?;
            token.checkpoint().map_err(|_| FabulaError::Superseded)?;
            self.previews.insert_book(book_id, &parts);
            self.session
                .complete(ResourceKind::PartContent, book_id, &token);
        }
        Ok(self.previews.preview(&book_id, &part_id))
    }

    // --- Classification ---

    /// Set a part of the selected book to an explicit narrative flag
    ///
    /// Requires a selection; the part must be in the selected book's tree.
    pub async fn set_story_part(
        &self,
        part_id: PartId,
        is_story_part: bool,
    ) -> FabulaResult<ToggleOutcome> {
        let book_id = self.session.selected().ok_or(FabulaError::NoSelection)?;
        let arena = self.toc(book_id).await?;
        let outcome = self
            .classifier
            .set_story_part(&arena, part_id, is_story_part)
            .await?;
        Ok(outcome)
    }

    // --- Extraction ---

    /// One-shot extraction status
    pub async fn extraction_status(&self, book_id: BookId) -> FabulaResult<ExtractionProcess> {
        Ok(self.plain_tracker(book_id).status().await?)
    }

    /// Trigger extraction; rejected when the job already ran or is running
    pub async fn trigger_extraction(&self, book_id: BookId) -> FabulaResult<ExtractionProcess> {
        Ok(self.plain_tracker(book_id).trigger().await?)
    }

    /// Poll extraction status until complete, reporting each observation
    ///
    /// Registered under `(ExtractionStatus, book)`: switching the selected
    /// book cancels the watch, and its late responses are discarded.
    pub async fn watch_extraction<F>(
        &self,
        book_id: BookId,
        on_update: F,
    ) -> FabulaResult<ExtractionProcess>
    where
        F: FnMut(&ExtractionProcess, &ProgressReport),
    {
        let token = self
            .session
            .register(ResourceKind::ExtractionStatus, book_id);
        let tracker = self.plain_tracker(book_id).with_token(token.clone());
        let outcome = tracker.watch(on_update).await;
        self.session
            .complete(ResourceKind::ExtractionStatus, book_id, &token);
        Ok(outcome?)
    }

    fn plain_tracker(&self, book_id: BookId) -> ExtractionTracker {
        ExtractionTracker::new(self.service.clone(), book_id)
            .with_config(self.tracker_config)
            .with_estimator(self.estimator)
    }

    // --- Entities ---

    /// Ranked per-part entity rollup for a book with a completed job
    ///
    /// An empty rollup is a valid outcome (no entities extracted); errors
    /// mean the precondition or the transport failed.
    pub async fn entity_rollup(&self, book_id: BookId) -> FabulaResult<Vec<EntityRollup>> {
        let process = self.extraction_status(book_id).await?;
        if process.state() != ProcessState::Complete {
            return Err(FabulaError::ExtractionIncomplete(book_id));
        }

        let token = self.session.register(ResourceKind::Entities, book_id);
        token.checkpoint().map_err(|_| FabulaError::Superseded)?;
        let entities = self.service.book_entities(&book_id).await?;
        token.checkpoint().map_err(|_| FabulaError::Superseded)?;
        self.session
            .complete(ResourceKind::Entities, book_id, &token);

        let arena = self.toc(book_id).await?;
        let tree = arena.read().await;
        Ok(aggregate(entities, &tree))
    }
}
