//! Service trait definitions

use super::error::ApiResult;
use crate::model::{Book, BookId, BookPart, Entity, ExtractionProcess, PartId, TocPart};
use async_trait::async_trait;

/// The book service consumed by the engine
///
/// Implementations must be thread-safe (Send + Sync); the engine shares a
/// single instance across concurrent operations. The HTTP implementation is
/// [`super::HttpBookService`]; tests substitute in-memory fakes at this
/// seam.
#[async_trait]
pub trait BookService: Send + Sync {
    // === Books ===

    /// List the caller's books
    async fn list_books(&self) -> ApiResult<Vec<Book>>;

    /// Delete a book, returning the deleted record
    async fn delete_book(&self, book_id: &BookId) -> ApiResult<Book>;

    // === Book parts ===

    /// Flat table-of-contents records for a book
    async fn table_of_contents(&self, book_id: &BookId) -> ApiResult<Vec<TocPart>>;

    /// Full parts with content for a book
    async fn book_parts(&self, book_id: &BookId) -> ApiResult<Vec<BookPart>>;

    /// A single part with content
    async fn book_part(&self, part_id: &PartId) -> ApiResult<BookPart>;

    /// Persist a part's narrative flag to an explicit target value
    async fn update_story_part(&self, part_id: &PartId, is_story_part: bool)
        -> ApiResult<BookPart>;

    // === Extraction ===

    /// Start the entity-extraction job for a book
    async fn trigger_extraction(&self, book_id: &BookId) -> ApiResult<()>;

    /// Current extraction status for a book
    async fn extraction_process(&self, book_id: &BookId) -> ApiResult<ExtractionProcess>;

    /// Extracted entities, available once the job is complete
    async fn book_entities(&self, book_id: &BookId) -> ApiResult<Vec<Entity>>;
}
