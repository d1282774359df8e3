//! Common test utilities: fixtures and an in-memory book service

// Not every test binary uses every helper.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use fabula::{
    ApiError, Book, BookId, BookPart, BookService, Entity, ExtractionProcess, PartId, TocPart,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub fn book(id: BookId, title: &str) -> Book {
    Book {
        id,
        title: title.to_string(),
        author: "Test Author".to_string(),
        created_at: Utc::now(),
        file_type: Some("epub".to_string()),
        cover_image_base64: None,
        is_parsed: true,
    }
}

pub fn toc_part(
    id: PartId,
    book_id: BookId,
    parent_id: Option<PartId>,
    label: &str,
    sibling_index: u32,
) -> TocPart {
    TocPart {
        id,
        book_id,
        parent_id,
        label: label.to_string(),
        sibling_index,
        is_story_part: false,
        created_at: Utc::now(),
    }
}

pub fn book_part(toc: &TocPart, content: &str) -> BookPart {
    BookPart {
        id: toc.id,
        book_id: toc.book_id,
        parent_id: toc.parent_id,
        label: toc.label.clone(),
        sibling_index: toc.sibling_index,
        is_story_part: toc.is_story_part,
        content: content.to_string(),
        is_entity_extracted: false,
        created_at: toc.created_at,
    }
}

/// A small fixture book: root with two chapters, first chapter has a scene
pub struct Fixture {
    pub book_id: BookId,
    pub root: PartId,
    pub chapter_one: PartId,
    pub chapter_two: PartId,
    pub scene: PartId,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            book_id: BookId::new(),
            root: PartId::new(),
            chapter_one: PartId::new(),
            chapter_two: PartId::new(),
            scene: PartId::new(),
        }
    }

    pub fn toc(&self) -> Vec<TocPart> {
        vec![
            toc_part(self.root, self.book_id, None, "Book", 0),
            toc_part(self.chapter_one, self.book_id, Some(self.root), "Chapter 1", 0),
            toc_part(self.chapter_two, self.book_id, Some(self.root), "Chapter 2", 1),
            toc_part(self.scene, self.book_id, Some(self.chapter_one), "Scene", 0),
        ]
    }
}

/// In-memory book service with programmable status script and fault
/// injection, shared behind `Arc` with the code under test
pub struct InMemoryService {
    pub books: Mutex<Vec<Book>>,
    pub parts: Mutex<HashMap<PartId, BookPart>>,
    pub toc: Mutex<Vec<TocPart>>,
    pub entities: Mutex<Vec<Entity>>,
    /// Scripted status responses, consumed front to back; the last one
    /// repeats once the script is exhausted
    pub status_script: Mutex<Vec<ExtractionProcess>>,
    /// Error returned by the next `update_story_part` calls, if any
    pub update_failure: Mutex<Option<ApiError>>,
    /// Artificial delay applied to TOC fetches
    pub toc_delay: Mutex<Duration>,
    pub update_calls: AtomicUsize,
    pub trigger_calls: AtomicUsize,
}

impl InMemoryService {
    pub fn new() -> Self {
        Self {
            books: Mutex::new(Vec::new()),
            parts: Mutex::new(HashMap::new()),
            toc: Mutex::new(Vec::new()),
            entities: Mutex::new(Vec::new()),
            status_script: Mutex::new(Vec::new()),
            update_failure: Mutex::new(None),
            toc_delay: Mutex::new(Duration::ZERO),
            update_calls: AtomicUsize::new(0),
            trigger_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_fixture(fixture: &Fixture) -> Self {
        let service = Self::new();
        service
            .books
            .lock()
            .unwrap()
            .push(book(fixture.book_id, "Fixture Book"));
        *service.toc.lock().unwrap() = fixture.toc();
        let mut parts = service.parts.lock().unwrap();
        for toc in fixture.toc() {
            parts.insert(toc.id, book_part(&toc, &format!("Content of {}.", toc.label)));
        }
        drop(parts);
        service
    }

    pub fn script_status(&self, script: Vec<ExtractionProcess>) {
        *self.status_script.lock().unwrap() = script;
    }

    pub fn fail_next_update(&self, error: ApiError) {
        *self.update_failure.lock().unwrap() = Some(error);
    }
}

#[async_trait]
impl BookService for InMemoryService {
    async fn list_books(&self) -> Result<Vec<Book>, ApiError> {
        Ok(self.books.lock().unwrap().clone())
    }

    async fn delete_book(&self, book_id: &BookId) -> Result<Book, ApiError> {
        let mut books = self.books.lock().unwrap();
        let position = books
            .iter()
            .position(|b| b.id == *book_id)
            .ok_or_else(|| ApiError::NotFound(book_id.to_string()))?;
        Ok(books.remove(position))
    }

    async fn table_of_contents(&self, book_id: &BookId) -> Result<Vec<TocPart>, ApiError> {
        let delay = *self.toc_delay.lock().unwrap();
        if delay > Duration::ZERO {
            tokio::time::sleep(delay).await;
        }
        let toc = self.toc.lock().unwrap().clone();
        if toc.iter().all(|p| p.book_id != *book_id) {
            return Err(ApiError::NotFound(book_id.to_string()));
        }
        Ok(toc)
    }

    async fn book_parts(&self, book_id: &BookId) -> Result<Vec<BookPart>, ApiError> {
        Ok(self
            .parts
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.book_id == *book_id)
            .cloned()
            .collect())
    }

    async fn book_part(&self, part_id: &PartId) -> Result<BookPart, ApiError> {
        self.parts
            .lock()
            .unwrap()
            .get(part_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(part_id.to_string()))
    }

    async fn update_story_part(
        &self,
        part_id: &PartId,
        is_story_part: bool,
    ) -> Result<BookPart, ApiError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.update_failure.lock().unwrap().take() {
            return Err(error);
        }
        let mut parts = self.parts.lock().unwrap();
        let part = parts
            .get_mut(part_id)
            .ok_or_else(|| ApiError::NotFound(part_id.to_string()))?;
        part.is_story_part = is_story_part;
        Ok(part.clone())
    }

    async fn trigger_extraction(&self, _book_id: &BookId) -> Result<(), ApiError> {
        self.trigger_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn extraction_process(&self, book_id: &BookId) -> Result<ExtractionProcess, ApiError> {
        let mut script = self.status_script.lock().unwrap();
        match script.len() {
            0 => Ok(ExtractionProcess::unrequested(*book_id)),
            1 => Ok(script[0].clone()),
            _ => Ok(script.remove(0)),
        }
    }

    async fn book_entities(&self, _book_id: &BookId) -> Result<Vec<Entity>, ApiError> {
        Ok(self.entities.lock().unwrap().clone())
    }
}
