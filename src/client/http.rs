//! HTTP implementation of the book service

use super::error::{ApiError, ApiResult};
use super::traits::BookService;
use crate::model::{Book, BookId, BookPart, Entity, ExtractionProcess, PartId, TocPart};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Default per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Book service over HTTP with bearer-credential auth
pub struct HttpBookService {
    base_url: String,
    token: String,
    client: Client,
}

impl HttpBookService {
    /// Create a client against a service base URL
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map a non-success response onto the error taxonomy
    async fn reject(resp: Response) -> ApiError {
        let status = resp.status();
        let message = resp.text().await.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Auth {
                status: status.as_u16(),
            },
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            StatusCode::CONFLICT => ApiError::Conflict(message),
            s if s.is_server_error() => ApiError::Transient(format!("HTTP {}: {}", s, message)),
            s => ApiError::Unexpected {
                status: s.as_u16(),
                message,
            },
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = self.url(path);
        debug!(%url, "GET");
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Self::reject(resp).await);
        }
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl BookService for HttpBookService {
    async fn list_books(&self) -> ApiResult<Vec<Book>> {
        self.get_json("/books/").await
    }

    async fn delete_book(&self, book_id: &BookId) -> ApiResult<Book> {
        let url = self.url(&format!("/books/delete/{}", book_id));
        debug!(%url, "DELETE");
        let resp = self
            .client
            .delete(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Self::reject(resp).await);
        }
        Ok(resp.json().await?)
    }

    async fn table_of_contents(&self, book_id: &BookId) -> ApiResult<Vec<TocPart>> {
        self.get_json(&format!("/book_parts/toc/{}", book_id)).await
    }

    async fn book_parts(&self, book_id: &BookId) -> ApiResult<Vec<BookPart>> {
        self.get_json(&format!("/book_parts/book_id/{}", book_id))
            .await
    }

    async fn book_part(&self, part_id: &PartId) -> ApiResult<BookPart> {
        self.get_json(&format!("/book_parts/book_part_id/{}", part_id))
            .await
    }

    async fn update_story_part(
        &self,
        part_id: &PartId,
        is_story_part: bool,
    ) -> ApiResult<BookPart> {
        let url = self.url(&format!("/book_parts/update/{}", part_id));
        debug!(%url, is_story_part, "PUT");
        let resp = self
            .client
            .put(&url)
            .bearer_auth(&self.token)
            .json(&json!({ "is_story_part": is_story_part }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Self::reject(resp).await);
        }
        Ok(resp.json().await?)
    }

    async fn trigger_extraction(&self, book_id: &BookId) -> ApiResult<()> {
        let url = self.url(&format!("/processes/trigger_extraction/{}", book_id));
        debug!(%url, "POST");
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&json!({}))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Self::reject(resp).await);
        }
        Ok(())
    }

    async fn extraction_process(&self, book_id: &BookId) -> ApiResult<ExtractionProcess> {
        self.get_json(&format!("/processes/entity_extraction/{}", book_id))
            .await
    }

    async fn book_entities(&self, book_id: &BookId) -> ApiResult<Vec<Entity>> {
        self.get_json(&format!("/entities/book_id/{}", book_id))
            .await
    }
}
