//! HTTP client tests against a mock server

use fabula::{ApiError, BookId, BookService, HttpBookService, PartId, ProcessState};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "secret-token";

async fn service(server: &MockServer) -> HttpBookService {
    HttpBookService::new(server.uri(), TOKEN)
}

#[tokio::test]
async fn list_books_sends_bearer_credential() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/books/"))
        .and(header("Authorization", format!("Bearer {}", TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "0e8f7a6b-5c4d-3e2f-1a0b-9c8d7e6f5a4b",
            "title": "The Hobbit",
            "author": "J.R.R. Tolkien",
            "created_at": "2025-03-14T09:26:53Z",
            "file_type": "epub",
            "is_parsed": true
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let books = service(&server).await.list_books().await.unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].title, "The Hobbit");
    assert!(books[0].is_parsed);
}

#[tokio::test]
async fn toc_fetch_deserializes_flat_records() {
    let server = MockServer::start().await;
    let book_id: BookId = "0e8f7a6b-5c4d-3e2f-1a0b-9c8d7e6f5a4b".parse().unwrap();
    Mock::given(method("GET"))
        .and(path(format!("/book_parts/toc/{}", book_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "7b1c6f9e-8d5a-4f0e-9c3b-2a1d4e5f6a7b",
                "book_id": "0e8f7a6b-5c4d-3e2f-1a0b-9c8d7e6f5a4b",
                "parent_id": null,
                "label": "The Hobbit",
                "sibling_index": 0,
                "is_story_part": false,
                "created_at": "2025-03-14T09:26:53Z"
            },
            {
                "id": "1f2e3d4c-5b6a-7988-9aab-bccddeeff001",
                "book_id": "0e8f7a6b-5c4d-3e2f-1a0b-9c8d7e6f5a4b",
                "parent_id": "7b1c6f9e-8d5a-4f0e-9c3b-2a1d4e5f6a7b",
                "label": "An Unexpected Party",
                "sibling_index": 0,
                "is_story_part": true,
                "created_at": "2025-03-14T09:26:54Z"
            }
        ])))
        .mount(&server)
        .await;

    let toc = service(&server)
        .await
        .table_of_contents(&book_id)
        .await
        .unwrap();
    assert_eq!(toc.len(), 2);
    assert_eq!(toc[0].parent_id, None);
    assert_eq!(toc[1].parent_id, Some(toc[0].id));
    assert!(toc[1].is_story_part);
}

#[tokio::test]
async fn update_sends_explicit_target_value() {
    let server = MockServer::start().await;
    let part_id: PartId = "7b1c6f9e-8d5a-4f0e-9c3b-2a1d4e5f6a7b".parse().unwrap();
    Mock::given(method("PUT"))
        .and(path(format!("/book_parts/update/{}", part_id)))
        .and(body_json(json!({ "is_story_part": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "7b1c6f9e-8d5a-4f0e-9c3b-2a1d4e5f6a7b",
            "book_id": "0e8f7a6b-5c4d-3e2f-1a0b-9c8d7e6f5a4b",
            "parent_id": null,
            "label": "Riddles in the Dark",
            "sibling_index": 0,
            "is_story_part": true,
            "content": "In the deep places of the world...",
            "is_entity_extracted": false,
            "created_at": "2025-03-14T09:26:53Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let updated = service(&server)
        .await
        .update_story_part(&part_id, true)
        .await
        .unwrap();
    assert!(updated.is_story_part);
}

#[tokio::test]
async fn single_part_fetch_includes_content() {
    let server = MockServer::start().await;
    let part_id: PartId = "7b1c6f9e-8d5a-4f0e-9c3b-2a1d4e5f6a7b".parse().unwrap();
    Mock::given(method("GET"))
        .and(path(format!("/book_parts/book_part_id/{}", part_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "7b1c6f9e-8d5a-4f0e-9c3b-2a1d4e5f6a7b",
            "book_id": "0e8f7a6b-5c4d-3e2f-1a0b-9c8d7e6f5a4b",
            "parent_id": null,
            "label": "Roast Mutton",
            "sibling_index": 1,
            "is_story_part": true,
            "content": "Trolls around a fire.",
            "is_entity_extracted": true,
            "created_at": "2025-03-14T09:26:53Z"
        })))
        .mount(&server)
        .await;

    let part = service(&server).await.book_part(&part_id).await.unwrap();
    assert_eq!(part.content, "Trolls around a fire.");
    assert!(part.is_entity_extracted);
}

#[tokio::test]
async fn trigger_posts_and_accepts_empty_body() {
    let server = MockServer::start().await;
    let book_id = BookId::new();
    Mock::given(method("POST"))
        .and(path(format!("/processes/trigger_extraction/{}", book_id)))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    service(&server)
        .await
        .trigger_extraction(&book_id)
        .await
        .unwrap();
}

#[tokio::test]
async fn process_status_deserializes() {
    let server = MockServer::start().await;
    let book_id: BookId = "0e8f7a6b-5c4d-3e2f-1a0b-9c8d7e6f5a4b".parse().unwrap();
    Mock::given(method("GET"))
        .and(path(format!("/processes/entity_extraction/{}", book_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "book_id": "0e8f7a6b-5c4d-3e2f-1a0b-9c8d7e6f5a4b",
            "is_requested": true,
            "estimated_cost": 17.0,
            "requested_at": "2025-03-14T09:30:00Z",
            "completeness": 0.5
        })))
        .mount(&server)
        .await;

    let process = service(&server)
        .await
        .extraction_process(&book_id)
        .await
        .unwrap();
    assert_eq!(process.state(), ProcessState::InProgress);
    assert_eq!(process.completeness, Some(0.5));
}

#[tokio::test]
async fn auth_statuses_map_to_auth_errors() {
    for status in [401u16, 403] {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/books/"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;

        let err = service(&server).await.list_books().await.unwrap_err();
        assert!(
            matches!(err, ApiError::Auth { status: s } if s == status),
            "status {} mapped to {:?}",
            status,
            err
        );
    }
}

#[tokio::test]
async fn not_found_and_conflict_map_to_their_kinds() {
    let server = MockServer::start().await;
    let book_id = BookId::new();
    Mock::given(method("GET"))
        .and(path(format!("/book_parts/toc/{}", book_id)))
        .respond_with(ResponseTemplate::new(404).set_body_string("Book not found"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/processes/trigger_extraction/{}", book_id)))
        .respond_with(ResponseTemplate::new(409).set_body_string("duplicate"))
        .mount(&server)
        .await;

    let svc = service(&server).await;
    let not_found = svc.table_of_contents(&book_id).await.unwrap_err();
    assert!(matches!(not_found, ApiError::NotFound(m) if m.contains("not found")));

    let conflict = svc.trigger_extraction(&book_id).await.unwrap_err();
    assert!(matches!(conflict, ApiError::Conflict(_)));
}

#[tokio::test]
async fn server_errors_are_transient() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/books/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = service(&server).await.list_books().await.unwrap_err();
    assert!(err.is_transient());
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/books/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = service(&server).await.list_books().await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)), "got {:?}", err);
}
