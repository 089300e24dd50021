//! Integration tests for REST API endpoints
//!
//! These tests build the real router over a fresh `NoteStore` and exercise
//! the notes resource end-to-end.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use restbind_server::api::create_router;
use restbind_server::config::ServerConfig;
use restbind_server::notes::NoteStore;
use serde_json::{json, Value};
use tower::ServiceExt;

/// Helper to create the app router with its backing store
fn create_test_app() -> (NoteStore, Router) {
    let store = NoteStore::new();
    let app = create_router(&ServerConfig::default(), store.clone()).unwrap();
    (store, app)
}

/// Helper to issue a request and collect status, content type and body
async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    headers: &[(header::HeaderName, &str)],
    body: Body,
) -> (StatusCode, Option<String>, String) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(name, *value);
    }
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, content_type, String::from_utf8_lossy(&bytes).into_owned())
}

async fn create_note(app: &Router, body: Value) -> Value {
    let (status, _, body) = call(
        app,
        Method::POST,
        "/notes",
        &[(header::CONTENT_TYPE, "application/json")],
        Body::from(body.to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_str(&body).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (_, app) = create_test_app();

    let (status, _, body) = call(&app, Method::GET, "/health", &[], Body::empty()).await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_create_returns_mapping_form() {
    let (store, app) = create_test_app();

    let created = create_note(&app, json!({"title": "A", "tags": ["x"]})).await;

    assert!(created.get("note").is_none());
    assert_eq!(created["title"], "A");
    assert_eq!(created["tags"], json!(["x"]));
    let id = created["id"].as_str().unwrap();
    assert!(!id.is_empty());
    assert_eq!(store.find(id).await.unwrap().title, "A");
}

#[tokio::test]
async fn test_create_then_read() {
    let (_, app) = create_test_app();

    let created = create_note(&app, json!({"title": "A"})).await;
    let id = created["id"].as_str().unwrap();

    let (status, content_type, body) =
        call(&app, Method::GET, &format!("/notes/{id}"), &[], Body::empty()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["note"]["title"], "A");
    assert_eq!(json["note"]["id"], id);
}

#[tokio::test]
async fn test_read_as_xml() {
    let (_, app) = create_test_app();

    let created = create_note(&app, json!({"title": "A", "body": "text"})).await;
    let id = created["id"].as_str().unwrap();

    let (status, content_type, body) = call(
        &app,
        Method::GET,
        &format!("/notes/{id}"),
        &[(header::ACCEPT, "application/xml")],
        Body::empty(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/xml"));
    assert!(body.starts_with("<hash>"));
    assert!(body.contains("<title>A</title>"));
    assert!(body.contains("<body>text</body>"));
}

#[tokio::test]
async fn test_create_with_form_model_field() {
    let (store, app) = create_test_app();

    let (status, _, body) = call(
        &app,
        Method::POST,
        "/notes",
        &[(header::CONTENT_TYPE, "application/x-www-form-urlencoded")],
        Body::from("model=%7B%22title%22%3A%22Hi%22%7D&title=ignored"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["title"], "Hi");
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_create_with_plain_form() {
    let (_, app) = create_test_app();

    let (status, _, body) = call(
        &app,
        Method::POST,
        "/notes",
        &[(header::CONTENT_TYPE, "application/x-www-form-urlencoded")],
        Body::from("title=Plain&tags=a%2Cb"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["title"], "Plain");
    assert_eq!(json["tags"], json!(["a", "b"]));
}

#[tokio::test]
async fn test_update_ignores_id() {
    let (store, app) = create_test_app();

    let created = create_note(&app, json!({"id": "1", "title": "Original"})).await;
    assert_eq!(created["id"], "1");

    let (status, _, body) = call(
        &app,
        Method::PUT,
        "/notes/1",
        &[(header::CONTENT_TYPE, "application/json")],
        Body::from(r#"{"id":"999","title":"X"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["note"]["id"], "1");
    assert_eq!(json["note"]["title"], "X");
    assert_eq!(store.find("1").await.unwrap().title, "X");
    assert!(store.find("999").await.is_none());
}

#[tokio::test]
async fn test_update_with_unknown_attribute_fails() {
    let (_, app) = create_test_app();
    create_note(&app, json!({"id": "1", "title": "Original"})).await;

    let (status, _, body) = call(
        &app,
        Method::PUT,
        "/notes/1",
        &[(header::CONTENT_TYPE, "application/json")],
        Body::from(r#"{"color":"red"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"], "Unknown attribute: color");
    assert_eq!(json["status"], 500);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let (store, app) = create_test_app();

    let (status, _, body) = call(
        &app,
        Method::POST,
        "/notes",
        &[(header::CONTENT_TYPE, "application/json")],
        Body::from("{not json"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], 400);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_delete_returns_success() {
    let (store, app) = create_test_app();
    create_note(&app, json!({"id": "1", "title": "Doomed"})).await;

    let (status, content_type, body) =
        call(&app, Method::DELETE, "/notes/1", &[], Body::empty()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(body, r#"{"result":"success"}"#);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_missing_note_is_not_found_for_every_verb() {
    let (_, app) = create_test_app();

    for method in [Method::GET, Method::PUT, Method::DELETE] {
        let (status, _, body) = call(
            &app,
            method.clone(),
            "/notes/missing",
            &[(header::CONTENT_TYPE, "application/json")],
            Body::from("{}"),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method}");
        assert!(body.is_empty(), "{method}");
    }
}

#[tokio::test]
async fn test_unacceptable_format_is_not_found() {
    let (_, app) = create_test_app();
    create_note(&app, json!({"id": "1", "title": "A"})).await;

    let (status, _, body) = call(
        &app,
        Method::GET,
        "/notes/1",
        &[(header::ACCEPT, "text/html")],
        Body::empty(),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_custom_resource_path() {
    let config = ServerConfig {
        resource_path: "/api/notes".to_string(),
        ..ServerConfig::default()
    };
    let app = create_router(&config, NoteStore::new()).unwrap();

    let (status, _, _) = call(
        &app,
        Method::POST,
        "/api/notes",
        &[(header::CONTENT_TYPE, "application/json")],
        Body::from(r#"{"id":"7","title":"Nested"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, body) = call(&app, Method::GET, "/api/notes/7", &[], Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["note"]["title"], "Nested");
}
