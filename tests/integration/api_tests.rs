//! API integration tests
//!
//! Expect a running server started with `[auth.bootstrap_admin]` set to `admin` / `admin`.

use reqwest::Client;
use serde_json::{json, Value};
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Helper to get an authenticated client
async fn get_auth_token(client: &Client) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Random suffix so reruns do not collide on unique names
fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, &Uuid::new_v4().simple().to_string()[..8])
}

async fn post_json(client: &Client, token: &str, path: &str, body: Value) -> (u16, Value) {
    let response = client
        .post(format!("{}{}", BASE_URL, path))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .expect("Failed to send request");
    let status = response.status().as_u16();
    let body = response.json().await.unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_readiness() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_write_without_token_rejected() {
    let client = Client::new();

    let response = client
        .post(format!("{}/genres", BASE_URL))
        .json(&json!({ "name": unique("genre") }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_list_genres_is_public() {
    let client = Client::new();

    let response = client
        .get(format!("{}/genres", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["genres"].is_array());
    assert!(body["total"].is_number());
}

#[tokio::test]
#[ignore]
async fn test_get_missing_book() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books/999999999", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_genre_name() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let name = unique("genre");

    let (status, _) = post_json(&client, &token, "/genres", json!({ "name": name })).await;
    assert_eq!(status, 201);

    let (status, body) = post_json(&client, &token, "/genres", json!({ "name": name })).await;
    assert_eq!(status, 400);
    assert_eq!(body["fields"]["name"][0], "genre with this name already exists.");
}

#[tokio::test]
#[ignore]
async fn test_duplicate_author() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let last_name = unique("Doe");
    let author = json!({
        "first_name": "John",
        "last_name": last_name,
        "date_of_birth": "1970-01-01",
        "date_of_death": "2020-01-01"
    });

    let (status, created) = post_json(&client, &token, "/authors", author.clone()).await;
    assert_eq!(status, 201);
    assert_eq!(created["date_of_birth"], "1970-01-01");

    let (status, body) = post_json(&client, &token, "/authors", author).await;
    assert_eq!(status, 400);
    assert_eq!(
        body["fields"]["non_field_errors"][0],
        "The fields first_name, last_name must make a unique set."
    );
}

#[tokio::test]
#[ignore]
async fn test_book_copy_accounting() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let (status, body) = post_json(
        &client,
        &token,
        "/books",
        json!({
            "title": unique("book"),
            "copies": 3,
            "loaned_copies": 1,
            "available_copies": 1
        }),
    )
    .await;

    assert_eq!(status, 400);
    for field in ["copies", "loaned_copies", "available_copies"] {
        assert!(body["fields"][field].is_array(), "missing {}", field);
    }
}

#[tokio::test]
#[ignore]
async fn test_book_published_in_future() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let (status, body) = post_json(
        &client,
        &token,
        "/books",
        json!({
            "title": unique("book"),
            "published": "2999-01-01",
            "copies": 1,
            "loaned_copies": 0,
            "available_copies": 1
        }),
    )
    .await;

    assert_eq!(status, 400);
    assert!(body["fields"]["published"].is_array());
}

#[tokio::test]
#[ignore]
async fn test_book_published_before_added() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let (status, body) = post_json(
        &client,
        &token,
        "/books",
        json!({
            "title": unique("book"),
            "date_added": "2020-01-01",
            "published": "2021-01-01",
            "copies": 1,
            "loaned_copies": 0,
            "available_copies": 1
        }),
    )
    .await;

    assert_eq!(status, 400);
    assert!(body["fields"]["date_added"].is_array());
    assert!(body["fields"]["published"].is_array());
}

#[tokio::test]
#[ignore]
async fn test_book_with_unknown_author() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let (status, body) = post_json(
        &client,
        &token,
        "/books",
        json!({
            "title": unique("book"),
            "author": 999999999,
            "copies": 1,
            "loaned_copies": 0,
            "available_copies": 1
        }),
    )
    .await;

    assert_eq!(status, 400);
    assert_eq!(
        body["fields"]["author"][0],
        "Invalid pk \"999999999\" - object does not exist."
    );
}

#[tokio::test]
#[ignore]
async fn test_delete_book_keeps_copies() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let (status, book) = post_json(
        &client,
        &token,
        "/books",
        json!({
            "title": unique("book"),
            "copies": 1,
            "loaned_copies": 0,
            "available_copies": 1
        }),
    )
    .await;
    assert_eq!(status, 201);

    let (status, copy) = post_json(
        &client,
        &token,
        "/book-instances",
        json!({ "book": book["id"], "imprint": "First edition", "status": "a" }),
    )
    .await;
    assert_eq!(status, 201);

    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book["id"]))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);

    let response = client
        .get(format!("{}/book-instances/{}", BASE_URL, copy["id"]))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["book"].is_null());
}

#[tokio::test]
#[ignore]
async fn test_submit_job_requires_valid_total() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let (status, _) = post_json(
        &client,
        &token,
        "/jobs",
        json!({ "job": "create_random_genres", "total": 0 }),
    )
    .await;
    assert_eq!(status, 400);

    let (status, report) = post_json(
        &client,
        &token,
        "/jobs",
        json!({ "job": "create_random_genres", "total": 2 }),
    )
    .await;
    assert_eq!(status, 202);
    assert!(report["id"].is_string());
}
