//! API integration tests
//!
//! Need a running server with a database and a bootstrap administrator
//! (`admin` / `BIBLIOTHECA_ADMIN_PASSWORD`, default `bootstrap-pass`).

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

fn admin_password() -> String {
    std::env::var("BIBLIOTHECA_ADMIN_PASSWORD").unwrap_or_else(|_| "bootstrap-pass".to_string())
}

async fn login(client: &Client, username: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/account/login", BASE_URL))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Register a fresh patron and return (id, token)
async fn new_patron(client: &Client) -> (i64, String) {
    let username = format!("patron{}", chrono::Utc::now().timestamp_micros());
    let response = client
        .post(format!("{}/account/register", BASE_URL))
        .json(&json!({
            "username": username,
            "email": format!("{}@library.org", username),
            "password": "patron-pass"
        }))
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();

    let token = login(client, &username, "patron-pass").await;
    (body["id"].as_i64().unwrap(), token)
}

async fn create_book(client: &Client, token: &str, title: &str) -> i64 {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(token)
        .json(&json!({ "title": title }))
        .send()
        .await
        .expect("Failed to create book");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    body["id"].as_i64().unwrap()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_and_ready() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");

    let response = client.get(format!("{}/ready", BASE_URL)).send().await.unwrap();
    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_login_rejects_wrong_password() {
    let client = Client::new();

    let response = client
        .post(format!("{}/account/login", BASE_URL))
        .json(&json!({ "username": "admin", "password": "definitely-wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_lending_lifecycle() {
    let client = Client::new();
    let admin = login(&client, "admin", &admin_password()).await;
    let (patron_id, patron) = new_patron(&client).await;
    let book_id = create_book(&client, &admin, "Lifecycle test book").await;

    // Reserve
    let response = client
        .post(format!("{}/transactions/reserve", BASE_URL))
        .bearer_auth(&patron)
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let reservation: Value = response.json().await.unwrap();
    assert_eq!(reservation["transaction_type"], "Reserved");
    assert_eq!(reservation["patron_id"].as_i64(), Some(patron_id));
    let transaction_id = reservation["id"].as_i64().unwrap();

    // A second reservation of the same book fails
    let response = client
        .post(format!("{}/transactions/reserve", BASE_URL))
        .bearer_auth(&patron)
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Returning before check-out fails
    let response = client
        .post(format!("{}/transactions/{}/return", BASE_URL, transaction_id))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Check out, then return
    let response = client
        .post(format!("{}/transactions/{}/checkout", BASE_URL, transaction_id))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let borrowed: Value = response.json().await.unwrap();
    assert_eq!(borrowed["transaction_type"], "Borrowed");

    let response = client
        .post(format!("{}/transactions/{}/return", BASE_URL, transaction_id))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let returned: Value = response.json().await.unwrap();
    assert_eq!(returned["is_returned"], true);

    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .unwrap();
    let book: Value = response.json().await.unwrap();
    assert_eq!(book["availability_status"], "Available");

    // The patron was notified of the reservation
    let response = client
        .get(format!("{}/notifications/unread-count", BASE_URL))
        .bearer_auth(&patron)
        .send()
        .await
        .unwrap();
    let count: Value = response.json().await.unwrap();
    assert!(count["unread"].as_i64().unwrap() >= 1);
}

#[tokio::test]
#[ignore]
async fn test_review_once_per_book() {
    let client = Client::new();
    let admin = login(&client, "admin", &admin_password()).await;
    let (_, patron) = new_patron(&client).await;
    let book_id = create_book(&client, &admin, "Review test book").await;

    let review = json!({ "rating": 4, "comment": "Solid" });
    let response = client
        .post(format!("{}/books/{}/reviews", BASE_URL, book_id))
        .bearer_auth(&patron)
        .json(&review)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = client
        .post(format!("{}/books/{}/reviews", BASE_URL, book_id))
        .bearer_auth(&patron)
        .json(&review)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .unwrap();
    let details: Value = response.json().await.unwrap();
    assert_eq!(details["average_rating"], 4.0);
}
