//! In-process router tests for the endpoints that need no upstream
//! weather service: health, map embeds, and the auth-gated store routes.

use std::path::PathBuf;
use std::sync::Once;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tower::util::ServiceExt;

use cinesky::routes::AppState;
use cinesky::{CineSkyConfig, cache, web};

static INIT: Once = Once::new();

fn ensure_cache() {
    INIT.call_once(|| {
        let dir: PathBuf =
            std::env::temp_dir().join(format!("cinesky-routes-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("Failed to create test cache dir");
        cache::init(&dir).expect("Failed to open test cache database");
    });
}

fn test_app() -> Router {
    ensure_cache();
    let state = AppState::new(CineSkyConfig::default()).expect("state should build");
    web::app(state)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let app = test_app();
    let response = app.oneshot(get("/api/v1/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], cinesky::VERSION);
}

#[tokio::test]
async fn map_embed_builds_layer_urls() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(get("/api/v1/map/embed?lat=52.5&lon=13.4"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let url = body["url"].as_str().unwrap();
    assert!(url.contains("openstreetmap.org"));
    assert!(url.contains("marker=52.5%2C13.4"));

    let response = app
        .oneshot(get("/api/v1/map/embed?lat=52.5&lon=13.4&layer=radar"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert!(body["url"].as_str().unwrap().contains("windy.com"));
}

#[tokio::test]
async fn protected_routes_require_a_session() {
    let app = test_app();

    for uri in ["/api/v1/list", "/api/v1/history", "/api/v1/prefs", "/api/v1/auth/session"] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri} should be gated");
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("sign in"));
    }

    // A made-up token is as good as none
    let response = app
        .oneshot(json_request("GET", "/api/v1/auth/session", Some("bogus-token"), serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_and_use_the_saved_list() {
    let app = test_app();

    // Register and take the session token
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/register",
            None,
            serde_json::json!({
                "email": "director@example.com",
                "password": "final-cut-pro-11",
                "name": "Director"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let session = body_json(response).await;
    let token = session["token"].as_str().unwrap().to_string();
    assert_eq!(session["display_name"], "Director");

    // Weak passwords are rejected with the banner text
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/register",
            None,
            serde_json::json!({ "email": "second@example.com", "password": "x", "name": "N" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Session observation works with the token
    let response = app
        .clone()
        .oneshot(json_request("GET", "/api/v1/auth/session", Some(&token), serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Create, list, update, delete saved entries
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/list",
            Some(&token),
            serde_json::json!({ "location": "Lisbon", "weather": "Clear", "date": "2026-08-12" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let entry = body_json(response).await;
    let id = entry["id"].as_u64().unwrap();

    // Duplicate location on the list is rejected
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/list",
            Some(&token),
            serde_json::json!({ "location": "Lisbon" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request("GET", "/api/v1/list", Some(&token), serde_json::json!({})))
        .await
        .unwrap();
    let list = body_json(response).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/list/{id}"),
            Some(&token),
            serde_json::json!({ "location": "Lisbon", "weather": "Overcast", "date": "2026-08-12" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["weather"], "Overcast");

    // Unknown ids are 404
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/v1/list/999",
            Some(&token),
            serde_json::json!({ "location": "Elsewhere" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            &format!("/api/v1/list/{id}"),
            Some(&token),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Preferences round-trip over HTTP
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/v1/prefs",
            Some(&token),
            serde_json::json!({ "display_name": "Director", "theme": "dark", "saved_cities": ["Lisbon"] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request("GET", "/api/v1/prefs", Some(&token), serde_json::json!({})))
        .await
        .unwrap();
    let prefs = body_json(response).await;
    assert_eq!(prefs["theme"], "dark");

    // Logout closes the session; the token stops working
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/v1/auth/logout", Some(&token), serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(json_request("GET", "/api/v1/auth/session", Some(&token), serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn contact_rejects_empty_messages() {
    let app = test_app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/contact",
            None,
            serde_json::json!({ "name": "N", "email": "n@example.com", "message": "  " }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
