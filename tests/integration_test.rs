//! Integration tests for the URL management surface
//!
//! These tests verify the entire application stack including:
//! - HTTP routing and session handling
//! - Owner-gated create/list/show/update/delete
//! - Error handling (401/403/404 and validation re-renders)

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use tinyapp::route::create_app;
use tinyapp::store::AppState;

/// Helper function to create a test application with fresh in-memory stores
fn setup_test_app() -> axum::Router {
    create_app(AppState::new())
}

/// Helper function to parse response body as JSON
async fn response_json(body: Body) -> Value {
    let bytes = body
        .collect()
        .await
        .expect("Failed to read response body")
        .to_bytes();

    serde_json::from_slice(&bytes).expect("Failed to parse JSON")
}

/// Helper function to read a response body as text (HTML pages)
async fn response_text(body: Body) -> String {
    let bytes = body
        .collect()
        .await
        .expect("Failed to read response body")
        .to_bytes();

    String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8")
}

/// Extracts the session cookie from a response, if one was set
fn session_cookie(response: &axum::response::Response) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.split(';').next().unwrap_or("").to_string())
}

/// Builds a form-encoded request, optionally carrying a session cookie
fn form_request(method: &str, uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Builds a body-less request, optionally carrying a session cookie
fn plain_request(method: &str, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// Registers a user and returns their session cookie
async fn register_user(app: &axum::Router, email: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(form_request(
            "POST",
            "/register",
            &format!("email={email}&password={password}"),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    session_cookie(&response).expect("registration should set a session cookie")
}

/// Creates a short URL as the given session and returns its code
async fn create_short_url(app: &axum::Router, cookie: &str, long_url: &str) -> String {
    let response = app
        .clone()
        .oneshot(form_request(
            "POST",
            "/urls",
            &format!("long_url={long_url}"),
            Some(cookie),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap();
    location.trim_start_matches("/urls/").to_string()
}

#[tokio::test]
async fn test_create_url_requires_auth() {
    let app = setup_test_app();

    let response = app
        .oneshot(form_request(
            "POST",
            "/urls",
            "long_url=https://example.com",
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = response_json(response.into_body()).await;
    assert_eq!(body["code"], "unauthenticated");
}

#[tokio::test]
async fn test_create_and_list_urls() {
    let app = setup_test_app();
    let cookie = register_user(&app, "owner@example.com", "hunter2").await;

    let code = create_short_url(&app, &cookie, "https://example.com/page").await;
    assert_eq!(code.len(), 6);

    let response = app
        .oneshot(plain_request("GET", "/urls", Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response_text(response.into_body()).await;
    assert!(body.contains(&code));
    assert!(body.contains("https://example.com/page"));
    assert!(body.contains("owner@example.com"));
}

#[tokio::test]
async fn test_create_url_missing_long_url() {
    let app = setup_test_app();
    let cookie = register_user(&app, "owner@example.com", "hunter2").await;

    let response = app
        .oneshot(form_request("POST", "/urls", "long_url=", Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The creation form is re-rendered with the message
    let body = response_text(response.into_body()).await;
    assert!(body.contains("A long URL is required"));
}

#[tokio::test]
async fn test_show_url_detail() {
    let app = setup_test_app();
    let cookie = register_user(&app, "owner@example.com", "hunter2").await;
    let code = create_short_url(&app, &cookie, "https://example.com/detail").await;

    let response = app
        .oneshot(plain_request("GET", &format!("/urls/{code}"), Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response_text(response.into_body()).await;
    assert!(body.contains("https://example.com/detail"));
    assert!(body.contains(&format!("/u/{code}")));
}

#[tokio::test]
async fn test_show_url_unauthenticated() {
    let app = setup_test_app();
    let cookie = register_user(&app, "owner@example.com", "hunter2").await;
    let code = create_short_url(&app, &cookie, "https://example.com").await;

    let response = app
        .oneshot(plain_request("GET", &format!("/urls/{code}"), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_show_url_not_found() {
    let app = setup_test_app();
    let cookie = register_user(&app, "owner@example.com", "hunter2").await;

    let response = app
        .oneshot(plain_request("GET", "/urls/nosuch", Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = response_json(response.into_body()).await;
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn test_show_url_forbidden_for_non_owner() {
    let app = setup_test_app();
    let owner_cookie = register_user(&app, "owner@example.com", "hunter2").await;
    let code = create_short_url(&app, &owner_cookie, "https://example.com").await;

    let other_cookie = register_user(&app, "other@example.com", "hunter2").await;

    let response = app
        .oneshot(plain_request(
            "GET",
            &format!("/urls/{code}"),
            Some(&other_cookie),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = response_json(response.into_body()).await;
    assert_eq!(body["code"], "forbidden");
}

#[tokio::test]
async fn test_update_url_by_owner() {
    let app = setup_test_app();
    let cookie = register_user(&app, "owner@example.com", "hunter2").await;
    let code = create_short_url(&app, &cookie, "https://example.com/old").await;

    let response = app
        .clone()
        .oneshot(form_request(
            "POST",
            &format!("/urls/{code}"),
            "long_url=https://example.com/new",
            Some(&cookie),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    // The public redirect now points at the new destination
    let response = app
        .oneshot(plain_request("GET", &format!("/u/{code}"), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "https://example.com/new"
    );
}

#[tokio::test]
async fn test_update_url_via_put() {
    let app = setup_test_app();
    let cookie = register_user(&app, "owner@example.com", "hunter2").await;
    let code = create_short_url(&app, &cookie, "https://example.com/old").await;

    let response = app
        .oneshot(form_request(
            "PUT",
            &format!("/urls/{code}"),
            "long_url=https://example.com/put",
            Some(&cookie),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_update_url_forbidden_for_non_owner() {
    let app = setup_test_app();
    let owner_cookie = register_user(&app, "owner@example.com", "hunter2").await;
    let code = create_short_url(&app, &owner_cookie, "https://example.com").await;

    let other_cookie = register_user(&app, "other@example.com", "hunter2").await;

    let response = app
        .clone()
        .oneshot(form_request(
            "POST",
            &format!("/urls/{code}"),
            "long_url=https://evil.example.com",
            Some(&other_cookie),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The destination is untouched
    let response = app
        .oneshot(plain_request("GET", &format!("/u/{code}"), None))
        .await
        .unwrap();
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "https://example.com"
    );
}

#[tokio::test]
async fn test_update_url_missing_value_rerenders() {
    let app = setup_test_app();
    let cookie = register_user(&app, "owner@example.com", "hunter2").await;
    let code = create_short_url(&app, &cookie, "https://example.com").await;

    let response = app
        .oneshot(form_request(
            "POST",
            &format!("/urls/{code}"),
            "long_url=",
            Some(&cookie),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response_text(response.into_body()).await;
    assert!(body.contains("A long URL is required"));
}

#[tokio::test]
async fn test_delete_url_by_owner() {
    let app = setup_test_app();
    let cookie = register_user(&app, "owner@example.com", "hunter2").await;
    let code = create_short_url(&app, &cookie, "https://example.com").await;

    let response = app
        .clone()
        .oneshot(plain_request(
            "POST",
            &format!("/urls/{code}/delete"),
            Some(&cookie),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    // The short code is gone
    let response = app
        .oneshot(plain_request("GET", &format!("/u/{code}"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_url_via_delete_method() {
    let app = setup_test_app();
    let cookie = register_user(&app, "owner@example.com", "hunter2").await;
    let code = create_short_url(&app, &cookie, "https://example.com").await;

    let response = app
        .oneshot(plain_request(
            "DELETE",
            &format!("/urls/{code}"),
            Some(&cookie),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_delete_url_forbidden_for_non_owner() {
    let app = setup_test_app();
    let owner_cookie = register_user(&app, "owner@example.com", "hunter2").await;
    let code = create_short_url(&app, &owner_cookie, "https://example.com").await;

    let other_cookie = register_user(&app, "other@example.com", "hunter2").await;

    let response = app
        .oneshot(plain_request(
            "POST",
            &format!("/urls/{code}/delete"),
            Some(&other_cookie),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_delete_url_not_found() {
    let app = setup_test_app();
    let cookie = register_user(&app, "owner@example.com", "hunter2").await;

    let response = app
        .oneshot(plain_request("POST", "/urls/nosuch/delete", Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_urls_json_dump() {
    let app = setup_test_app();
    let cookie = register_user(&app, "owner@example.com", "hunter2").await;
    let code = create_short_url(&app, &cookie, "https://example.com/dump").await;

    let response = app
        .oneshot(plain_request("GET", "/urls.json", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response.into_body()).await;
    assert_eq!(body[code.as_str()]["long_url"], "https://example.com/dump");
    assert_eq!(body[code.as_str()]["visit_trace"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_users_json_hides_password_hash() {
    let app = setup_test_app();
    register_user(&app, "owner@example.com", "hunter2").await;

    let response = app
        .oneshot(plain_request("GET", "/users.json", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response.into_body()).await;
    let users = body.as_object().unwrap();
    assert_eq!(users.len(), 1);

    let user = users.values().next().unwrap();
    assert_eq!(user["email"], "owner@example.com");
    assert!(user.get("password_hash").is_none());
}

#[tokio::test]
async fn test_unauthenticated_list_redirects_to_login() {
    let app = setup_test_app();

    let response = app
        .oneshot(plain_request("GET", "/urls", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
}

#[tokio::test]
async fn test_unauthenticated_new_form_redirects_to_login() {
    let app = setup_test_app();

    let response = app
        .oneshot(plain_request("GET", "/urls/new", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
}

#[tokio::test]
async fn test_root_redirects_by_auth_state() {
    let app = setup_test_app();

    let response = app
        .clone()
        .oneshot(plain_request("GET", "/", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");

    let cookie = register_user(&app, "owner@example.com", "hunter2").await;
    let response = app
        .oneshot(plain_request("GET", "/", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/urls");
}

#[tokio::test]
async fn test_listing_only_shows_own_urls() {
    let app = setup_test_app();
    let owner_cookie = register_user(&app, "owner@example.com", "hunter2").await;
    let code = create_short_url(&app, &owner_cookie, "https://example.com/mine").await;

    let other_cookie = register_user(&app, "other@example.com", "hunter2").await;
    let other_code = create_short_url(&app, &other_cookie, "https://example.com/theirs").await;

    let response = app
        .oneshot(plain_request("GET", "/urls", Some(&owner_cookie)))
        .await
        .unwrap();

    let body = response_text(response.into_body()).await;
    assert!(body.contains(&code));
    assert!(!body.contains(&other_code));
}
