//! Route definitions for the TinyApp URL shortener
//!
//! This module wires every HTTP path to its handler, installs the session
//! layer, and injects the shared application state.

use axum::routing::{get, post};
use axum::Router;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::handler::{
    create_url, delete_url, list_urls, login, login_form, logout, new_url_form, redirect_to_long_url,
    register, register_form, root, show_url, update_url, urls_json, users_json,
};
use crate::store::AppState;

/// How long an idle session stays valid
const SESSION_EXPIRY: Duration = Duration::hours(8);

/// Creates and configures the Axum application router with all routes
///
/// Sessions ride on a cookie-carried ID backed by an in-memory store, so
/// they vanish on restart together with the rest of the data. The cookie
/// is not marked Secure: this service is a plain-HTTP tutorial deployment.
///
/// # Route Definitions
///
/// - `GET /` - Redirect by authentication state
/// - `GET /u/{code}` - Public redirect to the long URL (records the visit)
/// - `GET/POST /urls`, `GET /urls/new`, `GET/POST/PUT/DELETE /urls/{id}`,
///   `POST /urls/{id}/delete` - Owner-gated URL management
/// - `GET/POST /login`, `POST /logout`, `GET/POST /register` - Accounts
/// - `GET /urls.json`, `GET /users.json` - Store dumps
pub fn create_app(state: AppState) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_expiry(Expiry::OnInactivity(SESSION_EXPIRY));

    Router::new()
        .route("/", get(root))
        .route("/urls.json", get(urls_json))
        .route("/users.json", get(users_json))
        .route("/urls", get(list_urls).post(create_url))
        .route("/urls/new", get(new_url_form))
        .route(
            "/urls/{id}",
            get(show_url)
                .post(update_url)
                .put(update_url)
                .delete(delete_url),
        )
        .route("/urls/{id}/delete", post(delete_url))
        .route("/u/{code}", get(redirect_to_long_url))
        .route("/login", get(login_form).post(login))
        .route("/logout", post(logout))
        .route("/register", get(register_form).post(register))
        .layer(session_layer)
        .with_state(state)
}
