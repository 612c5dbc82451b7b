//! HTTP request handlers for the TinyApp URL shortener
//!
//! This module implements all the core business logic for:
//! - Registering users and logging in/out against session state
//! - Creating, listing, editing, and deleting short URLs per owner
//! - Redirecting short URLs publicly while recording visit analytics
//!
//! Protected routes apply the same ordered policy: unauthenticated first,
//! then unknown code, then wrong owner. The two HTML page routes `/urls`
//! and `/urls/new` redirect unauthenticated browsers to the login form
//! instead of failing hard; everything else returns the status code.

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use tower_sessions::Session;

use crate::auth::{self, SESSION_USER_ID_KEY};
use crate::error::AppError;
use crate::model::{CredentialsForm, ShortUrlRecord, UrlForm, User};
use crate::store::AppState;
use crate::view;

/// Looks up the email shown in the page header for an authenticated user
fn user_email(state: &AppState, user_id: &str) -> String {
    state
        .users
        .read()
        .unwrap()
        .get(user_id)
        .map(|user| user.email.clone())
        .unwrap_or_default()
}

/// `GET /` - routes the browser by authentication state
pub async fn root(
    session: Session,
    State(state): State<AppState>,
) -> Result<Redirect, AppError> {
    match auth::session_user_id(&session, &state).await? {
        Some(_) => Ok(Redirect::to("/urls")),
        None => Ok(Redirect::to("/login")),
    }
}

/// `GET /urls.json` - dumps the URL store
pub async fn urls_json(
    State(state): State<AppState>,
) -> Json<HashMap<String, ShortUrlRecord>> {
    Json(state.urls.read().unwrap().all().clone())
}

/// `GET /users.json` - dumps the user store (password hashes are skipped
/// by the `User` serialization)
pub async fn users_json(State(state): State<AppState>) -> Json<HashMap<String, User>> {
    Json(state.users.read().unwrap().all().clone())
}

/// `GET /urls` - lists the session user's short URLs
///
/// Unauthenticated browsers are redirected to the login form rather than
/// rejected; this page is the post-login landing spot.
pub async fn list_urls(
    session: Session,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let Some(user_id) = auth::session_user_id(&session, &state).await? else {
        return Ok(Redirect::to("/login").into_response());
    };

    let email = user_email(&state, &user_id);
    let urls = state.urls.read().unwrap().list_by_owner(&user_id);

    Ok(Html(view::urls_index(&email, &urls)).into_response())
}

/// `GET /urls/new` - renders the creation form; redirects unauthenticated
/// browsers to the login form
pub async fn new_url_form(
    session: Session,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let Some(user_id) = auth::session_user_id(&session, &state).await? else {
        return Ok(Redirect::to("/login").into_response());
    };

    let email = user_email(&state, &user_id);
    Ok(Html(view::new_url(&email, None)).into_response())
}

/// `GET /urls/{id}` - shows one short URL's detail and edit form
///
/// Policy order: 401 without a session user, 404 for an unknown code,
/// 403 when the session user is not the owner.
pub async fn show_url(
    session: Session,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let user_id = auth::session_user_id(&session, &state)
        .await?
        .ok_or(AppError::Unauthenticated)?;

    let email = user_email(&state, &user_id);

    let urls = state.urls.read().unwrap();
    let record = urls.get(&id).ok_or(AppError::NotFound)?;
    if record.owner_user_id != user_id {
        return Err(AppError::Forbidden("You do not own this short URL"));
    }

    Ok(Html(view::url_show(&email, &id, record, None)).into_response())
}

/// `POST /urls` - creates a short URL owned by the session user
///
/// A missing long URL re-renders the creation form with a message
/// (400), matching the form-driven flow.
pub async fn create_url(
    session: Session,
    State(state): State<AppState>,
    Form(form): Form<UrlForm>,
) -> Result<Response, AppError> {
    let user_id = auth::session_user_id(&session, &state)
        .await?
        .ok_or(AppError::Unauthenticated)?;

    if form.long_url.trim().is_empty() {
        let email = user_email(&state, &user_id);
        return Ok((
            StatusCode::BAD_REQUEST,
            Html(view::new_url(&email, Some("A long URL is required"))),
        )
            .into_response());
    }

    let code = state.urls.write().unwrap().create(form.long_url, user_id);
    tracing::debug!(%code, "short URL created");

    Ok(Redirect::to(&format!("/urls/{code}")).into_response())
}

/// `POST /urls/{id}` and `PUT /urls/{id}` - replaces the long URL
///
/// Owner-gated per the standard policy order. A successful edit clears the
/// record's visit data (handled by the store).
pub async fn update_url(
    session: Session,
    Path(id): Path<String>,
    State(state): State<AppState>,
    Form(form): Form<UrlForm>,
) -> Result<Response, AppError> {
    let user_id = auth::session_user_id(&session, &state)
        .await?
        .ok_or(AppError::Unauthenticated)?;

    {
        let urls = state.urls.read().unwrap();
        let record = urls.get(&id).ok_or(AppError::NotFound)?;
        if record.owner_user_id != user_id {
            return Err(AppError::Forbidden("You do not own this short URL"));
        }
    }

    if form.long_url.trim().is_empty() {
        let email = user_email(&state, &user_id);
        let urls = state.urls.read().unwrap();
        let record = urls.get(&id).ok_or(AppError::NotFound)?;
        return Ok((
            StatusCode::BAD_REQUEST,
            Html(view::url_show(&email, &id, record, Some("A long URL is required"))),
        )
            .into_response());
    }

    state.urls.write().unwrap().update_url(&id, form.long_url);
    tracing::debug!(code = %id, "short URL updated");

    Ok(Redirect::to("/urls").into_response())
}

/// `POST /urls/{id}/delete` and `DELETE /urls/{id}` - deletes a short URL
pub async fn delete_url(
    session: Session,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let user_id = auth::session_user_id(&session, &state)
        .await?
        .ok_or(AppError::Unauthenticated)?;

    let mut urls = state.urls.write().unwrap();
    let record = urls.get(&id).ok_or(AppError::NotFound)?;
    if record.owner_user_id != user_id {
        return Err(AppError::Forbidden("You do not own this short URL"));
    }

    urls.delete(&id);
    tracing::debug!(code = %id, "short URL deleted");

    Ok(Redirect::to("/urls").into_response())
}

/// `GET /u/{code}` - public redirect to the long URL, recording the visit
///
/// An unknown code returns 404 before anything is mutated, including the
/// visitor identity: no visitor ID is minted for a dead link. Uses 307
/// Temporary Redirect so browsers keep coming back through the service
/// and analytics stay accurate.
pub async fn redirect_to_long_url(
    session: Session,
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Redirect, AppError> {
    if !state.urls.read().unwrap().exists(&code) {
        return Err(AppError::NotFound);
    }

    let visitor_id = auth::establish_visitor_id(&session, &state).await?;

    let long_url = {
        let mut urls = state.urls.write().unwrap();
        urls.record_visit(&code, &visitor_id);
        // The record may have been deleted between the existence check and
        // taking the write lock.
        urls.get(&code).map(|record| record.long_url.clone())
    };

    match long_url {
        Some(long_url) => Ok(Redirect::temporary(&long_url)),
        None => Err(AppError::NotFound),
    }
}

/// `GET /login` - renders the login form; already-authenticated browsers
/// go straight to their listing
pub async fn login_form(
    session: Session,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    if auth::session_user_id(&session, &state).await?.is_some() {
        return Ok(Redirect::to("/urls").into_response());
    }
    Ok(Html(view::login(None)).into_response())
}

/// `POST /login` - authenticates and stores the user ID in the session
pub async fn login(
    session: Session,
    State(state): State<AppState>,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AppError> {
    if form.email.is_empty() || form.password.is_empty() {
        return Err(AppError::Validation("Email and password are required"));
    }

    let user_id = state
        .users
        .read()
        .unwrap()
        .find_by_credentials(&form.email, &form.password);

    let Some(user_id) = user_id else {
        return Err(AppError::Forbidden("Email or password is incorrect"));
    };

    session.insert(SESSION_USER_ID_KEY, &user_id).await?;
    tracing::debug!(%user_id, "user logged in");

    Ok(Redirect::to("/urls").into_response())
}

/// `POST /logout` - removes the user from the session
///
/// The visitor identity survives logout on purpose: it tracks the browser,
/// not the account.
pub async fn logout(session: Session) -> Result<Redirect, AppError> {
    session.remove::<String>(SESSION_USER_ID_KEY).await?;
    Ok(Redirect::to("/login"))
}

/// `GET /register` - renders the registration form; already-authenticated
/// browsers go straight to their listing
pub async fn register_form(
    session: Session,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    if auth::session_user_id(&session, &state).await?.is_some() {
        return Ok(Redirect::to("/urls").into_response());
    }
    Ok(Html(view::register(None)).into_response())
}

/// `POST /register` - creates a user and logs them in
///
/// Missing fields and duplicate emails re-render the form with a message
/// (400). The email uniqueness check and the insert run under a single
/// write guard, so two concurrent registrations cannot both win.
pub async fn register(
    session: Session,
    State(state): State<AppState>,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AppError> {
    if form.email.is_empty() || form.password.is_empty() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Html(view::register(Some("Email and password are required"))),
        )
            .into_response());
    }

    let user_id = {
        let mut users = state.users.write().unwrap();
        if users.email_taken(&form.email) {
            return Ok((
                StatusCode::BAD_REQUEST,
                Html(view::register(Some("That email is already registered"))),
            )
                .into_response());
        }
        users.create(form.email, &form.password)?
    };

    tracing::info!(%user_id, "user registered");
    session.insert(SESSION_USER_ID_KEY, &user_id).await?;

    Ok(Redirect::to("/urls").into_response())
}
