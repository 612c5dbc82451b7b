//! Password hashing and session identity helpers
//!
//! Two identities ride on the session, under separate keys:
//!
//! - [`SESSION_USER_ID_KEY`] — the authenticated user's ID, set on
//!   login/registration and removed on logout. Protected handlers resolve
//!   it through [`session_user_id`], which also drops IDs that no longer
//!   reference a stored user.
//! - [`SESSION_VISITOR_ID_KEY`] — an opaque per-browser identifier used by
//!   visit analytics, minted lazily on the first public redirect.
//!
//! Passwords are stored only as salted argon2 hashes in PHC string format.

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use tower_sessions::Session;

use crate::error::AppError;
use crate::store::AppState;

/// Session key holding the authenticated user's ID
pub const SESSION_USER_ID_KEY: &str = "user_id";

/// Session key holding the browser's visitor identifier
pub const SESSION_VISITOR_ID_KEY: &str = "visitor_id";

/// Hashes a password with a freshly generated salt
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Verifies a password against a stored PHC hash string
///
/// A malformed stored hash is treated as a non-match rather than an error.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Returns the session's user ID if it references an existing user
pub async fn session_user_id(
    session: &Session,
    state: &AppState,
) -> Result<Option<String>, AppError> {
    let Some(user_id) = session.get::<String>(SESSION_USER_ID_KEY).await? else {
        return Ok(None);
    };

    if state.users.read().unwrap().get(&user_id).is_some() {
        Ok(Some(user_id))
    } else {
        Ok(None)
    }
}

/// Returns the session's visitor ID, minting and persisting one if absent
pub async fn establish_visitor_id(
    session: &Session,
    state: &AppState,
) -> Result<String, AppError> {
    if let Some(visitor_id) = session.get::<String>(SESSION_VISITOR_ID_KEY).await? {
        return Ok(visitor_id);
    }

    let visitor_id = state.visitors.write().unwrap().mint();
    session.insert(SESSION_VISITOR_ID_KEY, &visitor_id).await?;

    Ok(visitor_id)
}
