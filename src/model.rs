//! Data models for the TinyApp URL shortener
//!
//! This module defines the records held by the in-memory stores and the
//! form payloads accepted by the HTTP handlers.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded access of a short URL
///
/// Appended to the owning record's trace on every public redirect,
/// regardless of whether the visitor was seen before.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct VisitEntry {
    /// When the visit occurred
    pub at: DateTime<Utc>,

    /// Opaque identifier of the visiting browser (session-persisted)
    pub visitor_id: String,
}

/// A shortened URL stored in the URL store
///
/// Keyed by its 6-character short code. Visit data is append-only while the
/// record lives, but is cleared whenever the owner edits the long URL, since
/// past analytics no longer describe the new destination.
#[derive(Serialize, Debug, Clone)]
pub struct ShortUrlRecord {
    /// The original long URL this code redirects to
    pub long_url: String,

    /// ID of the user who created this short URL
    ///
    /// Only the owner may view, edit, or delete the record. The referenced
    /// user is guaranteed to exist at creation time only; user deletion is
    /// not implemented, so ownership never dangles in practice.
    pub owner_user_id: String,

    /// Distinct visitor identifiers that have followed this short URL
    pub visitor_ids: HashSet<String>,

    /// Chronological trace of every access
    pub visit_trace: Vec<VisitEntry>,
}

impl ShortUrlRecord {
    /// Total number of times the short URL has been followed
    pub fn total_visits(&self) -> usize {
        self.visit_trace.len()
    }

    /// Number of distinct browsers that have followed the short URL
    pub fn unique_visitors(&self) -> usize {
        self.visitor_ids.len()
    }
}

/// A registered user
///
/// Email is unique across all users at creation time and immutable after.
/// The password is stored only as a salted argon2 hash; the hash field is
/// skipped during serialization so the `/users.json` dump never exposes it.
#[derive(Serialize, Debug, Clone)]
pub struct User {
    /// Unique 6-character user ID
    pub id: String,

    /// Login email, unique across the user store
    pub email: String,

    /// Salted argon2 hash of the password (never the plaintext)
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// Form payload for creating or updating a short URL
///
/// Submitted by the `/urls/new` and `/urls/{id}` edit forms. An absent
/// field deserializes to an empty string and is rejected by the handler
/// with a validation error.
#[derive(Deserialize)]
pub struct UrlForm {
    /// The long URL to shorten, or the replacement destination on edit
    #[serde(default)]
    pub long_url: String,
}

/// Form payload shared by the `/login` and `/register` endpoints
#[derive(Deserialize)]
pub struct CredentialsForm {
    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub password: String,
}
