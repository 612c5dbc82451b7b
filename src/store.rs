//! In-memory stores and shared application state
//!
//! All data lives in process memory and is lost on restart; there is no
//! database layer. Each store sits behind its own `RwLock` so the
//! multi-threaded runtime serializes writers per store. There is no
//! cross-store transactionality: operations spanning more than one lock
//! acquisition (for example a delete racing an edit of the same code) are
//! last-write-wins. This is a known, accepted race for this application.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use chrono::Utc;
use rand::{distr::Alphanumeric, Rng};

use crate::auth;
use crate::model::{ShortUrlRecord, User, VisitEntry};

/// Length of generated short codes and user IDs
pub const SHORT_ID_LEN: usize = 6;

/// Length of generated visitor identifiers
pub const VISITOR_ID_LEN: usize = 15;

/// Generates a random string of the given length, uniform over `[A-Za-z0-9]`
///
/// Uniqueness is the caller's concern: each store retries generation until
/// the candidate is absent from its map. Collisions are negligible at these
/// lengths, so the loops have no retry bound.
pub fn random_id(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Store of short URL records, keyed by short code
#[derive(Default)]
pub struct UrlStore {
    urls: HashMap<String, ShortUrlRecord>,
}

impl UrlStore {
    /// Returns true if the short code is present
    pub fn exists(&self, code: &str) -> bool {
        self.urls.contains_key(code)
    }

    /// Inserts a new record with empty visit data and returns its short code
    ///
    /// The code is regenerated until unique within this store.
    pub fn create(&mut self, long_url: String, owner_user_id: String) -> String {
        let code = loop {
            let candidate = random_id(SHORT_ID_LEN);
            if !self.urls.contains_key(&candidate) {
                break candidate;
            }
        };

        self.urls.insert(
            code.clone(),
            ShortUrlRecord {
                long_url,
                owner_user_id,
                visitor_ids: HashSet::new(),
                visit_trace: Vec::new(),
            },
        );

        code
    }

    /// Looks up a record by short code
    pub fn get(&self, code: &str) -> Option<&ShortUrlRecord> {
        self.urls.get(code)
    }

    /// Replaces the long URL of an existing record
    ///
    /// The visit trace and visitor set are cleared: past analytics do not
    /// describe the new destination. Ownership is the caller's concern.
    pub fn update_url(&mut self, code: &str, new_url: String) {
        if let Some(record) = self.urls.get_mut(code) {
            record.long_url = new_url;
            record.visitor_ids.clear();
            record.visit_trace.clear();
        }
    }

    /// Removes a record. Ownership is the caller's concern.
    pub fn delete(&mut self, code: &str) {
        self.urls.remove(code);
    }

    /// Returns all records owned by the given user, keyed by short code
    ///
    /// Linear scan; iteration order is unspecified.
    pub fn list_by_owner(&self, user_id: &str) -> HashMap<String, ShortUrlRecord> {
        self.urls
            .iter()
            .filter(|(_, record)| record.owner_user_id == user_id)
            .map(|(code, record)| (code.clone(), record.clone()))
            .collect()
    }

    /// Records one access of a short URL by the given visitor
    ///
    /// Always appends a timestamped trace entry; the visitor set only grows
    /// when the visitor was not seen on this code before. No-op if the code
    /// is absent (it may have been deleted concurrently).
    pub fn record_visit(&mut self, code: &str, visitor_id: &str) {
        if let Some(record) = self.urls.get_mut(code) {
            record.visitor_ids.insert(visitor_id.to_string());
            record.visit_trace.push(VisitEntry {
                at: Utc::now(),
                visitor_id: visitor_id.to_string(),
            });
        }
    }

    /// Full store contents, for the `/urls.json` dump
    pub fn all(&self) -> &HashMap<String, ShortUrlRecord> {
        &self.urls
    }
}

/// Store of registered users, keyed by user ID
#[derive(Default)]
pub struct UserStore {
    users: HashMap<String, User>,
}

impl UserStore {
    /// Returns true if any user is registered under this email (linear scan)
    pub fn email_taken(&self, email: &str) -> bool {
        self.users.values().any(|user| user.email == email)
    }

    /// Registers a new user and returns their ID
    ///
    /// Hashes the password with a fresh salt and generates an ID unique
    /// within this store. Email uniqueness is the caller's concern: check
    /// `email_taken` under the same write guard so the check-and-insert
    /// is atomic.
    pub fn create(
        &mut self,
        email: String,
        password: &str,
    ) -> Result<String, argon2::password_hash::Error> {
        let password_hash = auth::hash_password(password)?;

        let id = loop {
            let candidate = random_id(SHORT_ID_LEN);
            if !self.users.contains_key(&candidate) {
                break candidate;
            }
        };

        self.users.insert(
            id.clone(),
            User {
                id: id.clone(),
                email,
                password_hash,
            },
        );

        Ok(id)
    }

    /// Resolves an email/password pair to a user ID (linear scan, hash verify)
    pub fn find_by_credentials(&self, email: &str, password: &str) -> Option<String> {
        self.users
            .values()
            .find(|user| user.email == email && auth::verify_password(password, &user.password_hash))
            .map(|user| user.id.clone())
    }

    /// Looks up a user by ID
    pub fn get(&self, user_id: &str) -> Option<&User> {
        self.users.get(user_id)
    }

    /// Full store contents, for the `/users.json` dump
    pub fn all(&self) -> &HashMap<String, User> {
        &self.users
    }
}

/// Set of every visitor identifier ever minted by this process
///
/// Exists only to guarantee freshly minted IDs are unique; per-URL visitor
/// sets live on the URL records themselves.
#[derive(Default)]
pub struct VisitorStore {
    seen: HashSet<String>,
}

impl VisitorStore {
    /// Mints a new visitor identifier, unique among all minted so far
    pub fn mint(&mut self) -> String {
        let id = loop {
            let candidate = random_id(VISITOR_ID_LEN);
            if !self.seen.contains(&candidate) {
                break candidate;
            }
        };
        self.seen.insert(id.clone());
        id
    }
}

/// Application state shared across all request handlers
///
/// Constructed once at startup and injected into the router; handlers never
/// reach for ambient globals, so tests get isolation from a fresh instance.
#[derive(Clone, Default)]
pub struct AppState {
    pub urls: Arc<RwLock<UrlStore>>,
    pub users: Arc<RwLock<UserStore>>,
    pub visitors: Arc<RwLock<VisitorStore>>,
}

impl AppState {
    /// Creates a state with empty stores
    pub fn new() -> Self {
        Self::default()
    }
}
