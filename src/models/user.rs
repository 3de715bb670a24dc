//! User model for storage and API.

use serde::{Deserialize, Serialize};

/// User record stored in Firestore.
///
/// `username` and `email` are case-normalized to lowercase before they
/// reach the store, so uniqueness checks can compare verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Document ID (UUID v4)
    pub id: String,
    /// Unique handle, lowercase
    pub username: String,
    /// Unique email, lowercase
    pub email: String,
    /// Display name
    pub full_name: String,
    /// Argon2 digest; never returned to callers
    pub password_hash: String,
    /// Avatar URL on the media host (required, non-empty after registration)
    pub avatar_url: String,
    /// Cover image URL (optional, empty when unset)
    pub cover_image_url: String,
    /// Currently valid refresh token; `None` means the user must re-login.
    /// At most one refresh token is valid per user at any time.
    pub refresh_token: Option<String>,
    /// Ordered video IDs, most recently watched last
    pub watch_history: Vec<String>,
    /// RFC3339 creation timestamp
    pub created_at: String,
    /// RFC3339 last-update timestamp
    pub updated_at: String,
}

impl User {
    /// Touch the updated-at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

/// Sanitized user returned by the API: no password hash, no refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: String,
    pub cover_image_url: String,
    pub watch_history: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            avatar_url: user.avatar_url,
            cover_image_url: user.cover_image_url,
            watch_history: user.watch_history,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
