//! Database layer: the `Store` contract plus Firestore and in-memory backends.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{User, Video};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const SUBSCRIPTIONS: &str = "subscriptions";
    pub const VIDEOS: &str = "videos";
}

/// Persistence contract for the session core and aggregation queries.
///
/// `username`/`email` arguments are expected pre-normalized (trimmed,
/// lowercase); the store compares them verbatim.
#[async_trait]
pub trait Store: Send + Sync {
    // ─── Users ───────────────────────────────────────────────────

    /// Look up a user by username OR email.
    async fn find_user_by_identifier(&self, identifier: &str)
        -> Result<Option<User>, AppError>;

    /// Look up a user by username.
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    /// Look up a user by ID. Used to re-validate a decoded token's subject.
    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError>;

    /// Persist a new user. Fails with `Conflict` if the username or email
    /// is already taken.
    async fn create_user(&self, user: &User) -> Result<(), AppError>;

    /// Set or clear the stored refresh token. Clearing is how logout
    /// invalidates a session; the call is a no-op for a vanished user.
    async fn update_refresh_token(
        &self,
        id: &str,
        token: Option<&str>,
    ) -> Result<(), AppError>;

    /// Replace the password hash. The plaintext never reaches the store.
    async fn set_password_hash(&self, id: &str, hash: &str) -> Result<(), AppError>;

    /// Partial account update. Fails with `NotFound` if the user vanished,
    /// `Conflict` if the new email belongs to another user.
    async fn update_account(
        &self,
        id: &str,
        full_name: Option<&str>,
        email: Option<&str>,
    ) -> Result<User, AppError>;

    /// Replace the avatar URL.
    async fn set_avatar(&self, id: &str, url: &str) -> Result<User, AppError>;

    /// Replace the cover image URL.
    async fn set_cover_image(&self, id: &str, url: &str) -> Result<User, AppError>;

    // ─── Subscriptions ───────────────────────────────────────────

    /// Create a `(subscriber, channel)` row. Returns `false` if the pair
    /// already existed (duplicate subscribes never inflate counts).
    async fn create_subscription(
        &self,
        subscriber: &str,
        channel: &str,
    ) -> Result<bool, AppError>;

    /// Delete a `(subscriber, channel)` row. Returns `false` if it was
    /// not present.
    async fn delete_subscription(
        &self,
        subscriber: &str,
        channel: &str,
    ) -> Result<bool, AppError>;

    /// Number of subscribers of `channel`.
    async fn count_subscribers(&self, channel: &str) -> Result<u64, AppError>;

    /// Number of channels `subscriber` is subscribed to.
    async fn count_subscriptions(&self, subscriber: &str) -> Result<u64, AppError>;

    /// Whether a `(subscriber, channel)` row exists.
    async fn is_subscribed(&self, subscriber: &str, channel: &str) -> Result<bool, AppError>;

    /// Append a video to the user's watch history (most recent last).
    /// Re-watching moves the video to the end instead of duplicating it.
    async fn append_watch_history(
        &self,
        user_id: &str,
        video_id: &str,
    ) -> Result<(), AppError>;

    // ─── Videos ──────────────────────────────────────────────────

    /// Fetch a video document; `None` if it has been deleted.
    async fn get_video(&self, id: &str) -> Result<Option<Video>, AppError>;

    /// Upsert a video document (used by the video pipeline and tests).
    async fn put_video(&self, video: &Video) -> Result<(), AppError>;
}
