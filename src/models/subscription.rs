//! Subscription join record: `(subscriber, channel)` pairs.

use serde::{Deserialize, Serialize};

/// A user subscribed to a channel (a channel is just another user).
///
/// The document ID is derived from the pair, so a given pair exists at
/// most once and duplicate subscribes cannot inflate counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    /// User ID of the subscriber
    pub subscriber: String,
    /// User ID of the channel being subscribed to
    pub channel: String,
    /// RFC3339 creation timestamp
    pub created_at: String,
}

impl Subscription {
    pub fn new(subscriber: &str, channel: &str) -> Self {
        Self {
            subscriber: subscriber.to_string(),
            channel: channel.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Document ID for the pair.
    pub fn doc_id(subscriber: &str, channel: &str) -> String {
        format!("{}_{}", subscriber, channel)
    }
}
