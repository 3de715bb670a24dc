//! Video model.
//!
//! Videos are owned by the (out-of-scope) video pipeline; this service
//! only reads them as join targets for watch history and channel pages.

use serde::{Deserialize, Serialize};

/// Video document referenced by watch history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    /// Document ID
    pub id: String,
    /// User ID of the uploading channel
    pub owner: String,
    pub title: String,
    pub description: String,
    /// Playback URL on the media host
    pub video_file_url: String,
    pub thumbnail_url: String,
    pub duration_secs: u64,
    pub views: u64,
    /// RFC3339 creation timestamp
    pub created_at: String,
}
