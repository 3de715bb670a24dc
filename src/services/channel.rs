// SPDX-License-Identifier: MIT

//! Channel profiles, subscription toggling and watch-history resolution.
//!
//! Aggregations are expressed as explicit store queries: two counts plus a
//! membership check for the profile, and an ordered batch resolve for the
//! watch history.

use serde::Serialize;
use std::sync::Arc;

use crate::db::Store;
use crate::error::AppError;
use crate::models::Video;

/// Channel page payload: profile fields plus subscription aggregates.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    pub id: String,
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub avatar_url: String,
    pub cover_image_url: String,
    pub subscribers_count: u64,
    pub subscribed_to_count: u64,
    /// Whether the viewing user subscribes to this channel; false for
    /// anonymous viewers.
    pub is_subscribed: bool,
}

/// Minimal owner projection embedded in watch-history entries.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerProjection {
    pub full_name: String,
    pub username: String,
    pub avatar_url: String,
}

/// A watch-history entry: the video plus its owner projection.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchHistoryEntry {
    pub id: String,
    pub title: String,
    pub description: String,
    pub video_file_url: String,
    pub thumbnail_url: String,
    pub duration_secs: u64,
    pub views: u64,
    pub created_at: String,
    pub owner: OwnerProjection,
}

/// Read-side aggregation over users, subscriptions and videos.
#[derive(Clone)]
pub struct ChannelService {
    store: Arc<dyn Store>,
}

impl ChannelService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Build the channel page for `username` as seen by `viewer`.
    pub async fn channel_profile(
        &self,
        username: &str,
        viewer: Option<&str>,
    ) -> Result<ChannelProfile, AppError> {
        let username = username.trim().to_lowercase();
        if username.is_empty() {
            return Err(AppError::Validation("username is required".to_string()));
        }

        let user = self
            .store
            .find_user_by_username(&username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Channel '{}' not found", username)))?;

        let subscribers_count = self.store.count_subscribers(&user.id).await?;
        let subscribed_to_count = self.store.count_subscriptions(&user.id).await?;
        let is_subscribed = match viewer {
            Some(viewer_id) => self.store.is_subscribed(viewer_id, &user.id).await?,
            None => false,
        };

        Ok(ChannelProfile {
            id: user.id,
            full_name: user.full_name,
            username: user.username,
            email: user.email,
            avatar_url: user.avatar_url,
            cover_image_url: user.cover_image_url,
            subscribers_count,
            subscribed_to_count,
            is_subscribed,
        })
    }

    /// Toggle a subscription. Returns `true` when the viewer is subscribed
    /// after the call.
    pub async fn toggle_subscription(
        &self,
        subscriber: &str,
        channel_id: &str,
    ) -> Result<bool, AppError> {
        if subscriber == channel_id {
            return Err(AppError::Validation(
                "Cannot subscribe to your own channel".to_string(),
            ));
        }

        if self.store.get_user(channel_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Channel {} not found",
                channel_id
            )));
        }

        if self.store.is_subscribed(subscriber, channel_id).await? {
            self.store.delete_subscription(subscriber, channel_id).await?;
            tracing::debug!(subscriber, channel = channel_id, "Unsubscribed");
            Ok(false)
        } else {
            self.store.create_subscription(subscriber, channel_id).await?;
            tracing::debug!(subscriber, channel = channel_id, "Subscribed");
            Ok(true)
        }
    }

    /// Record that the user watched a video.
    pub async fn record_watch(&self, user_id: &str, video_id: &str) -> Result<(), AppError> {
        if self.store.get_video(video_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Video {} not found",
                video_id
            )));
        }
        self.store.append_watch_history(user_id, video_id).await
    }

    /// Resolve the user's watch history in stored order.
    ///
    /// Videos that have been deleted since they were watched are omitted,
    /// as are videos whose owning channel no longer exists.
    pub async fn watch_history(
        &self,
        user_id: &str,
    ) -> Result<Vec<WatchHistoryEntry>, AppError> {
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        let mut entries = Vec::with_capacity(user.watch_history.len());
        for video_id in &user.watch_history {
            let Some(video) = self.store.get_video(video_id).await? else {
                continue;
            };
            let Some(owner) = self.store.get_user(&video.owner).await? else {
                continue;
            };
            entries.push(Self::entry(video, owner.full_name, owner.username, owner.avatar_url));
        }

        Ok(entries)
    }

    fn entry(
        video: Video,
        full_name: String,
        username: String,
        avatar_url: String,
    ) -> WatchHistoryEntry {
        WatchHistoryEntry {
            id: video.id,
            title: video.title,
            description: video.description,
            video_file_url: video.video_file_url,
            thumbnail_url: video.thumbnail_url,
            duration_secs: video.duration_secs,
            views: video.views,
            created_at: video.created_at,
            owner: OwnerProjection {
                full_name,
                username,
                avatar_url,
            },
        }
    }
}
