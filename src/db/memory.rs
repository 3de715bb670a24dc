// SPDX-License-Identifier: MIT

//! In-memory implementation of the [`Store`] contract.
//!
//! Backs tests and offline development. Same semantics as the Firestore
//! backend, with `DashMap`s keyed the same way the Firestore documents are.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::db::Store;
use crate::error::AppError;
use crate::models::{Subscription, User, Video};

/// In-memory store built on concurrent maps.
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<String, User>,
    subscriptions: DashMap<String, Subscription>,
    videos: DashMap<String, Video>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn modify_user<F>(&self, id: &str, mutate: F) -> Result<User, AppError>
    where
        F: FnOnce(&mut User),
    {
        let mut entry = self
            .users
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;
        mutate(entry.value_mut());
        entry.value_mut().touch();
        Ok(entry.value().clone())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .iter()
            .find(|u| u.username == identifier || u.email == identifier)
            .map(|u| u.value().clone()))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .iter()
            .find(|u| u.username == username)
            .map(|u| u.value().clone()))
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(id).map(|u| u.value().clone()))
    }

    async fn create_user(&self, user: &User) -> Result<(), AppError> {
        if self.users.iter().any(|u| u.username == user.username) {
            return Err(AppError::Conflict(format!(
                "Username '{}' is already taken",
                user.username
            )));
        }
        if self.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict(format!(
                "Email '{}' is already registered",
                user.email
            )));
        }
        self.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn update_refresh_token(
        &self,
        id: &str,
        token: Option<&str>,
    ) -> Result<(), AppError> {
        if let Some(mut entry) = self.users.get_mut(id) {
            entry.refresh_token = token.map(str::to_string);
            entry.touch();
        }
        Ok(())
    }

    async fn set_password_hash(&self, id: &str, hash: &str) -> Result<(), AppError> {
        self.modify_user(id, |user| user.password_hash = hash.to_string())?;
        Ok(())
    }

    async fn update_account(
        &self,
        id: &str,
        full_name: Option<&str>,
        email: Option<&str>,
    ) -> Result<User, AppError> {
        if let Some(email) = email {
            if self.users.iter().any(|u| u.email == email && u.id != id) {
                return Err(AppError::Conflict(format!(
                    "Email '{}' is already registered",
                    email
                )));
            }
        }

        self.modify_user(id, |user| {
            if let Some(full_name) = full_name {
                user.full_name = full_name.to_string();
            }
            if let Some(email) = email {
                user.email = email.to_string();
            }
        })
    }

    async fn set_avatar(&self, id: &str, url: &str) -> Result<User, AppError> {
        self.modify_user(id, |user| user.avatar_url = url.to_string())
    }

    async fn set_cover_image(&self, id: &str, url: &str) -> Result<User, AppError> {
        self.modify_user(id, |user| user.cover_image_url = url.to_string())
    }

    async fn create_subscription(
        &self,
        subscriber: &str,
        channel: &str,
    ) -> Result<bool, AppError> {
        let doc_id = Subscription::doc_id(subscriber, channel);
        if self.subscriptions.contains_key(&doc_id) {
            return Ok(false);
        }
        self.subscriptions
            .insert(doc_id, Subscription::new(subscriber, channel));
        Ok(true)
    }

    async fn delete_subscription(
        &self,
        subscriber: &str,
        channel: &str,
    ) -> Result<bool, AppError> {
        let doc_id = Subscription::doc_id(subscriber, channel);
        Ok(self.subscriptions.remove(&doc_id).is_some())
    }

    async fn count_subscribers(&self, channel: &str) -> Result<u64, AppError> {
        Ok(self
            .subscriptions
            .iter()
            .filter(|s| s.channel == channel)
            .count() as u64)
    }

    async fn count_subscriptions(&self, subscriber: &str) -> Result<u64, AppError> {
        Ok(self
            .subscriptions
            .iter()
            .filter(|s| s.subscriber == subscriber)
            .count() as u64)
    }

    async fn is_subscribed(&self, subscriber: &str, channel: &str) -> Result<bool, AppError> {
        Ok(self
            .subscriptions
            .contains_key(&Subscription::doc_id(subscriber, channel)))
    }

    async fn append_watch_history(
        &self,
        user_id: &str,
        video_id: &str,
    ) -> Result<(), AppError> {
        self.modify_user(user_id, |user| {
            user.watch_history.retain(|id| id != video_id);
            user.watch_history.push(video_id.to_string());
        })?;
        Ok(())
    }

    async fn get_video(&self, id: &str) -> Result<Option<Video>, AppError> {
        Ok(self.videos.get(id).map(|v| v.value().clone()))
    }

    async fn put_video(&self, video: &Video) -> Result<(), AppError> {
        self.videos.insert(video.id.clone(), video.clone());
        Ok(())
    }
}
