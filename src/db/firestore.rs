// SPDX-License-Identifier: MIT

//! Firestore-backed implementation of the [`Store`] contract.
//!
//! Users, subscriptions and videos each live in their own collection.
//! Partial user updates are fetch-modify-write on the user document;
//! Firestore serializes conflicting writes per document.

use async_trait::async_trait;

use crate::db::{collections, Store};
use crate::error::AppError;
use crate::models::{Subscription, User, Video};

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreStore {
    client: firestore::FirestoreDb,
}

impl FirestoreStore {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated
        // connection to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    /// Query users by a single field value, limit 1.
    async fn find_user_by_field(
        &self,
        field: &'static str,
        value: &str,
    ) -> Result<Option<User>, AppError> {
        let value = value.to_string();
        let users: Vec<User> = self
            .client
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.for_all([q.field(field).eq(value.clone())]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(users.into_iter().next())
    }

    /// Store the full user document under its ID.
    async fn write_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Fetch-modify-write a user document. Returns `NotFound` if the user
    /// vanished between authentication and the update.
    async fn modify_user<F>(&self, id: &str, mutate: F) -> Result<User, AppError>
    where
        F: FnOnce(&mut User),
    {
        let mut user = self
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

        mutate(&mut user);
        user.touch();
        self.write_user(&user).await?;
        Ok(user)
    }

    /// Count subscription rows matching one field.
    async fn count_subscriptions_by(
        &self,
        field: &'static str,
        value: &str,
    ) -> Result<u64, AppError> {
        let value = value.to_string();
        let rows: Vec<Subscription> = self
            .client
            .fluent()
            .select()
            .from(collections::SUBSCRIPTIONS)
            .filter(move |q| q.for_all([q.field(field).eq(value.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.len() as u64)
    }
}

#[async_trait]
impl Store for FirestoreStore {
    async fn find_user_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<User>, AppError> {
        if let Some(user) = self.find_user_by_field("username", identifier).await? {
            return Ok(Some(user));
        }
        self.find_user_by_field("email", identifier).await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        self.find_user_by_field("username", username).await
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn create_user(&self, user: &User) -> Result<(), AppError> {
        // Best-effort uniqueness check before the write; two racing
        // registrations for the same handle can still both pass, matching
        // the reference behavior of check-then-insert.
        if self
            .find_user_by_field("username", &user.username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "Username '{}' is already taken",
                user.username
            )));
        }
        if self
            .find_user_by_field("email", &user.email)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "Email '{}' is already registered",
                user.email
            )));
        }

        self.write_user(user).await
    }

    async fn update_refresh_token(
        &self,
        id: &str,
        token: Option<&str>,
    ) -> Result<(), AppError> {
        // Logout must stay idempotent: a vanished user is not an error.
        let Some(mut user) = self.get_user(id).await? else {
            return Ok(());
        };
        user.refresh_token = token.map(str::to_string);
        user.touch();
        self.write_user(&user).await
    }

    async fn set_password_hash(&self, id: &str, hash: &str) -> Result<(), AppError> {
        self.modify_user(id, |user| user.password_hash = hash.to_string())
            .await?;
        Ok(())
    }

    async fn update_account(
        &self,
        id: &str,
        full_name: Option<&str>,
        email: Option<&str>,
    ) -> Result<User, AppError> {
        if let Some(email) = email {
            if let Some(existing) = self.find_user_by_field("email", email).await? {
                if existing.id != id {
                    return Err(AppError::Conflict(format!(
                        "Email '{}' is already registered",
                        email
                    )));
                }
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
        .await
    }

    async fn set_avatar(&self, id: &str, url: &str) -> Result<User, AppError> {
        self.modify_user(id, |user| user.avatar_url = url.to_string())
            .await
    }

    async fn set_cover_image(&self, id: &str, url: &str) -> Result<User, AppError> {
        self.modify_user(id, |user| user.cover_image_url = url.to_string())
            .await
    }

    async fn create_subscription(
        &self,
        subscriber: &str,
        channel: &str,
    ) -> Result<bool, AppError> {
        if self.is_subscribed(subscriber, channel).await? {
            return Ok(false);
        }

        let row = Subscription::new(subscriber, channel);
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::SUBSCRIPTIONS)
            .document_id(Subscription::doc_id(subscriber, channel))
            .object(&row)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(true)
    }

    async fn delete_subscription(
        &self,
        subscriber: &str,
        channel: &str,
    ) -> Result<bool, AppError> {
        if !self.is_subscribed(subscriber, channel).await? {
            return Ok(false);
        }

        self.client
            .fluent()
            .delete()
            .from(collections::SUBSCRIPTIONS)
            .document_id(Subscription::doc_id(subscriber, channel))
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(true)
    }

    async fn count_subscribers(&self, channel: &str) -> Result<u64, AppError> {
        self.count_subscriptions_by("channel", channel).await
    }

    async fn count_subscriptions(&self, subscriber: &str) -> Result<u64, AppError> {
        self.count_subscriptions_by("subscriber", subscriber).await
    }

    async fn is_subscribed(&self, subscriber: &str, channel: &str) -> Result<bool, AppError> {
        let row: Option<Subscription> = self
            .client
            .fluent()
            .select()
            .by_id_in(collections::SUBSCRIPTIONS)
            .obj()
            .one(Subscription::doc_id(subscriber, channel))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(row.is_some())
    }

    async fn append_watch_history(
        &self,
        user_id: &str,
        video_id: &str,
    ) -> Result<(), AppError> {
        self.modify_user(user_id, |user| {
            user.watch_history.retain(|id| id != video_id);
            user.watch_history.push(video_id.to_string());
        })
        .await?;
        Ok(())
    }

    async fn get_video(&self, id: &str) -> Result<Option<Video>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::VIDEOS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn put_video(&self, video: &Video) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::VIDEOS)
            .document_id(&video.id)
            .object(video)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
