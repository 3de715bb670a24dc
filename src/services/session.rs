// SPDX-License-Identifier: MIT

//! Session lifecycle: register, login, logout, refresh, password change
//! and profile/media updates.
//!
//! A user holds at most one valid refresh token. Login and refresh both
//! overwrite it, which silently invalidates any other active session for
//! that user; logout clears it. Refresh cross-checks the presented token
//! against the stored one, so a token that was rotated away (or cleared
//! by logout) never validates again even while its signature is valid.

use std::path::PathBuf;
use std::sync::Arc;
use validator::ValidateEmail;

use crate::db::Store;
use crate::error::AppError;
use crate::models::{PublicUser, User};
use crate::services::media::MediaHost;
use crate::services::password::PasswordHasher;
use crate::services::tokens::{TokenIssuer, TokenKind};

/// Access + refresh token pair handed to the caller.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Input for `register`, already staged to local files by the route layer.
pub struct RegisterInput {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    /// Staged avatar file (mandatory)
    pub avatar: PathBuf,
    /// Staged cover image file (optional)
    pub cover_image: Option<PathBuf>,
}

/// Orchestrates the credential store, password hasher, token issuer and
/// media host.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn Store>,
    media: Arc<dyn MediaHost>,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn Store>,
        media: Arc<dyn MediaHost>,
        hasher: PasswordHasher,
        tokens: TokenIssuer,
    ) -> Self {
        Self {
            store,
            media,
            hasher,
            tokens,
        }
    }

    /// Register a new user.
    ///
    /// All text fields are trimmed and must be non-blank; username and
    /// email are lowercased before uniqueness checks. The avatar is
    /// mandatory; a failed cover upload degrades to an empty cover URL.
    pub async fn register(&self, input: RegisterInput) -> Result<PublicUser, AppError> {
        let validated = self.validate_registration(&input).await;
        let (full_name, username, email, password) = match validated {
            Ok(fields) => fields,
            Err(e) => {
                // Nothing was uploaded yet; drop the staged files.
                discard_staged(&input).await;
                return Err(e);
            }
        };

        let avatar = match self.media.upload(&input.avatar).await {
            Ok(media) => media,
            Err(e) => {
                // The media host removed the staged avatar; the cover is
                // still on disk and must not be orphaned.
                discard_staged(&input).await;
                return Err(e);
            }
        };
        if avatar.url.is_empty() {
            discard_staged(&input).await;
            return Err(AppError::Media("Media host returned an empty URL".to_string()));
        }

        let cover_image_url = match input.cover_image {
            Some(staged) => match self.media.upload(&staged).await {
                Ok(media) => media.url,
                Err(e) => {
                    // Cover is optional; registration proceeds without it.
                    tracing::warn!(error = %e, "Cover image upload failed, continuing without");
                    String::new()
                }
            },
            None => String::new(),
        };

        let now = chrono::Utc::now().to_rfc3339();
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            username,
            email,
            full_name,
            password_hash: self.hasher.hash(&password)?,
            avatar_url: avatar.url,
            cover_image_url,
            refresh_token: None,
            watch_history: vec![],
            created_at: now.clone(),
            updated_at: now,
        };

        self.store.create_user(&user).await?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(PublicUser::from(user))
    }

    /// Trim/normalize the text fields and reject duplicates before any
    /// media is uploaded.
    async fn validate_registration(
        &self,
        input: &RegisterInput,
    ) -> Result<(String, String, String, String), AppError> {
        let full_name = required_field(&input.full_name, "fullName")?;
        let username = required_field(&input.username, "username")?.to_lowercase();
        let email = required_field(&input.email, "email")?.to_lowercase();
        let password = required_field(&input.password, "password")?;

        if !email.validate_email() {
            return Err(AppError::Validation(format!(
                "'{}' is not a valid email address",
                email
            )));
        }

        if self
            .store
            .find_user_by_identifier(&username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "Username '{}' is already taken",
                username
            )));
        }
        if self.store.find_user_by_identifier(&email).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "Email '{}' is already registered",
                email
            )));
        }

        Ok((full_name, username, email, password))
    }

    /// Log in with a username or email plus password.
    ///
    /// Issues a fresh token pair and persists the refresh token,
    /// overwriting any prior one.
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<(PublicUser, TokenPair), AppError> {
        let identifier = required_field(identifier, "username or email")?.to_lowercase();
        let password = required_field(password, "password")?;

        let user = self
            .store
            .find_user_by_identifier(&identifier)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", identifier)))?;

        if !self.hasher.verify(&password, &user.password_hash) {
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        }

        let pair = self.issue_pair(&user.id).await?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok((PublicUser::from(user), pair))
    }

    /// Log out: clear the stored refresh token. Idempotent.
    pub async fn logout(&self, user_id: &str) -> Result<(), AppError> {
        self.store.update_refresh_token(user_id, None).await?;
        tracing::info!(user_id = %user_id, "User logged out");
        Ok(())
    }

    /// Exchange a refresh token for a new pair, rotating the stored token.
    pub async fn refresh(&self, incoming: &str) -> Result<TokenPair, AppError> {
        if incoming.trim().is_empty() {
            return Err(AppError::Unauthorized(
                "Refresh token is missing".to_string(),
            ));
        }

        let user_id = self.tokens.verify(incoming, TokenKind::Refresh)?;

        let user = self
            .store
            .get_user(&user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        // The presented token must exactly match the stored one. Anything
        // else is reuse after rotation or after logout.
        if user.refresh_token.as_deref() != Some(incoming) {
            tracing::warn!(user_id = %user_id, "Refresh token mismatch (rotated or revoked)");
            return Err(AppError::Unauthorized(
                "Refresh token has been rotated or revoked".to_string(),
            ));
        }

        let pair = self.issue_pair(&user_id).await?;

        tracing::debug!(user_id = %user_id, "Session refreshed");
        Ok(pair)
    }

    /// Change the password after verifying the old one.
    ///
    /// Existing sessions stay valid; only the credential changes.
    pub async fn change_password(
        &self,
        user_id: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let new_password = required_field(new_password, "newPassword")?;

        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        if !self.hasher.verify(old_password, &user.password_hash) {
            return Err(AppError::Unauthorized(
                "Old password is incorrect".to_string(),
            ));
        }

        let hash = self.hasher.hash(&new_password)?;
        self.store.set_password_hash(user_id, &hash).await?;

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    /// Fetch the sanitized current user.
    pub async fn current_user(&self, user_id: &str) -> Result<PublicUser, AppError> {
        self.store
            .get_user(user_id)
            .await?
            .map(PublicUser::from)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
    }

    /// Partial account update (full name and/or email).
    pub async fn update_account(
        &self,
        user_id: &str,
        full_name: Option<&str>,
        email: Option<&str>,
    ) -> Result<PublicUser, AppError> {
        let full_name = full_name.map(str::trim).filter(|s| !s.is_empty());
        let email = email
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty());

        if full_name.is_none() && email.is_none() {
            return Err(AppError::Validation(
                "At least one of fullName or email is required".to_string(),
            ));
        }
        if let Some(email) = &email {
            if !email.validate_email() {
                return Err(AppError::Validation(format!(
                    "'{}' is not a valid email address",
                    email
                )));
            }
        }

        let user = self
            .store
            .update_account(user_id, full_name, email.as_deref())
            .await?;
        Ok(PublicUser::from(user))
    }

    /// Replace the avatar with a newly uploaded file.
    pub async fn update_avatar(
        &self,
        user_id: &str,
        staged: PathBuf,
    ) -> Result<PublicUser, AppError> {
        let media = self.media.upload(&staged).await?;
        let user = self.store.set_avatar(user_id, &media.url).await?;
        Ok(PublicUser::from(user))
    }

    /// Replace the cover image with a newly uploaded file.
    pub async fn update_cover_image(
        &self,
        user_id: &str,
        staged: PathBuf,
    ) -> Result<PublicUser, AppError> {
        let media = self.media.upload(&staged).await?;
        let user = self.store.set_cover_image(user_id, &media.url).await?;
        Ok(PublicUser::from(user))
    }

    /// Mint a token pair and persist the refresh half.
    ///
    /// Rotation is not transactional with issuance; two concurrent
    /// refreshes can race, last write wins.
    async fn issue_pair(&self, user_id: &str) -> Result<TokenPair, AppError> {
        let access_token = self.tokens.issue_access(user_id)?;
        let refresh_token = self.tokens.issue_refresh(user_id)?;

        self.store
            .update_refresh_token(user_id, Some(&refresh_token))
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}

/// Remove any staged upload files still on disk. Files the media host
/// already consumed are gone by now; removing them again is a no-op.
async fn discard_staged(input: &RegisterInput) {
    let _ = tokio::fs::remove_file(&input.avatar).await;
    if let Some(cover) = &input.cover_image {
        let _ = tokio::fs::remove_file(cover).await;
    }
}

/// Trim a required text field, rejecting blanks.
fn required_field(value: &str, name: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} is required", name)));
    }
    Ok(trimmed.to_string())
}
