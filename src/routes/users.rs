// SPDX-License-Identifier: MIT

//! User account, session and channel routes.

use axum::{
    extract::{Multipart, Path, State},
    response::IntoResponse,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::{AuthUser, ACCESS_COOKIE, REFRESH_COOKIE};
use crate::response::ApiResponse;
use crate::services::media::stage_upload;
use crate::services::session::{RegisterInput, TokenPair};
use crate::AppState;

/// Routes that require no authentication.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/users/register", post(register))
        .route("/api/v1/users/login", post(login))
        .route("/api/v1/users/refresh-token", post(refresh_token))
}

/// Routes guarded by the auth middleware (applied in routes/mod.rs).
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/users/logout", post(logout))
        .route("/api/v1/users/change-password", post(change_password))
        .route("/api/v1/users/current-user", get(current_user))
        .route("/api/v1/users/update-account", patch(update_account))
        .route("/api/v1/users/avatar", patch(update_avatar))
        .route("/api/v1/users/cover-image", patch(update_cover_image))
        .route("/api/v1/users/c/{username}", get(channel_profile))
        .route("/api/v1/users/watch-history", get(watch_history))
        .route("/api/v1/users/watch-history/{video_id}", post(record_watch))
}

// ─── Cookie helpers ──────────────────────────────────────────

fn auth_cookie(name: &'static str, value: String, ttl_secs: u64) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::seconds(ttl_secs as i64))
        .build()
}

/// Set both auth cookies from a freshly issued pair.
fn set_auth_cookies(jar: CookieJar, state: &AppState, pair: &TokenPair) -> CookieJar {
    jar.add(auth_cookie(
        ACCESS_COOKIE,
        pair.access_token.clone(),
        state.config.access_token_ttl_secs,
    ))
    .add(auth_cookie(
        REFRESH_COOKIE,
        pair.refresh_token.clone(),
        state.config.refresh_token_ttl_secs,
    ))
}

/// Clear both auth cookies.
fn clear_auth_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(ACCESS_COOKIE).path("/").build())
        .remove(Cookie::build(REFRESH_COOKIE).path("/").build())
}

// ─── Registration ────────────────────────────────────────────

/// Register a new user (multipart: text fields + avatar + optional cover).
async fn register(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut full_name = String::new();
    let mut username = String::new();
    let mut email = String::new();
    let mut password = String::new();
    let mut avatar: Option<PathBuf> = None;
    let mut cover_image: Option<PathBuf> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "fullName" => full_name = read_text(field).await?,
            "username" => username = read_text(field).await?,
            "email" => email = read_text(field).await?,
            "password" => password = read_text(field).await?,
            "avatar" => avatar = Some(stage_file(field).await?),
            "coverImage" => cover_image = Some(stage_file(field).await?),
            _ => {}
        }
    }

    let Some(avatar) = avatar else {
        if let Some(cover) = cover_image {
            let _ = tokio::fs::remove_file(cover).await;
        }
        return Err(AppError::Validation("avatar file is required".to_string()));
    };

    let user = state
        .sessions
        .register(RegisterInput {
            full_name,
            username,
            email,
            password,
            avatar,
            cover_image,
        })
        .await?;

    Ok(ApiResponse::created(user, "User registered successfully"))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart field: {}", e)))
}

async fn stage_file(field: axum::extract::multipart::Field<'_>) -> Result<PathBuf> {
    let filename = field.file_name().unwrap_or("upload.bin").to_string();
    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart file: {}", e)))?;
    stage_upload(&filename, &bytes).await
}

// ─── Sessions ────────────────────────────────────────────────

#[derive(Deserialize)]
struct LoginRequest {
    /// Username or email; both field names are accepted.
    username: Option<String>,
    email: Option<String>,
    password: String,
}

/// Log in and receive the token pair as cookies and in the body.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let identifier = body.username.or(body.email).unwrap_or_default();
    let (user, pair) = state.sessions.login(&identifier, &body.password).await?;

    let jar = set_auth_cookies(jar, &state, &pair);
    let data = serde_json::json!({
        "user": user,
        "accessToken": pair.access_token,
        "refreshToken": pair.refresh_token,
    });

    Ok((jar, ApiResponse::ok(data, "User logged in successfully")))
}

/// Log out: clear the stored refresh token and both cookies.
async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
) -> Result<impl IntoResponse> {
    state.sessions.logout(&user.user_id).await?;

    let jar = clear_auth_cookies(jar);
    Ok((
        jar,
        ApiResponse::ok(serde_json::json!({}), "User logged out"),
    ))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest {
    refresh_token: Option<String>,
}

/// Exchange a refresh token (cookie or body) for a rotated pair.
async fn refresh_token(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> Result<impl IntoResponse> {
    let incoming = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| body.and_then(|Json(b)| b.refresh_token))
        .ok_or_else(|| AppError::Unauthorized("Refresh token is missing".to_string()))?;

    let pair = state.sessions.refresh(&incoming).await?;

    let jar = set_auth_cookies(jar, &state, &pair);
    let data = serde_json::json!({
        "accessToken": pair.access_token,
        "refreshToken": pair.refresh_token,
    });

    Ok((jar, ApiResponse::ok(data, "Access token refreshed")))
}

// ─── Account management ──────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordRequest {
    old_password: String,
    new_password: String,
}

async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse> {
    state
        .sessions
        .change_password(&user.user_id, &body.old_password, &body.new_password)
        .await?;

    Ok(ApiResponse::ok(
        serde_json::json!({}),
        "Password changed successfully",
    ))
}

async fn current_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let user = state.sessions.current_user(&user.user_id).await?;
    Ok(ApiResponse::ok(user, "Current user fetched"))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateAccountRequest {
    full_name: Option<String>,
    email: Option<String>,
}

async fn update_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<UpdateAccountRequest>,
) -> Result<impl IntoResponse> {
    let updated = state
        .sessions
        .update_account(
            &user.user_id,
            body.full_name.as_deref(),
            body.email.as_deref(),
        )
        .await?;

    Ok(ApiResponse::ok(updated, "Account updated"))
}

/// Pull the single expected file out of a multipart body.
async fn single_file(mut multipart: Multipart, expected: &str) -> Result<PathBuf> {
    let mut staged: Option<PathBuf> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() == Some(expected) {
            staged = Some(stage_file(field).await?);
        }
    }

    staged.ok_or_else(|| AppError::Validation(format!("{} file is required", expected)))
}

async fn update_avatar(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let staged = single_file(multipart, "avatar").await?;
    let updated = state.sessions.update_avatar(&user.user_id, staged).await?;
    Ok(ApiResponse::ok(updated, "Avatar updated"))
}

async fn update_cover_image(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let staged = single_file(multipart, "coverImage").await?;
    let updated = state
        .sessions
        .update_cover_image(&user.user_id, staged)
        .await?;
    Ok(ApiResponse::ok(updated, "Cover image updated"))
}

// ─── Channel & history ───────────────────────────────────────

async fn channel_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse> {
    let profile = state
        .channels
        .channel_profile(&username, Some(&user.user_id))
        .await?;
    Ok(ApiResponse::ok(profile, "Channel profile fetched"))
}

async fn watch_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let history = state.channels.watch_history(&user.user_id).await?;
    Ok(ApiResponse::ok(history, "Watch history fetched"))
}

async fn record_watch(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(video_id): Path<String>,
) -> Result<impl IntoResponse> {
    state.channels.record_watch(&user.user_id, &video_id).await?;
    Ok(ApiResponse::ok(serde_json::json!({}), "Watch recorded"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_cookie_flags() {
        let cookie = auth_cookie(ACCESS_COOKIE, "token".to_string(), 3600);
        assert_eq!(cookie.name(), "accessToken");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(3600)));
    }
}
