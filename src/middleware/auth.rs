// SPDX-License-Identifier: MIT

//! JWT authentication middleware.

use crate::error::AppError;
use crate::services::tokens::TokenKind;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Cookie carrying the access token.
pub const ACCESS_COOKIE: &str = "accessToken";
/// Cookie carrying the refresh token.
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Authenticated user extracted from the access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

/// Middleware that requires a valid access token.
///
/// Looks for the token in the `accessToken` cookie first, then in the
/// `Authorization: Bearer` header. The decoded subject is re-checked
/// against the store, so a deleted user's still-unexpired token is
/// rejected.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = if let Some(cookie) = jar.get(ACCESS_COOKIE) {
        cookie.value().to_string()
    } else {
        let auth_header = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        match auth_header {
            Some(h) if h.starts_with("Bearer ") => h[7..].to_string(),
            _ => {
                return Err(AppError::Unauthorized(
                    "Authentication required".to_string(),
                ))
            }
        }
    };

    let user_id = state.tokens.verify(&token, TokenKind::Access)?;

    if state.store.get_user(&user_id).await?.is_none() {
        return Err(AppError::Unauthorized("Invalid access token".to_string()));
    }

    request.extensions_mut().insert(AuthUser { user_id });

    Ok(next.run(request).await)
}
