// SPDX-License-Identifier: MIT

//! Subscription routes.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::post,
    Extension, Router,
};
use std::sync::Arc;

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::response::ApiResponse;
use crate::AppState;

/// Routes guarded by the auth middleware (applied in routes/mod.rs).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/v1/subscriptions/c/{channel_id}",
        post(toggle_subscription),
    )
}

/// Toggle the caller's subscription to a channel.
async fn toggle_subscription(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(channel_id): Path<String>,
) -> Result<impl IntoResponse> {
    let subscribed = state
        .channels
        .toggle_subscription(&user.user_id, &channel_id)
        .await?;

    let message = if subscribed {
        "Subscribed"
    } else {
        "Unsubscribed"
    };
    Ok(ApiResponse::ok(
        serde_json::json!({ "subscribed": subscribed }),
        message,
    ))
}
