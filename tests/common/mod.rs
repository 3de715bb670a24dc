// SPDX-License-Identifier: MIT

use std::sync::Arc;

use viewtube_api::config::Config;
use viewtube_api::db::MemoryStore;
use viewtube_api::models::{PublicUser, Video};
use viewtube_api::routes::create_router;
use viewtube_api::services::media::stage_upload;
use viewtube_api::services::session::RegisterInput;
use viewtube_api::services::{
    ChannelService, MockMediaHost, PasswordHasher, SessionManager, TokenIssuer,
};
use viewtube_api::AppState;

/// Create a test app backed by the in-memory store and a mock media host.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let state = create_test_state();
    (create_router(state.clone()), state)
}

/// Create shared state only (for service-level tests).
pub fn create_test_state() -> Arc<AppState> {
    let config = Config::test_default();
    let store = Arc::new(MemoryStore::new());
    let media = Arc::new(MockMediaHost::new());
    let tokens = TokenIssuer::new(&config);

    let sessions = SessionManager::new(
        store.clone(),
        media,
        PasswordHasher::new(),
        tokens.clone(),
    );
    let channels = ChannelService::new(store.clone());

    Arc::new(AppState {
        config,
        store,
        tokens,
        sessions,
        channels,
    })
}

/// Create shared state whose media host fails every upload.
#[allow(dead_code)]
pub fn create_test_state_with_failing_media() -> Arc<AppState> {
    let config = Config::test_default();
    let store = Arc::new(MemoryStore::new());
    let media = Arc::new(MockMediaHost::failing());
    let tokens = TokenIssuer::new(&config);

    let sessions = SessionManager::new(
        store.clone(),
        media,
        PasswordHasher::new(),
        tokens.clone(),
    );
    let channels = ChannelService::new(store.clone());

    Arc::new(AppState {
        config,
        store,
        tokens,
        sessions,
        channels,
    })
}

/// Register a user through the session manager, staging fake media files.
#[allow(dead_code)]
pub async fn register_test_user(
    state: &Arc<AppState>,
    username: &str,
    email: &str,
    password: &str,
) -> PublicUser {
    let avatar = stage_upload("avatar.png", b"fake avatar bytes")
        .await
        .expect("staging avatar failed");

    state
        .sessions
        .register(RegisterInput {
            full_name: format!("Test {}", username),
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            avatar,
            cover_image: None,
        })
        .await
        .expect("registration failed")
}

/// Seed a video document owned by `owner_id`.
#[allow(dead_code)]
pub async fn seed_video(state: &Arc<AppState>, id: &str, owner_id: &str, title: &str) -> Video {
    let video = Video {
        id: id.to_string(),
        owner: owner_id.to_string(),
        title: title.to_string(),
        description: "test video".to_string(),
        video_file_url: format!("https://media.test/{}.mp4", id),
        thumbnail_url: format!("https://media.test/{}.jpg", id),
        duration_secs: 120,
        views: 0,
        created_at: chrono::Utc::now().to_rfc3339(),
    };
    state.store.put_video(&video).await.expect("seed video");
    video
}
