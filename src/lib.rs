// SPDX-License-Identifier: MIT

//! ViewTube API: backend for a small video-sharing platform.
//!
//! This crate provides user registration and JWT session management,
//! profile/media updates via an external media host, and channel
//! subscription / watch-history aggregation over Firestore.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;

use std::sync::Arc;

use config::Config;
use db::Store;
use services::channel::ChannelService;
use services::session::SessionManager;
use services::tokens::TokenIssuer;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub tokens: TokenIssuer,
    pub sessions: SessionManager,
    pub channels: ChannelService,
}
