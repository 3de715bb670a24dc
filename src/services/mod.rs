// SPDX-License-Identifier: MIT

//! Business logic services.

pub mod channel;
pub mod media;
pub mod password;
pub mod session;
pub mod tokens;

pub use channel::ChannelService;
pub use media::{HttpMediaHost, MediaHost, MockMediaHost};
pub use password::PasswordHasher;
pub use session::SessionManager;
pub use tokens::{TokenIssuer, TokenKind};
