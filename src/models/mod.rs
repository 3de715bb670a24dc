// SPDX-License-Identifier: MIT

//! Data models stored in Firestore and returned by the API.

pub mod subscription;
pub mod user;
pub mod video;

pub use subscription::Subscription;
pub use user::{PublicUser, User};
pub use video::Video;
