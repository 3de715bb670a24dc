// SPDX-License-Identifier: MIT

//! JWT issuance and verification for session tokens.
//!
//! Access and refresh tokens are signed with distinct secrets, so a
//! compromised access secret cannot forge refresh tokens (and vice versa).
//! The claims additionally carry the token kind as a second line of defense.

use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::Config;
use crate::error::AppError;

/// Which of the two token kinds a JWT claims to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Token kind ("access" or "refresh")
    pub kind: TokenKind,
    /// Issued at (Unix timestamp)
    pub iat: usize,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
}

/// Mints and verifies the session token pair.
#[derive(Clone)]
pub struct TokenIssuer {
    access_secret: Vec<u8>,
    refresh_secret: Vec<u8>,
    access_ttl_secs: u64,
    refresh_ttl_secs: u64,
}

impl TokenIssuer {
    pub fn new(config: &Config) -> Self {
        Self {
            access_secret: config.access_token_secret.clone(),
            refresh_secret: config.refresh_token_secret.clone(),
            access_ttl_secs: config.access_token_ttl_secs,
            refresh_ttl_secs: config.refresh_token_ttl_secs,
        }
    }

    /// Mint a short-lived access token.
    pub fn issue_access(&self, user_id: &str) -> Result<String, AppError> {
        self.issue(user_id, TokenKind::Access)
    }

    /// Mint a long-lived refresh token.
    pub fn issue_refresh(&self, user_id: &str) -> Result<String, AppError> {
        self.issue(user_id, TokenKind::Refresh)
    }

    fn issue(&self, user_id: &str, kind: TokenKind) -> Result<String, AppError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
            .as_secs() as usize;

        let ttl = match kind {
            TokenKind::Access => self.access_ttl_secs,
            TokenKind::Refresh => self.refresh_ttl_secs,
        } as usize;

        let claims = Claims {
            sub: user_id.to_string(),
            kind,
            iat: now,
            exp: now + ttl,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret_for(kind)),
        )
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT encoding failed: {}", e)))
    }

    /// Verify a token of the expected kind and return its subject.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<String, AppError> {
        let key = DecodingKey::from_secret(self.secret_for(expected));
        let validation = Validation::new(Algorithm::HS256);

        let data = decode::<Claims>(token, &key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
                _ => AppError::InvalidToken,
            }
        })?;

        if data.claims.kind != expected {
            return Err(AppError::InvalidToken);
        }

        Ok(data.claims.sub)
    }

    fn secret_for(&self, kind: TokenKind) -> &[u8] {
        match kind {
            TokenKind::Access => &self.access_secret,
            TokenKind::Refresh => &self.refresh_secret,
        }
    }
}
