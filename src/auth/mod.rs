use axum::http::{HeaderMap, header};
use axum_extra::headers::{Cookie, HeaderMapExt};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::GatewayError;

pub const SESSION_COOKIE: &str = "session";

/// Bucket shared by every unauthenticated caller on a loopback host.
pub const DEV_LOCAL_IDENTITY: &str = "dev-local";

const SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

/// The resolved caller key used for rate-limit accounting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    User(String),
    DevLocal,
}

impl Identity {
    pub fn key(&self) -> &str {
        match self {
            Identity::User(id) => id,
            Identity::DevLocal => DEV_LOCAL_IDENTITY,
        }
    }
}

pub fn issue_session_token(
    user_id: &str,
    config: &Config,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(Duration::hours(SESSION_TTL_HOURS))
        .expect("valid timestamp")
        .timestamp();

    let claims = Claims {
        sub: user_id.to_string(),
        exp: expiration,
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
}

pub fn verify_session_token(
    token: &str,
    config: &Config,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

/// Resolves the calling principal from the session cookie. Without one, an
/// anonymous identity is allowed only when the declared Host is loopback;
/// that path is a development convenience, never a security boundary.
pub fn resolve_identity(headers: &HeaderMap, config: &Config) -> Result<Identity, GatewayError> {
    let session = headers
        .typed_get::<Cookie>()
        .and_then(|cookie| cookie.get(SESSION_COOKIE).map(str::to_string));

    if let Some(token) = session {
        match verify_session_token(&token, config) {
            Ok(claims) => return Ok(Identity::User(claims.sub)),
            Err(e) => {
                // Expired or tampered cookies fall through to the anonymous
                // path rather than leaking verification detail to the caller.
                tracing::debug!("session token rejected: {}", e);
            }
        }
    }

    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();
    if host.starts_with("localhost") || host.starts_with("127.0.0.1") {
        return Ok(Identity::DevLocal);
    }

    Err(GatewayError::Unauthenticated)
}
