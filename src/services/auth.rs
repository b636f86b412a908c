use axum::http::{header, HeaderMap};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sha1::Sha1;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::admin::{AdminClaims, ADMIN_ROLE};

type HmacSha1 = Hmac<Sha1>;

const TOKEN_COOKIE: &str = "jwt";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("You are not logged in. Please log in to get access.")]
    Missing,
    #[error("Invalid or expired token. Please log in again.")]
    Invalid,
    #[error("You do not have permission to perform this action")]
    Forbidden,
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Forbidden => AppError::Forbidden,
            other => AppError::Unauthorized(other.to_string()),
        }
    }
}

/// Checks an admin credential. Independent of any request type.
pub fn authorize(credential: Option<&str>, secret: &str) -> Result<AdminClaims, AuthError> {
    let token = credential
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::Missing)?;

    let claims = decode::<AdminClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "rejected admin token");
        AuthError::Invalid
    })?
    .claims;

    if claims.role != ADMIN_ROLE {
        return Err(AuthError::Forbidden);
    }

    Ok(claims)
}

/// Bearer header first, then the `jwt` cookie.
pub fn credential_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);

    bearer.or_else(|| {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == TOKEN_COOKIE)
            .map(|(_, value)| value.to_string())
    })
}

/// Guard used by every admin handler.
pub fn check_auth(headers: &HeaderMap, config: &AppConfig) -> Result<AdminClaims, AppError> {
    let credential = credential_from_headers(headers);
    Ok(authorize(credential.as_deref(), &config.jwt_secret)?)
}

pub fn issue_token(email: &str, config: &AppConfig) -> Result<String, AppError> {
    let exp = Utc::now() + Duration::hours(config.jwt_expires_hours);
    let claims = AdminClaims {
        sub: email.to_string(),
        email: email.to_string(),
        role: ADMIN_ROLE.to_string(),
        exp: exp.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("failed to sign token: {e}")))
}

/// Compares login credentials with the configured admin account in constant time.
pub fn verify_credentials(email: &str, password: &str, config: &AppConfig) -> bool {
    if config.admin_password.is_empty() {
        tracing::warn!("admin login attempted but ADMIN_PASSWORD is not set");
        return false;
    }

    let key = config.jwt_secret.as_bytes();
    let (mut expected, mut supplied) = match (
        HmacSha1::new_from_slice(key),
        HmacSha1::new_from_slice(key),
    ) {
        (Ok(e), Ok(s)) => (e, s),
        _ => return false,
    };
    expected.update(config.admin_password.as_bytes());
    supplied.update(password.as_bytes());
    let password_ok = supplied
        .verify_slice(&expected.finalize().into_bytes())
        .is_ok();

    let email_ok = email.trim().eq_ignore_ascii_case(&config.admin_email);
    email_ok && password_ok
}
