//! Authentication Middleware
//!
//! The identity resolver: validates the JWT issued by the external auth
//! service and binds the request to an identity (the account email).
//! Browser clients send the token in a cookie, others as a bearer header.
//! The identity must exist in the user store or the request is rejected
//! before any upgrade or handler runs.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;
use crate::startup::AppState;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (account email, the chat identity)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Authenticated identity, injected into request extensions.
/// Immutable for the lifetime of the request (and of any connection
/// upgraded from it).
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub email: String,
}

/// Authentication middleware that resolves the request identity.
pub async fn auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Bearer header first, cookie fallback for browser clients
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_owned)
        .or_else(|| jar.get("token").map(|c| c.value().to_owned()))
        .ok_or_else(|| AppError::Unauthorized("Missing authentication token".into()))?;

    // Decode and validate JWT
    let token_data = decode::<Claims>(
        &token,
        &DecodingKey::from_secret(state.settings.jwt.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            AppError::Unauthorized("Token expired".into())
        }
        _ => AppError::Unauthorized("Invalid token".into()),
    })?;

    let email = token_data.claims.sub;

    // The identity must still exist in the wider system.
    state
        .users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Unknown identity".into()))?;

    // Insert the resolved identity into request extensions
    request.extensions_mut().insert(AuthUser { email });

    // Continue to the next handler
    Ok(next.run(request).await)
}
