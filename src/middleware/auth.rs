//! Authentication middleware
//!
//! Tokens are issued by the external identity provider; this service only
//! verifies them and turns the claims into an [`ActorContext`].

use axum::{
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{ActorContext, Role},
    state::AppState,
};

/// Access token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Actor id
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

/// Verify an HS256 access token and build the actor it names
pub fn verify_token(token: &str, secret: &str) -> AppResult<ActorContext> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    let claims = token_data.claims;

    let actor_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidToken)?;
    let role: Role = claims.role.parse().map_err(|_| AppError::InvalidToken)?;

    Ok(ActorContext::new(actor_id, role))
}

impl<S> FromRequestParts<S> for ActorContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ActorContext>()
            .copied()
            .ok_or(AppError::Unauthorized)
    }
}

/// Authentication middleware
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let path = request.uri().path().to_string();

    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| {
            debug!(path = %path, "Auth failed: missing or malformed Authorization header");
            AppError::Unauthorized
        })?;

    let actor = verify_token(token, &state.config().auth.jwt_secret).map_err(|e| {
        debug!(path = %path, error = ?e, "Auth failed: token verification failed");
        e
    })?;

    debug!(path = %path, actor_id = %actor.actor_id, role = %actor.role, "Actor authenticated");

    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}
