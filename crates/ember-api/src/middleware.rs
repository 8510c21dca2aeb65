use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;
use uuid::Uuid;

pub use ember_types::api::Claims;

use crate::auth::AppState;
use crate::error::ApiError;

/// Turns a presented credential into a caller identity.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Claims, ApiError>;
}

/// HS256 tokens signed with a shared secret.
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: chrono::Duration,
}

impl JwtKeys {
    pub fn new(secret: &str, ttl: chrono::Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue(&self, user_id: Uuid, username: &str) -> anyhow::Result<String> {
        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            exp: (chrono::Utc::now() + self.ttl).timestamp() as usize,
        };

        let token = encode(&Header::default(), &claims, &self.encoding)?;
        Ok(token)
    }
}

impl CredentialVerifier for JwtKeys {
    fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let token_data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|e| {
                debug!("Rejected token: {}", e);
                ApiError::Unauthorized
            })?;
        Ok(token_data.claims)
    }
}

/// Read `Authorization: Bearer <token>` and hand the token to `verifier`.
pub fn authenticate(verifier: &dyn CredentialVerifier, headers: &HeaderMap) -> Result<Claims, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    let (scheme, token) = auth_header
        .split_once(' ')
        .ok_or(ApiError::Unauthorized)?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(ApiError::Unauthorized);
    }

    verifier.verify(token.trim())
}

/// Extract and validate the caller's JWT; handlers receive it as `Extension<Claims>`.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = authenticate(&state.jwt, req.headers())?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
