//! Bearer-token authentication.
//!
//! Tokens are HS256 JWTs carrying the user's id and display name. Issuing
//! them belongs to the account service; this server only verifies.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use cupid_shared::{CoreError, CoreResult, UserId};

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::error::ServerError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub name: String,
    pub exp: usize,
}

/// The caller, as established by a verified token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: UserId,
    pub name: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: UserId(claims.id),
            name: claims.name,
        }
    }
}

/// Verify signature and expiry of `token`.
pub fn verify_token(token: &str, secret: &str) -> CoreResult<AuthUser> {
    let validation = Validation::new(Algorithm::HS256);
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        CoreError::Unauthenticated
    })?;
    Ok(data.claims.into())
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let token = bearer_token(&parts.headers).ok_or(ServerError::Unauthenticated)?;
        Ok(verify_token(token, &state.config.jwt_secret)?)
    }
}

/// Check the admin bearer token in constant time.
pub fn verify_admin_token(headers: &HeaderMap, config: &ServerConfig) -> Result<(), ServerError> {
    let Some(ref expected) = config.admin_token else {
        return Err(ServerError::Forbidden(
            "Admin API is disabled (no ADMIN_TOKEN configured)".into(),
        ));
    };

    let token = bearer_token(headers).unwrap_or("");
    let token_bytes = token.as_bytes();
    let expected_bytes = expected.as_bytes();
    if token_bytes.len() != expected_bytes.len()
        || token_bytes.ct_eq(expected_bytes).unwrap_u8() != 1
    {
        return Err(ServerError::Forbidden("Invalid admin token".into()));
    }

    Ok(())
}

#[cfg(test)]
pub(crate) fn issue_token(id: UserId, name: &str, secret: &str) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let claims = Claims {
        id: id.0,
        name: name.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn valid_token_round_trips_identity() {
        let token = issue_token(UserId(7), "Ada", "secret");
        let user = verify_token(&token, "secret").unwrap();
        assert_eq!(user.id, UserId(7));
        assert_eq!(user.name, "Ada");
    }

    #[test]
    fn wrong_secret_or_garbage_is_unauthenticated() {
        let token = issue_token(UserId(7), "Ada", "secret");
        assert_eq!(
            verify_token(&token, "other").unwrap_err(),
            CoreError::Unauthenticated
        );
        assert_eq!(
            verify_token("not-a-jwt", "secret").unwrap_err(),
            CoreError::Unauthenticated
        );
    }

    #[test]
    fn expired_token_is_rejected() {
        use jsonwebtoken::{encode, EncodingKey, Header};

        let claims = Claims {
            id: 1,
            name: "Old".into(),
            exp: (chrono::Utc::now() - chrono::Duration::hours(2)).timestamp() as usize,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert!(verify_token(&token, "secret").is_err());
    }

    #[test]
    fn bearer_prefix_is_required() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Token abc"));
        assert!(bearer_token(&headers).is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));
    }

    #[test]
    fn admin_token_checks() {
        let mut config = ServerConfig::default();
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer root"));

        assert!(verify_admin_token(&headers, &config).is_err());

        config.admin_token = Some("root".into());
        assert!(verify_admin_token(&headers, &config).is_ok());

        config.admin_token = Some("toor".into());
        assert!(verify_admin_token(&headers, &config).is_err());
    }
}
