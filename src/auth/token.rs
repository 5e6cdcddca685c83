use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{Duration, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::env;
use uuid::Uuid;

use super::models::{Role, SafeUser};
use crate::utils::{error::ApiError, types::Pool};

const TOKEN_TTL_DAYS: i64 = 7;

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub sub: Uuid,
    pub exp: i64,
}

fn secret() -> Result<String, ApiError> {
    env::var("JWT_SECRET").map_err(ApiError::internal)
}

pub fn issue_token(user_id: Uuid) -> Result<String, ApiError> {
    let claims = AccessTokenClaims {
        sub: user_id,
        exp: (Utc::now() + Duration::days(TOKEN_TTL_DAYS)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret()?.as_bytes()),
    )
    .map_err(ApiError::internal)
}

pub fn verify_token(token: &str, secret: &str) -> Result<AccessTokenClaims, ApiError> {
    decode::<AccessTokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => {
            ApiError::Unauthorized("Token expired. Please log in again.".to_string())
        }
        _ => ApiError::Unauthorized("Invalid token".to_string()),
    })
}

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or_else(|| ApiError::Unauthorized("Authorization header missing or invalid".to_string()))
}

impl<S: Send + Sync> FromRequestParts<S> for AccessTokenClaims {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        verify_token(token, &secret()?)
    }
}

/// Any authenticated, active user.
pub struct AuthUser(pub SafeUser);

impl FromRequestParts<Pool> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, pool: &Pool) -> Result<Self, Self::Rejection> {
        use axum_eats::schema::users;

        let claims = AccessTokenClaims::from_request_parts(parts, pool).await?;

        let mut conn = pool.get().await.map_err(ApiError::internal)?;
        let user = users::table
            .find(claims.sub)
            .select(SafeUser::as_select())
            .get_result(&mut conn)
            .await
            .map_err(|_| ApiError::Unauthorized("User not found for this token".to_string()))?;

        if !user.is_active {
            return Err(ApiError::Unauthorized(
                "Account has been deactivated".to_string(),
            ));
        }

        Ok(AuthUser(user))
    }
}

/// Admin role required.
pub struct AdminUser(pub SafeUser);

impl FromRequestParts<Pool> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, pool: &Pool) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, pool).await?;
        if user.role() != Some(Role::Admin) {
            return Err(ApiError::Forbidden(
                "Access denied. Admin privileges required.".to_string(),
            ));
        }
        Ok(AdminUser(user))
    }
}

/// Restaurant owner or admin.
pub struct StaffUser(pub SafeUser);

impl FromRequestParts<Pool> for StaffUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, pool: &Pool) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, pool).await?;
        match user.role() {
            Some(Role::Restaurant) | Some(Role::Admin) => Ok(StaffUser(user)),
            _ => Err(ApiError::Forbidden(
                "Access denied. Restaurant privileges required.".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_with(claims: &AccessTokenClaims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn token_round_trip() {
        let id = Uuid::new_v4();
        let claims = AccessTokenClaims {
            sub: id,
            exp: (Utc::now() + Duration::days(1)).timestamp(),
        };
        let token = encode_with(&claims, "test-secret");
        let decoded = verify_token(&token, "test-secret").unwrap();
        assert_eq!(decoded.sub, id);
    }

    #[test]
    fn expired_token_is_unauthorized() {
        let claims = AccessTokenClaims {
            sub: Uuid::new_v4(),
            exp: (Utc::now() - Duration::hours(1)).timestamp(),
        };
        let token = encode_with(&claims, "test-secret");
        match verify_token(&token, "test-secret") {
            Err(ApiError::Unauthorized(msg)) => assert!(msg.contains("expired")),
            other => panic!("unexpected: {:?}", other.map(|c| c.sub)),
        }
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let claims = AccessTokenClaims {
            sub: Uuid::new_v4(),
            exp: (Utc::now() + Duration::days(1)).timestamp(),
        };
        let token = encode_with(&claims, "test-secret");
        assert!(matches!(
            verify_token(&token, "other-secret"),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(matches!(
            verify_token("not-a-jwt", "test-secret"),
            Err(ApiError::Unauthorized(_))
        ));
    }
}
