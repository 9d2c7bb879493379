use axum::extract::{FromRef, FromRequestParts};
use axum::http::{request::Parts, HeaderMap};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::JwtConfig;
use crate::response::AppError;
use crate::state::AppState;
use crate::store::operations::users::UserRole;

const MAX_TOKEN_HOURS: u64 = 24 * 365 * 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub sub: String,
    pub token_type: TokenType,
    pub iat: i64,
    pub exp: i64,
    #[serde(default)]
    pub jti: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Access and refresh tokens are signed with different secrets, so one can
/// never verify as the other even before `tokenType` is checked.
pub fn issue_token_pair(user_id: &str, jwt: &JwtConfig) -> Result<TokenPair, AppError> {
    Ok(TokenPair {
        access_token: sign_jwt(
            user_id,
            TokenType::Access,
            &jwt.access_secret,
            jwt.access_expires_in_hours,
        )?,
        refresh_token: sign_jwt(
            user_id,
            TokenType::Refresh,
            &jwt.refresh_secret,
            jwt.refresh_expires_in_hours,
        )?,
    })
}

fn sign_jwt(
    subject_id: &str,
    token_type: TokenType,
    secret: &str,
    expires_in_hours: u64,
) -> Result<String, AppError> {
    let now = Utc::now();
    // Capped at a century so the expiry arithmetic cannot overflow.
    let exp = now + Duration::hours(expires_in_hours.min(MAX_TOKEN_HOURS) as i64);
    let claims = Claims {
        sub: subject_id.to_string(),
        token_type,
        iat: now.timestamp(),
        exp: exp.timestamp(),
        jti: uuid::Uuid::new_v4().to_string(),
    };

    encode(
        &Header::new(Algorithm::HS512),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(&format!("jwt sign failed: {e}")))
}

pub fn verify_jwt(token: &str, secret: &str, expected: TokenType) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS512);
    validation.validate_exp = true;
    validation.algorithms = vec![Algorithm::HS512];

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid or expired token"))?;

    if claims.token_type != expected {
        return Err(AppError::unauthorized("Invalid token type"));
    }
    Ok(claims)
}

pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth_header| auth_header.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::unauthorized("Missing bearer token"))
}

/// Caller identified by a valid access token whose user still exists.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub role: UserRole,
}

/// [`AuthUser`] restricted to teachers.
#[derive(Debug, Clone)]
pub struct TeacherUser(pub AuthUser);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let token = extract_bearer_token(&parts.headers)?;
        let claims = verify_jwt(
            &token,
            &app_state.config().jwt.access_secret,
            TokenType::Access,
        )?;

        let user = app_state
            .store()
            .get_user_by_id(&claims.sub)?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        Ok(AuthUser {
            user_id: user.id,
            role: user.role,
        })
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for TeacherUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != UserRole::Teacher {
            return Err(AppError::forbidden("Teacher role required"));
        }
        Ok(TeacherUser(user))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn jwt_config() -> JwtConfig {
        JwtConfig {
            access_secret: "access-secret".to_string(),
            refresh_secret: "refresh-secret".to_string(),
            access_expires_in_hours: 1,
            refresh_expires_in_hours: 24,
        }
    }

    #[test]
    fn token_pair_verifies_with_matching_secret_and_type() {
        let jwt = jwt_config();
        let pair = issue_token_pair("u1", &jwt).unwrap();

        let access = verify_jwt(&pair.access_token, &jwt.access_secret, TokenType::Access).unwrap();
        assert_eq!(access.sub, "u1");
        assert!(access.exp > access.iat);

        let refresh =
            verify_jwt(&pair.refresh_token, &jwt.refresh_secret, TokenType::Refresh).unwrap();
        assert_eq!(refresh.sub, "u1");
        assert_ne!(access.jti, refresh.jti);
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let jwt = jwt_config();
        let pair = issue_token_pair("u1", &jwt).unwrap();
        assert!(verify_jwt(&pair.refresh_token, &jwt.access_secret, TokenType::Access).is_err());

        // Same secret but wrong type still fails.
        let token = sign_jwt("u1", TokenType::Refresh, "shared", 1).unwrap();
        let err = verify_jwt(&token, "shared", TokenType::Access).unwrap_err();
        assert_eq!(err.message, "Invalid token type");
    }

    #[test]
    fn tokens_use_hs512() {
        let token = sign_jwt("u1", TokenType::Access, "s", 1).unwrap();
        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::HS512);
    }

    #[test]
    fn bearer_extraction() {
        let mut headers = HeaderMap::new();
        assert!(extract_bearer_token(&headers).is_err());

        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def"),
        );
        assert_eq!(extract_bearer_token(&headers).unwrap(), "abc.def");

        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Basic abc"),
        );
        assert!(extract_bearer_token(&headers).is_err());
    }
}
