use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use serde::Deserialize;

use crate::auth::{extract_bearer_token, issue_token_pair, verify_jwt, TokenType};
use crate::extractors::JsonBody;
use crate::response::{ok, AppError};
use crate::state::AppState;
use crate::store::operations::users::{User, UserRole};
use crate::store::StoreError;
use crate::validation::{validate_kakao_uid, validate_username};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/refresh", get(refresh))
        .route("/:role", post(sign_in))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub kakao_uid: String,
    pub username: String,
}

/// Finds the user by kakao uid or creates one with the requested role. An
/// existing user keeps the role they signed up with.
async fn sign_in(
    State(state): State<AppState>,
    Path(role): Path<String>,
    JsonBody(req): JsonBody<SignInRequest>,
) -> Result<impl IntoResponse, AppError> {
    let role = role
        .parse::<UserRole>()
        .map_err(|_| AppError::unauthorized_code("AUTH_INVALID_ROLE", "Role must be student or teacher"))?;

    let kakao_uid = req.kakao_uid.trim();
    if let Err(msg) = validate_kakao_uid(kakao_uid) {
        return Err(AppError::bad_request("AUTH_INVALID_KAKAO_UID", msg));
    }
    let username = req.username.trim();
    if let Err(msg) = validate_username(username) {
        return Err(AppError::bad_request("AUTH_INVALID_USERNAME", msg));
    }

    let user = match state.store().get_user_by_kakao_uid(kakao_uid)? {
        Some(user) => user,
        None => {
            let now = Utc::now();
            let user = User {
                id: uuid::Uuid::new_v4().to_string(),
                kakao_uid: kakao_uid.to_string(),
                username: username.to_string(),
                role,
                created_at: now,
                updated_at: now,
            };
            match state.store().create_user(&user) {
                Ok(()) => {
                    tracing::info!(user_id = %user.id, role = %role, "User created on first sign-in");
                    user
                }
                // A concurrent sign-in with the same uid won the race.
                Err(StoreError::Conflict { .. }) => state
                    .store()
                    .get_user_by_kakao_uid(kakao_uid)?
                    .ok_or_else(|| AppError::internal("user vanished after conflict"))?,
                Err(e) => return Err(e.into()),
            }
        }
    };

    let tokens = issue_token_pair(&user.id, &state.config().jwt)?;
    Ok(ok(tokens))
}

async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let token = extract_bearer_token(&headers)?;
    let claims = verify_jwt(&token, &state.config().jwt.refresh_secret, TokenType::Refresh)?;

    let user = state
        .store()
        .get_user_by_id(&claims.sub)?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    let tokens = issue_token_pair(&user.id, &state.config().jwt)?;
    Ok(ok(tokens))
}
