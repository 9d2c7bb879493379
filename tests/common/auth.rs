use axum::http::Method;
use axum::Router;

use super::http::{request, response_json};

pub struct SignedIn {
    pub access_token: String,
    pub refresh_token: String,
}

/// Signs in a fresh user with `role` and returns the token pair.
pub async fn sign_in(app: &Router, role: &str) -> SignedIn {
    let kakao_uid = uuid::Uuid::new_v4().simple().to_string();
    sign_in_as(app, role, &kakao_uid, "test user").await
}

pub async fn sign_in_as(app: &Router, role: &str, kakao_uid: &str, username: &str) -> SignedIn {
    let response = request(
        app,
        Method::POST,
        &format!("/api/auth/{role}"),
        Some(serde_json::json!({
            "kakaoUid": kakao_uid,
            "username": username,
        })),
        &[],
    )
    .await;

    let (status, _headers, body) = response_json(response).await;
    assert!(status.is_success(), "sign-in failed: {body}");

    SignedIn {
        access_token: body["data"]["accessToken"]
            .as_str()
            .expect("access token in sign-in response")
            .to_string(),
        refresh_token: body["data"]["refreshToken"]
            .as_str()
            .expect("refresh token in sign-in response")
            .to_string(),
    }
}

pub async fn student_token(app: &Router) -> String {
    sign_in(app, "student").await.access_token
}

pub async fn teacher_token(app: &Router) -> String {
    sign_in(app, "teacher").await.access_token
}

pub fn auth_header(token: &str) -> String {
    format!("Bearer {token}")
}
