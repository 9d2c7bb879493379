mod common;

use axum::http::StatusCode;

use classroom_backend::auth::issue_token_pair;
use common::app::spawn_test_app;
use common::auth::sign_in_as;
use common::http::{assert_json_error, assert_status_ok_json, get_json};

#[tokio::test]
async fn it_user_me_returns_profile() {
    let app = spawn_test_app().await;
    let tokens = sign_in_as(&app.app, "student", "kakao-me", "Lee").await;

    let (status, body) = get_json(&app.app, "/api/user/me", &tokens.access_token).await;
    assert_status_ok_json(status, &body);
    let data = &body["data"];
    assert!(data["id"].is_string());
    assert_eq!(data["username"], "Lee");
    assert_eq!(data["role"], "student");
    assert!(data["createdAt"].is_string());
    assert!(data.get("kakaoUid").is_none());
}

#[tokio::test]
async fn it_user_deleted_user_is_not_found() {
    let app = spawn_test_app().await;

    // A valid token for a user id that was never stored.
    let tokens = issue_token_pair("ghost-user", &app.config.jwt).expect("sign");
    let (status, body) = get_json(&app.app, "/api/user/me", &tokens.access_token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_json_error(&body, "NOT_FOUND");
}
