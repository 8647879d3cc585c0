//! Integration tests for user and auth API handlers
mod common;

use crate::common::{create_test_app_state, create_test_user, request, send, STRONG_PASSWORD};

use axum::http::StatusCode;
use serde_json::json;
use time::macros::date;
use uuid::Uuid;

#[tokio::test]
async fn test_get_current_user_success() {
    let state = create_test_app_state();
    let (user, token) = create_test_user(&state, "ada@example.com").await;

    let (status, json) = send(
        &state,
        request("GET", "/api/user/get_current_user", Some(&token), None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], user.id.to_string());
    assert_eq!(json["email"], "ada@example.com");
    assert_eq!(json["first_name"], "Test");
    assert_eq!(json["last_name"], "User");
    assert!(json.get("password").is_none());
    assert!(json.get("password_hash").is_none());
}

#[tokio::test]
async fn test_get_current_user_without_credentials_is_forbidden() {
    let state = create_test_app_state();

    let (status, _) = send(
        &state,
        request("GET", "/api/user/get_current_user", None, None),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_get_current_user_with_bad_token_is_unauthorized() {
    let state = create_test_app_state();

    let (status, _) = send(
        &state,
        request("GET", "/api/user/get_current_user", Some("garbage"), None),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_user_success() {
    let state = create_test_app_state();

    let (status, json) = send(
        &state,
        request(
            "POST",
            "/api/user",
            None,
            Some(json!({
                "email": "Grace@Example.com",
                "first_name": "Grace",
                "last_name": "Hopper",
                "password": STRONG_PASSWORD,
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["email"], "grace@example.com");
    assert_eq!(json["first_name"], "Grace");
    assert_eq!(json["last_name"], "Hopper");
    assert!(json.get("password").is_none());

    let stored = state
        .users
        .find_by_email("grace@example.com")
        .await
        .unwrap()
        .expect("user persisted");
    assert_ne!(stored.password_hash, STRONG_PASSWORD);
}

#[tokio::test]
async fn test_create_user_with_password_equal_to_email_fails() {
    let state = create_test_app_state();
    let email = "grace.hopper@example.com";

    let (status, json) = send(
        &state,
        request(
            "POST",
            "/api/user",
            None,
            Some(json!({
                "email": email,
                "first_name": "Grace",
                "last_name": "Hopper",
                "password": email,
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let messages = json.as_array().expect("list of messages");
    assert!(messages
        .iter()
        .any(|m| m == "The password is too similar to the email."));
    assert!(state.users.find_by_email(email).await.unwrap().is_none());
}

#[tokio::test]
async fn test_create_user_without_data_fails() {
    let state = create_test_app_state();

    let (status, json) = send(&state, request("POST", "/api/user", None, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json, json!(["Forgot to enter something!"]));

    let (status, json) = send(
        &state,
        request("POST", "/api/user", None, Some(json!({ "email": "a@example.com" }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json, json!(["Forgot to enter something!"]));
}

#[tokio::test]
async fn test_create_user_with_taken_email_fails() {
    let state = create_test_app_state();
    create_test_user(&state, "taken@example.com").await;

    let (status, json) = send(
        &state,
        request(
            "POST",
            "/api/user",
            None,
            Some(json!({ "email": "TAKEN@example.com", "password": STRONG_PASSWORD })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json
        .as_array()
        .unwrap()
        .iter()
        .any(|m| m == "Email has already been taken"));
}

#[tokio::test]
async fn test_patch_user_success() {
    let state = create_test_app_state();
    let (user, token) = create_test_user(&state, "ada@example.com").await;

    let (status, json) = send(
        &state,
        request(
            "PATCH",
            &format!("/api/user/{}", user.id),
            Some(&token),
            Some(json!({
                "first_name": "Augusta",
                "last_name": "King",
                "email": "ignored@example.com",
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["first_name"], "Augusta");
    assert_eq!(json["last_name"], "King");
    assert_eq!(json["email"], "ada@example.com");
}

#[tokio::test]
async fn test_patch_user_partial_keeps_other_fields() {
    let state = create_test_app_state();
    let (user, token) = create_test_user(&state, "ada@example.com").await;

    let (status, json) = send(
        &state,
        request(
            "PATCH",
            &format!("/api/user/{}", user.id),
            Some(&token),
            Some(json!({ "last_name": "Lovelace" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["first_name"], "Test");
    assert_eq!(json["last_name"], "Lovelace");
}

#[tokio::test]
async fn test_patch_user_fail() {
    let state = create_test_app_state();
    let (user, token) = create_test_user(&state, "ada@example.com").await;
    let (other, _) = create_test_user(&state, "bob@example.com").await;
    let body = json!({ "first_name": "Mallory" });

    let (status, _) = send(
        &state,
        request(
            "PATCH",
            &format!("/api/user/{}", user.id),
            None,
            Some(body.clone()),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &state,
        request(
            "PATCH",
            &format!("/api/user/{}", other.id),
            Some(&token),
            Some(body.clone()),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &state,
        request(
            "PATCH",
            &format!("/api/user/{}", Uuid::new_v4()),
            Some(&token),
            Some(body),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let untouched = state.users.find_by_id(other.id).await.unwrap().unwrap();
    assert_eq!(untouched.first_name, "Test");
}

#[tokio::test]
async fn test_get_user_is_owner_only() {
    let state = create_test_app_state();
    let (user, token) = create_test_user(&state, "ada@example.com").await;
    let (other, _) = create_test_user(&state, "bob@example.com").await;

    let (status, json) = send(
        &state,
        request("GET", &format!("/api/user/{}", user.id), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["email"], "ada@example.com");

    let (status, _) = send(
        &state,
        request("GET", &format!("/api/user/{}", other.id), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_delete_user_success_ends_session_and_cascades() {
    let state = create_test_app_state();
    let (user, token) = create_test_user(&state, "ada@example.com").await;
    common::create_test_transaction(&state, &user, "10.00", date!(2024 - 01 - 01)).await;

    let (status, _) = send(
        &state,
        request("DELETE", &format!("/api/user/{}", user.id), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(state.users.find_by_id(user.id).await.unwrap().is_none());

    let (status, _) = send(
        &state,
        request("GET", "/api/user/get_current_user", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let left = state
        .transactions
        .list_by_user(user.id, spendtrack::transactions::range::DateRange::all())
        .await
        .unwrap();
    assert!(left.is_empty());
}

#[tokio::test]
async fn test_delete_user_fail() {
    let state = create_test_app_state();
    let (_, token) = create_test_user(&state, "ada@example.com").await;
    let (second, _) = create_test_user(&state, "bob@example.com").await;

    let (status, _) = send(
        &state,
        request("DELETE", &format!("/api/user/{}", second.id), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &state,
        request("DELETE", &format!("/api/user/{}", second.id), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &state,
        request(
            "DELETE",
            &format!("/api/user/{}", Uuid::new_v4()),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert!(state.users.find_by_id(second.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_login_and_refresh() {
    let state = create_test_app_state();

    let (status, _) = send(
        &state,
        request(
            "POST",
            "/api/user",
            None,
            Some(json!({ "email": "login@example.com", "password": STRONG_PASSWORD })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &state,
        request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "login@example.com", "password": "wrong-password" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, json) = send(
        &state,
        request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "LOGIN@example.com", "password": STRONG_PASSWORD })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user"]["email"], "login@example.com");
    let access = json["access_token"].as_str().unwrap().to_string();
    let refresh = json["refresh_token"].as_str().unwrap().to_string();

    let (status, json) = send(
        &state,
        request("GET", "/api/user/get_current_user", Some(&access), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["email"], "login@example.com");

    // A refresh token is not accepted where an access token is required.
    let (status, _) = send(
        &state,
        request("GET", "/api/user/get_current_user", Some(&refresh), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, json) = send(
        &state,
        request(
            "POST",
            "/api/auth/refresh",
            None,
            Some(json!({ "refresh_token": refresh })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["access_token"].as_str().is_some());

    let (status, _) = send(
        &state,
        request(
            "POST",
            "/api/auth/refresh",
            None,
            Some(json!({ "refresh_token": access })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health() {
    let state = create_test_app_state();
    let app = spendtrack::app::build_app(state);
    let response = tower::ServiceExt::oneshot(
        app,
        axum::http::Request::builder()
            .uri("/api/health")
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_patch_user_without_body_returns_unchanged_user() {
    let state = create_test_app_state();
    let (user, token) = create_test_user(&state, "ada@example.com").await;

    let (status, json) = send(
        &state,
        request("PATCH", &format!("/api/user/{}", user.id), Some(&token), None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["first_name"], "Test");
    assert_eq!(json["last_name"], "User");
    assert_eq!(json["email"], "ada@example.com");
}

#[tokio::test]
async fn test_create_user_with_mail_domain_in_password() {
    let state = create_test_app_state();

    let (status, json) = send(
        &state,
        request(
            "POST",
            "/api/user",
            None,
            Some(json!({ "email": "alice@gmail.com", "password": "Gmail-Zq8!vLx2kT" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["email"], "alice@gmail.com");
}

#[tokio::test]
async fn test_get_current_user_with_trailing_slash() {
    let state = create_test_app_state();
    let (_, token) = create_test_user(&state, "ada@example.com").await;

    let (status, json) = send(
        &state,
        request("GET", "/api/user/get_current_user/", Some(&token), None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["email"], "ada@example.com");
}

#[tokio::test]
async fn test_api_docs_require_authentication() {
    let state = create_test_app_state();
    let (_, token) = create_test_user(&state, "ada@example.com").await;

    for uri in ["/swagger/", "/redoc/", "/api-docs/openapi.json"] {
        let (status, _) = send(&state, request("GET", uri, None, None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");

        let (status, _) = send(&state, request("GET", uri, Some(&token), None)).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
    }

    let (_, doc) = send(
        &state,
        request("GET", "/api-docs/openapi.json", Some(&token), None),
    )
    .await;
    assert!(doc["paths"]["/api/transaction/view_sum_of_transactions_by_date"].is_object());
}
