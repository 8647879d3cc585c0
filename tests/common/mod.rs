#![allow(dead_code)]

use axum::{
    body::Body,
    extract::FromRef,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::Value;
use time::Date;
use tower::ServiceExt;

use spendtrack::{
    app::build_app,
    auth::JwtKeys,
    config::{AppConfig, JwtConfig},
    repo::{NewTransaction, NewUser, Transaction, User},
    state::AppState,
};

pub const STRONG_PASSWORD: &str = "vX9#qL2!mT7pR4@w";

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: None,
        jwt: JwtConfig {
            secret: "test-secret".into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            ttl_minutes: 5,
            refresh_ttl_minutes: 60,
        },
        host: "127.0.0.1".into(),
        port: 0,
    }
}

pub fn create_test_app_state() -> AppState {
    AppState::in_memory(test_config())
}

/// Insert a user directly, skipping password hashing, and mint an access token for them.
pub async fn create_test_user(state: &AppState, email: &str) -> (User, String) {
    let user = state
        .users
        .create(NewUser {
            email: email.into(),
            first_name: "Test".into(),
            last_name: "User".into(),
            password_hash: "unused".into(),
        })
        .await
        .expect("create user");
    let token = JwtKeys::from_ref(state)
        .sign_access(user.id)
        .expect("sign access token");
    (user, token)
}

pub async fn create_test_transaction(
    state: &AppState,
    user: &User,
    amount: &str,
    date: Date,
) -> Transaction {
    state
        .transactions
        .create(NewTransaction {
            user_id: user.id,
            amount: amount.parse::<Decimal>().expect("valid amount"),
            date,
        })
        .await
        .expect("create transaction")
}

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Send one request through a fresh router and decode the JSON body (`Value::Null` when empty).
pub async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
    let app: Router = build_app(state.clone());
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, json)
}
