// SPDX-License-Identifier: MIT

//! HTTP-level auth tests: protected-route guarding, cookie handling,
//! the response envelope, and the register/login/refresh flows.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;

mod common;

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn set_cookies(response: &axum::response::Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_protected_route_without_token() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/users/current-user")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["statusCode"], 401);
    assert!(json["data"].is_null());
}

#[tokio::test]
async fn test_protected_route_with_invalid_token() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/users/current-user")
                .header(header::AUTHORIZATION, "Bearer invalid.token.here")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_with_valid_bearer_token() {
    let (app, state) = common::create_test_app();
    let user = common::register_test_user(&state, "alice", "alice@example.com", "pw").await;
    let token = state.tokens.issue_access(&user.id).unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/users/current-user")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["username"], "alice");
    assert!(json["data"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_access_token_in_cookie_is_accepted() {
    let (app, state) = common::create_test_app();
    let user = common::register_test_user(&state, "alice", "alice@example.com", "pw").await;
    let token = state.tokens.issue_access(&user.id).unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/users/current-user")
                .header(header::COOKIE, format!("accessToken={}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_token_rejected_as_access_token() {
    let (app, state) = common::create_test_app();
    let user = common::register_test_user(&state, "alice", "alice@example.com", "pw").await;
    let refresh = state.tokens.issue_refresh(&user.id).unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/users/current-user")
                .header(header::AUTHORIZATION, format!("Bearer {}", refresh))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_sets_httponly_cookies() {
    let (app, state) = common::create_test_app();
    common::register_test_user(&state, "alice", "alice@example.com", "pw").await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/users/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::json!({"username": "alice", "password": "pw"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookies(&response);
    let access = cookies
        .iter()
        .find(|c| c.starts_with("accessToken="))
        .expect("accessToken cookie");
    let refresh = cookies
        .iter()
        .find(|c| c.starts_with("refreshToken="))
        .expect("refreshToken cookie");

    for cookie in [access, refresh] {
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("Path=/"));
    }

    let json = body_json(response).await;
    assert_eq!(json["data"]["user"]["username"], "alice");
    assert!(json["data"]["accessToken"].is_string());
    assert!(json["data"]["refreshToken"].is_string());
}

#[tokio::test]
async fn test_login_unknown_user_is_404_envelope() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/users/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::json!({"username": "ghost", "password": "pw"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["statusCode"], 404);
    assert!(json["errors"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_refresh_via_cookie_rotates_pair() {
    let (app, state) = common::create_test_app();
    common::register_test_user(&state, "alice", "alice@example.com", "pw").await;
    let (_, pair) = state.sessions.login("alice", "pw").await.unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/users/refresh-token")
                .header(
                    header::COOKIE,
                    format!("refreshToken={}", pair.refresh_token),
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    assert!(cookies.iter().any(|c| c.starts_with("accessToken=")));

    let json = body_json(response).await;
    let new_refresh = json["data"]["refreshToken"].as_str().unwrap().to_string();
    assert_ne!(new_refresh, pair.refresh_token);

    // The old token was rotated away and is now rejected.
    let reuse = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/users/refresh-token")
                .header(
                    header::COOKIE,
                    format!("refreshToken={}", pair.refresh_token),
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(reuse.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_token_accepted_in_body() {
    let (app, state) = common::create_test_app();
    common::register_test_user(&state, "alice", "alice@example.com", "pw").await;
    let (_, pair) = state.sessions.login("alice", "pw").await.unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/users/refresh-token")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::json!({"refreshToken": pair.refresh_token}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_without_token_unauthorized() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/users/refresh-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_clears_cookies() {
    let (app, state) = common::create_test_app();
    let user = common::register_test_user(&state, "alice", "alice@example.com", "pw").await;
    state.sessions.login("alice", "pw").await.unwrap();
    let access = state.tokens.issue_access(&user.id).unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/users/logout")
                .header(header::AUTHORIZATION, format!("Bearer {}", access))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    // Removal cookies are emitted for both names.
    let cookies = set_cookies(&response);
    assert!(cookies.iter().any(|c| c.starts_with("accessToken=")));
    assert!(cookies.iter().any(|c| c.starts_with("refreshToken=")));

    // And the stored refresh token is gone.
    let stored = state.store.get_user(&user.id).await.unwrap().unwrap();
    assert!(stored.refresh_token.is_none());
}

#[tokio::test]
async fn test_register_over_http_multipart() {
    let (app, _) = common::create_test_app();

    let boundary = "test-boundary-7d93b";
    let mut body = String::new();
    for (name, value) in [
        ("fullName", "Alice Doe"),
        ("username", "Alice"),
        ("email", "alice@example.com"),
        ("password", "s3cret"),
    ] {
        body.push_str(&format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"avatar\"; filename=\"a.png\"\r\n\
         Content-Type: image/png\r\n\r\nfake png bytes\r\n--{boundary}--\r\n"
    ));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/users/register")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", boundary),
                )
                .body(Body::from(body.clone()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["username"], "alice");
    assert!(json["data"]["avatarUrl"].as_str().unwrap().len() > 0);

    // Same payload again conflicts.
    let duplicate = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/users/register")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", boundary),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(duplicate.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_without_avatar_is_400() {
    let (app, _) = common::create_test_app();

    let boundary = "test-boundary-7d93b";
    let mut body = String::new();
    for (name, value) in [
        ("fullName", "Alice Doe"),
        ("username", "alice"),
        ("email", "alice@example.com"),
        ("password", "s3cret"),
    ] {
        body.push_str(&format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!("--{boundary}--\r\n"));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/users/register")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", boundary),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_token_for_deleted_user_is_rejected() {
    let (app, state) = common::create_test_app();
    // Token subject that never existed in the store.
    let token = state.tokens.issue_access("no-such-user").unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/users/current-user")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_channel_profile_over_http() {
    let (app, state) = common::create_test_app();
    let viewer = common::register_test_user(&state, "viewer", "v@example.com", "pw").await;
    let channel = common::register_test_user(&state, "channel", "c@example.com", "pw").await;
    state
        .channels
        .toggle_subscription(&viewer.id, &channel.id)
        .await
        .unwrap();

    let token = state.tokens.issue_access(&viewer.id).unwrap();
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/users/c/channel")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["subscribersCount"], 1);
    assert_eq!(json["data"]["isSubscribed"], true);
}

#[tokio::test]
async fn test_health_is_public() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
