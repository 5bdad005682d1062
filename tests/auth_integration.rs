mod common;

use common::{login_session, refresh_set_cookie, spawn_app};
use serde_json::{json, Value};

#[tokio::test]
async fn register_returns_201_with_token_and_default_role() {
    let app = spawn_app().await;

    let response = app.register("A", "secret1").await;

    assert_eq!(201, response.status().as_u16());
    let set_cookie = refresh_set_cookie(&response).expect("No refresh cookie");
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Strict"));
    assert!(set_cookie.contains("Path=/"));
    assert!(set_cookie.contains("Max-Age=604800"));
    assert!(!set_cookie.contains("Secure"));

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "User registered and logged in successfully");
    assert!(body["token"].as_str().map_or(false, |t| !t.is_empty()));
    assert_eq!(body["user"]["username"], "A");
    assert_eq!(body["user"]["role"], "user");
    assert!(body["user"]["_id"].is_string());
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn register_returns_400_when_fields_are_missing() {
    let app = spawn_app().await;
    let cases = vec![
        (json!({"password": "secret1"}), "missing username"),
        (json!({"username": "A"}), "missing password"),
        (json!({}), "missing both"),
        (json!({"username": "", "password": ""}), "empty both"),
    ];

    for (body, description) in cases {
        let response = app.post_json("/auth/register", &body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "register did not fail with 400 for: {}",
            description
        );
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["message"], "username and password are required");
    }
}

#[tokio::test]
async fn register_returns_400_for_malformed_json() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(&format!("{}/auth/register", &app.address))
        .header("Content-Type", "application/json")
        .body("{\"username\": ")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn register_returns_409_for_taken_username() {
    let app = spawn_app().await;
    assert_eq!(201, app.register("alice", "secret1").await.status().as_u16());

    let response = app.register("alice", "another").await;

    assert_eq!(409, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Username is already taken");
}

#[tokio::test]
async fn login_returns_200_with_token_and_refresh_cookie() {
    let app = spawn_app().await;
    app.register("A", "secret1").await;

    let response = app.login("A", "secret1").await;

    assert_eq!(200, response.status().as_u16());
    assert!(refresh_set_cookie(&response).is_some());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Successful login");
    assert_eq!(body["user"]["username"], "A");
    assert!(body["token"].is_string());
}

#[tokio::test]
async fn login_failures_share_one_message() {
    let app = spawn_app().await;
    app.register("A", "secret1").await;

    let wrong_password = app.login("A", "wrong").await;
    let unknown_user = app.login("nobody", "secret1").await;

    assert_eq!(401, wrong_password.status().as_u16());
    assert_eq!(401, unknown_user.status().as_u16());
    assert!(refresh_set_cookie(&wrong_password).is_none());

    let a: Value = wrong_password.json().await.unwrap();
    let b: Value = unknown_user.json().await.unwrap();
    assert_eq!(a["message"], "Invalid credentials");
    assert_eq!(a["message"], b["message"]);
    assert_eq!(a["code"], b["code"]);
}

#[tokio::test]
async fn repeated_logins_issue_distinct_sessions() {
    let app = spawn_app().await;
    app.register("A", "secret1").await;

    let (token_one, cookie_one) = login_session(&app, "A", "secret1").await;
    let (token_two, cookie_two) = login_session(&app, "A", "secret1").await;

    assert_ne!(token_one, token_two);
    assert_ne!(cookie_one, cookie_two);

    // Both sessions refresh independently
    assert_eq!(200, app.refresh(Some(&cookie_one)).await.status().as_u16());
    assert_eq!(200, app.refresh(Some(&cookie_two)).await.status().as_u16());
}

#[tokio::test]
async fn me_returns_identity_for_valid_token() {
    let app = spawn_app().await;
    let response = app.register("A", "secret1").await;
    let body: Value = response.json().await.unwrap();
    let token = body["token"].as_str().unwrap();

    let response = app.me(token).await;

    assert_eq!(200, response.status().as_u16());
    let me: Value = response.json().await.unwrap();
    assert_eq!(me["username"], "A");
    assert_eq!(me["_id"], body["user"]["_id"]);
}

#[tokio::test]
async fn me_rejects_missing_or_invalid_authorization() {
    let app = spawn_app().await;
    let url = format!("{}/auth/me", &app.address);

    let no_header = app.client.get(&url).send().await.unwrap();
    assert_eq!(401, no_header.status().as_u16());
    let body: Value = no_header.json().await.unwrap();
    assert_eq!(body["message"], "Access denied. No token provided");

    let bad_headers = vec!["Basic abc", "Bearer", "Bearer ", "token-without-scheme"];
    for header in bad_headers {
        let response = app
            .client
            .get(&url)
            .header("Authorization", header)
            .send()
            .await
            .unwrap();
        assert_eq!(401, response.status().as_u16(), "accepted header: {}", header);
    }

    let invalid = app.me("not.a.jwt").await;
    assert_eq!(401, invalid.status().as_u16());
    let body: Value = invalid.json().await.unwrap();
    assert_eq!(body["message"], "Invalid or expired token");
}

#[tokio::test]
async fn me_rejects_refresh_token_used_as_bearer() {
    let app = spawn_app().await;
    app.register("A", "secret1").await;
    let (_, cookie) = login_session(&app, "A", "secret1").await;
    let refresh_token = cookie.trim_start_matches("refreshToken=");

    let response = app.me(refresh_token).await;

    assert_eq!(401, response.status().as_u16());
}
