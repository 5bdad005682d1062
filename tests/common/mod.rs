#![allow(dead_code)]

use std::net::TcpListener;

use food_order_auth::configuration::{
    ApplicationSettings, AuthSettings, DatabaseSettings, Environment, Settings, StoreBackend,
    MIN_BCRYPT_COST,
};
use food_order_auth::startup::{build_session_service, run};
use serde_json::{json, Value};

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

pub fn test_settings() -> Settings {
    Settings {
        application: ApplicationSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: Environment::Local,
            static_dir: None,
            allowed_origin: None,
        },
        database: DatabaseSettings {
            backend: StoreBackend::Memory,
            username: "postgres".to_string(),
            password: "password".to_string(),
            port: 5432,
            host: "127.0.0.1".to_string(),
            database_name: "food_order".to_string(),
            max_connections: 1,
        },
        auth: AuthSettings {
            access_token_secret: "integration-access-secret-32-bytes-min".to_string(),
            refresh_token_secret: "integration-refresh-secret-32-bytes-min".to_string(),
            access_token_expiry: 600,
            refreshed_access_token_expiry: 120,
            refresh_token_expiry: 604_800,
            issuer: "food-order-test".to_string(),
            password_hash_cost: MIN_BCRYPT_COST,
            reissue_refresh_cookie: false,
            secure_cookies: false,
        },
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

pub async fn spawn_app_with(customise: impl FnOnce(&mut Settings)) -> TestApp {
    let mut settings = test_settings();
    customise(&mut settings);

    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let session = build_session_service(&settings)
        .await
        .expect("Failed to build session service");
    let server = run(listener, session, &settings.application).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(&format!("{}{}", self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn register(&self, username: &str, password: &str) -> reqwest::Response {
        self.post_json(
            "/auth/register",
            &json!({"username": username, "password": password}),
        )
        .await
    }

    pub async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.post_json(
            "/auth/login",
            &json!({"username": username, "password": password}),
        )
        .await
    }

    /// POST /auth/refresh, optionally presenting a `refreshToken=...` pair
    pub async fn refresh(&self, cookie: Option<&str>) -> reqwest::Response {
        let mut request = self.client.post(&format!("{}/auth/refresh", self.address));
        if let Some(cookie) = cookie {
            request = request.header(reqwest::header::COOKIE, cookie);
        }
        request.send().await.expect("Failed to execute request.")
    }

    pub async fn logout(&self, cookie: Option<&str>) -> reqwest::Response {
        let mut request = self.client.post(&format!("{}/auth/logout", self.address));
        if let Some(cookie) = cookie {
            request = request.header(reqwest::header::COOKIE, cookie);
        }
        request.send().await.expect("Failed to execute request.")
    }

    pub async fn me(&self, access_token: &str) -> reqwest::Response {
        self.client
            .get(&format!("{}/auth/me", self.address))
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

/// Full `Set-Cookie` header for the refresh token, if the response set one
pub fn refresh_set_cookie(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("refreshToken="))
        .map(str::to_string)
}

/// The `name=value` part of a `Set-Cookie` header, ready to send back
pub fn cookie_pair(set_cookie: &str) -> String {
    set_cookie
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Log a user in and return (access token, cookie pair)
pub async fn login_session(app: &TestApp, username: &str, password: &str) -> (String, String) {
    let response = app.login(username, password).await;
    assert_eq!(200, response.status().as_u16());

    let cookie = cookie_pair(&refresh_set_cookie(&response).expect("No refresh cookie"));
    let body: Value = response.json().await.expect("Failed to parse response");
    let token = body["token"].as_str().expect("No token").to_string();
    (token, cookie)
}
