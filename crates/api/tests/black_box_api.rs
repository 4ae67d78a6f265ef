use std::collections::HashMap;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

use userhub_api::AppConfig;

const JWT_SECRET: &str = "dGVzdC1zZWNyZXQtdGhhdC1pcy1sb25nLWVub3VnaC0xMjM0NTY=";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Same router as prod, seeded with the demo users, on an ephemeral port.
    /// Argon2 runs at minimum cost to keep the suite fast.
    async fn spawn() -> Self {
        let env = HashMap::from([
            ("JWT_SECRET", JWT_SECRET),
            ("SEED_DEMO_USERS", "true"),
            ("ARGON2_MEMORY_KIB", "8"),
            ("ARGON2_ITERATIONS", "1"),
        ]);
        let config = AppConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()))
            .expect("test config is valid");

        let app = userhub_api::app::build_app(&config).await.expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap()
    }

    async fn token_for(&self, email: &str, password: &str) -> String {
        let res = self.login(email, password).await;
        assert_eq!(res.status(), StatusCode::OK, "login failed for {email}");
        let body: Value = res.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    async fn admin_token(&self) -> String {
        self.token_for("manuel@gmail.com", "Manuel123.").await
    }

    async fn get(&self, path: &str, token: &str) -> reqwest::Response {
        self.client.get(self.url(path)).bearer_auth(token).send().await.unwrap()
    }

    async fn id_of(&self, admin_token: &str, email: &str) -> u64 {
        let users: Value = self.get("/api/user/users", admin_token).await.json().await.unwrap();
        users
            .as_array()
            .unwrap()
            .iter()
            .find(|u| u["email"] == email)
            .and_then(|u| u["id"].as_u64())
            .unwrap_or_else(|| panic!("{email} not listed"))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(key: EncodingKey, id: u64, role: &str, ttl: ChronoDuration) -> String {
    let now = Utc::now();
    let claims = json!({
        "sub": "someone@bcdefgh.com",
        "iat": now.timestamp(),
        "exp": (now + ttl).timestamp(),
        "id": id.to_string(),
        "email": "someone@bcdefgh.com",
        "role": role,
    });

    jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &key).expect("failed to encode jwt")
}

fn server_key() -> EncodingKey {
    EncodingKey::from_base64_secret(JWT_SECRET).unwrap()
}

async fn error_of(res: reqwest::Response) -> (StatusCode, String, String) {
    let status = res.status();
    let body: Value = res.json().await.unwrap();
    (
        status,
        body["error"].as_str().unwrap_or_default().to_string(),
        body["message"].as_str().unwrap_or_default().to_string(),
    )
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;

    let res = srv.client.get(srv.url("/api/user/me")).send().await.unwrap();
    let (status, code, _) = error_of(res).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(code, "unauthenticated");

    let res = srv
        .client
        .get(srv.url("/api/user/me"))
        .header("Authorization", "Basic bWU6cHc=")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_or_foreign_tokens_are_rejected() {
    let srv = TestServer::spawn().await;

    let expired = mint_jwt(server_key(), 3, "ADMIN", ChronoDuration::minutes(-5));
    assert_eq!(srv.get("/api/user/me", &expired).await.status(), StatusCode::UNAUTHORIZED);

    let foreign = mint_jwt(EncodingKey::from_secret(&[9u8; 32]), 3, "ADMIN", ChronoDuration::minutes(5));
    assert_eq!(srv.get("/api/user/me", &foreign).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn seeded_admin_lists_every_user() {
    let srv = TestServer::spawn().await;
    let token = srv.admin_token().await;

    let res = srv.get("/api/user/users", &token).await;
    assert_eq!(res.status(), StatusCode::OK);
    let users: Value = res.json().await.unwrap();
    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 5);

    let manuel = users.iter().find(|u| u["email"] == "manuel@gmail.com").unwrap();
    assert_eq!(manuel["role"], "ADMIN");
    assert_eq!(manuel["verified"], true);
    assert!(users.iter().all(|u| u.get("password_hash").is_none()));

    let roles: Value = srv.get("/api/user/roles", &token).await.json().await.unwrap();
    assert_eq!(roles, json!(["USER", "ADMIN"]));
}

#[tokio::test]
async fn login_failures_are_distinguished_only_by_verification() {
    let srv = TestServer::spawn().await;

    let (status, code, message) = error_of(srv.login("tom@gmail.com", "Tomito123.").await).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(code, "unverified");
    assert_eq!(message, "Your email is not verified. Check your inbox.");

    let (status, _, message) = error_of(srv.login("tomas@gmail.com", "Wrong123.").await).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(message, "Password or email invalid.");

    let (status, _, message) = error_of(srv.login("nobody@gmail.com", "Tomas123.").await).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(message, "Password or email invalid.");
}

#[tokio::test]
async fn non_admin_is_forbidden_on_admin_routes() {
    let srv = TestServer::spawn().await;
    let token = srv.token_for("tomas@gmail.com", "Tomas123.").await;

    for path in ["/api/user/users", "/api/user/roles", "/api/user/1", "/api/user/email/1", "/api/user/abc"] {
        let (status, code, _) = error_of(srv.get(path, &token).await).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{path}");
        assert_eq!(code, "forbidden");
    }

    let res = srv
        .client
        .put(srv.url("/api/user/1/role"))
        .bearer_auth(&token)
        .json(&json!({ "role": "ADMIN" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Role claim comes from the token, not the directory.
    let minted_user = mint_jwt(server_key(), 3, "USER", ChronoDuration::minutes(5));
    assert_eq!(srv.get("/api/user/users", &minted_user).await.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn register_then_admin_verifies_then_login() {
    let srv = TestServer::spawn().await;
    let new_user = json!({
        "email": "a@bcdefgh.com",
        "username": "A",
        "password": "Abcdef1!",
        "role": "USER",
    });

    let res = srv.client.post(srv.url("/api/auth/register")).json(&new_user).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body["message"],
        "User registered successfully, check your inbox to validate your email."
    );

    let res = srv.client.post(srv.url("/api/auth/register")).json(&new_user).send().await.unwrap();
    let (status, code, message) = error_of(res).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(code, "email_invalid");
    assert_eq!(message, "This email is already registered.");

    let (status, _, _) = error_of(srv.login("a@bcdefgh.com", "Abcdef1!").await).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let admin = srv.admin_token().await;
    let id = srv.id_of(&admin, "a@bcdefgh.com").await;
    let res = srv
        .client
        .put(srv.url(&format!("/api/user/{id}/role")))
        .bearer_auth(&admin)
        .json(&json!({ "verified": "true" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let token = srv.token_for("a@bcdefgh.com", "Abcdef1!").await;
    let me: Value = srv.get("/api/user/me", &token).await.json().await.unwrap();
    assert_eq!(me["id"], id);
    assert_eq!(me["email"], "a@bcdefgh.com");
    assert_eq!(me["username"], "A");
}

#[tokio::test]
async fn registration_validation_errors_are_bad_requests() {
    let srv = TestServer::spawn().await;

    let res = srv
        .client
        .post(srv.url("/api/auth/register"))
        .json(&json!({ "email": "a@bcdefgh.com", "username": "A", "password": "weak", "role": "USER" }))
        .send()
        .await
        .unwrap();
    let (status, code, _) = error_of(res).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(code, "password_invalid");

    let res = srv
        .client
        .post(srv.url("/api/auth/register"))
        .json(&json!({ "email": "a@bcdefgh.com", "password": "Abcdef1!", "role": "USER" }))
        .send()
        .await
        .unwrap();
    let (status, _, message) = error_of(res).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message, "Username cannot be null or blank.");
}

#[tokio::test]
async fn unknown_verification_token_is_not_found() {
    let srv = TestServer::spawn().await;
    let res = srv
        .client
        .get(srv.url("/api/auth/verify?token=does-not-exist"))
        .send()
        .await
        .unwrap();

    let (status, _, message) = error_of(res).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(message, "Invalid or expired token.");
}

#[tokio::test]
async fn admin_lookups_by_id() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;
    let id = srv.id_of(&admin, "manu@gmail.com").await;

    let user: Value = srv.get(&format!("/api/user/{id}"), &admin).await.json().await.unwrap();
    assert_eq!(user["username"], "Manu");

    let email: Value = srv.get(&format!("/api/user/email/{id}"), &admin).await.json().await.unwrap();
    assert_eq!(email["email"], "manu@gmail.com");

    let (status, _, message) = error_of(srv.get("/api/user/abc", &admin).await).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(message, "User with ID abc not found.");

    let (status, _, message) = error_of(srv.get("/api/user/999", &admin).await).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(message, "User with ID 999 not found.");
}

#[tokio::test]
async fn admin_purges_unverified_users_once() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;

    let res = srv.client.delete(srv.url("/api/user/unverified")).bearer_auth(&admin).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["removed"], 2);

    let res = srv.client.delete(srv.url("/api/user/unverified")).bearer_auth(&admin).send().await.unwrap();
    let (status, _, message) = error_of(res).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(message, "There are no unverified users.");

    let users: Value = srv.get("/api/user/users", &admin).await.json().await.unwrap();
    assert_eq!(users.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn profile_update_rules() {
    let srv = TestServer::spawn().await;
    let token = srv.token_for("tomas@gmail.com", "Tomas123.").await;

    let res = srv
        .client
        .put(srv.url("/api/user/me"))
        .bearer_auth(&token)
        .json(&json!({ "password": "Tomas123." }))
        .send()
        .await
        .unwrap();
    let (status, _, message) = error_of(res).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message, "New password must be different to the old one.");

    let res = srv
        .client
        .put(srv.url("/api/user/me"))
        .bearer_auth(&token)
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    let (_, _, message) = error_of(res).await;
    assert_eq!(message, "At least one value has to be modified.");

    let res = srv
        .client
        .put(srv.url("/api/user/me"))
        .bearer_auth(&token)
        .json(&json!({ "username": "Tommy" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let me: Value = res.json().await.unwrap();
    assert_eq!(me["username"], "Tommy");
}

#[tokio::test]
async fn bare_user_path_is_invalid() {
    let srv = TestServer::spawn().await;
    let token = srv.token_for("tomas@gmail.com", "Tomas123.").await;

    let (status, code, message) = error_of(srv.get("/api/user/", &token).await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(code, "invalid_path");
    assert_eq!(message, "The url provided is invalid.");
}

#[tokio::test]
async fn unreadable_bodies_get_the_json_error_shape() {
    let srv = TestServer::spawn().await;
    let login = srv.url("/api/auth/login");

    let res = srv
        .client
        .post(&login)
        .header("content-type", "application/json")
        .body("{\"email\": ")
        .send()
        .await
        .unwrap();
    let (status, code, message) = error_of(res).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(code, "malformed_body");
    assert!(!message.is_empty());

    let res = srv
        .client
        .post(&login)
        .header("content-type", "text/plain")
        .body("manuel@gmail.com")
        .send()
        .await
        .unwrap();
    let (status, code, _) = error_of(res).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(code, "unsupported_media_type");

    let res = srv.client.post(&login).json(&json!({ "email": 7 })).send().await.unwrap();
    let (status, code, _) = error_of(res).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(code, "invalid_body");

    let token = srv.admin_token().await;
    let res = srv
        .client
        .put(srv.url("/api/user/me"))
        .bearer_auth(&token)
        .header("content-type", "application/json")
        .body("not json")
        .send()
        .await
        .unwrap();
    let (status, code, _) = error_of(res).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(code, "malformed_body");
}
