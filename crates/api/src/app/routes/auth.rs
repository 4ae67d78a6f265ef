//! Public account routes: login, registration, email verification.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use userhub_accounts::NewUser;

use crate::app::{dto, errors, extract::ApiJson, services::AppServices};

pub fn router() -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/auth/verify", get(verify_email))
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<dto::LoginRequest>,
) -> axum::response::Response {
    match services.run(move |workflow| workflow.login(&body.email, &body.password)).await {
        Ok(token) => Json(dto::TokenResponse { token }).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<NewUser>,
) -> axum::response::Response {
    match services.run(move |workflow| workflow.register(&body)).await {
        Ok(_) => (StatusCode::CREATED, Json(dto::REGISTERED)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn verify_email(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::VerifyQuery>,
) -> axum::response::Response {
    match services.run(move |workflow| workflow.verify_email(&query.token)).await {
        Ok(_) => Json(dto::VERIFIED).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
