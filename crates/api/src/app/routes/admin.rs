//! Admin routes for user management.
//!
//! The role check happens in the workflow, before any directory access; a
//! non-admin token gets 403 here, never 404.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, put},
};

use userhub_accounts::{NewUser, UpdateUserRole, UserView};
use userhub_auth::{Policy, authorize};
use userhub_core::{DomainResult, UserId};

use crate::app::{dto, errors, extract::ApiJson, services::AppServices};
use crate::context::CallerContext;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

pub fn router() -> Router {
    Router::new()
        .route("/api/user/users", get(list_users).post(create_user))
        .route("/api/user/roles", get(list_roles))
        .route("/api/user/unverified", delete(purge_unverified))
        .route("/api/user/email/:id", get(get_user_email))
        .route("/api/user/:id", get(get_user))
        .route("/api/user/:id/role", put(update_role_or_verified))
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CallerContext>,
) -> axum::response::Response {
    match services.run(move |workflow| workflow.list_all(ctx.caller())).await {
        Ok(users) => Json(users).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CallerContext>,
    ApiJson(body): ApiJson<NewUser>,
) -> axum::response::Response {
    match services.run(move |workflow| workflow.create_user(ctx.caller(), &body)).await {
        Ok(user) => (StatusCode::CREATED, Json(UserView::from(&user))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_roles(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CallerContext>,
) -> axum::response::Response {
    match services.run(move |workflow| workflow.list_roles(ctx.caller())).await {
        Ok(roles) => Json(roles).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CallerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let result = services
        .run(move |workflow| {
            let id = admin_target(&ctx, &id)?;
            workflow.get_by_id(ctx.caller(), id)
        })
        .await;

    match result {
        Ok(view) => Json(view).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_user_email(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CallerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let result = services
        .run(move |workflow| {
            let id = admin_target(&ctx, &id)?;
            workflow.get_email_by_id(ctx.caller(), id)
        })
        .await;

    match result {
        Ok(email) => Json(dto::EmailResponse { email }).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_role_or_verified(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CallerContext>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateUserRole>,
) -> axum::response::Response {
    let result = services
        .run(move |workflow| {
            let id = admin_target(&ctx, &id)?;
            workflow.admin_update_role_or_verified(ctx.caller(), id, &body)
        })
        .await;

    match result {
        Ok(view) => Json(view).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn purge_unverified(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CallerContext>,
) -> axum::response::Response {
    match services.run(move |workflow| workflow.purge_unverified(ctx.caller())).await {
        Ok(removed) => Json(dto::PurgeResponse { removed }).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// Authorize before parsing, so a non-admin never learns whether an id exists.
fn admin_target(ctx: &CallerContext, raw: &str) -> DomainResult<UserId> {
    authorize(ctx.caller(), Policy::AdminOnly)?;
    raw.parse()
}
