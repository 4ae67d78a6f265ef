//! Self-service routes, scoped to the caller's own id.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use userhub_accounts::UpdateUser;

use crate::app::{errors, extract::ApiJson, services::AppServices};
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/api/user/", get(invalid_path))
        .route("/api/user/me", get(get_me).put(update_me))
}

pub async fn get_me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CallerContext>,
) -> axum::response::Response {
    match services.run(move |workflow| workflow.get_own_profile(ctx.caller())).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CallerContext>,
    ApiJson(body): ApiJson<UpdateUser>,
) -> axum::response::Response {
    match services.run(move |workflow| workflow.update_profile(ctx.caller(), &body)).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn invalid_path() -> axum::response::Response {
    errors::json_error(StatusCode::BAD_REQUEST, "invalid_path", errors::INVALID_PATH_MESSAGE)
}
