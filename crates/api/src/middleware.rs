use axum::{
    extract::State,
    http::{StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};

use userhub_auth::AccessGate;

use crate::app::errors;
use crate::context::CallerContext;

#[derive(Clone)]
pub struct AuthState {
    pub gate: AccessGate,
}

/// Require a valid bearer token and attach the caller to the request.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let caller = state.gate.caller(header).map_err(|_| {
        errors::json_error(
            StatusCode::UNAUTHORIZED,
            "unauthenticated",
            "Missing or invalid bearer token.",
        )
    })?;

    req.extensions_mut().insert(CallerContext::new(caller));
    Ok(next.run(req).await)
}
