use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use userhub_core::DomainError;

/// Body for any 500; the detail only goes to the log.
pub const INTERNAL_MESSAGE: &str = "An unexpected error occurred, try again later.";

pub const INVALID_PATH_MESSAGE: &str = "The url provided is invalid.";

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::UserNameInvalid(msg) => json_error(StatusCode::BAD_REQUEST, "username_invalid", msg),
        DomainError::PasswordInvalid(msg) => json_error(StatusCode::BAD_REQUEST, "password_invalid", msg),
        DomainError::EmailInvalid(msg) => json_error(StatusCode::BAD_REQUEST, "email_invalid", msg),
        DomainError::RoleInvalid(msg) => json_error(StatusCode::BAD_REQUEST, "role_invalid", msg),
        DomainError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
        e @ DomainError::Unauthenticated => json_error(StatusCode::UNAUTHORIZED, "unauthenticated", e.to_string()),
        e @ DomainError::InvalidCredentials => {
            json_error(StatusCode::UNAUTHORIZED, "invalid_credentials", e.to_string())
        }
        e @ DomainError::Unverified => json_error(StatusCode::UNAUTHORIZED, "unverified", e.to_string()),
        e @ DomainError::Forbidden => json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string()),
        DomainError::Internal(detail) => {
            tracing::error!(%detail, "request failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", INTERNAL_MESSAGE)
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_error_kind() {
        let cases = [
            (DomainError::username("x"), StatusCode::BAD_REQUEST),
            (DomainError::password("x"), StatusCode::BAD_REQUEST),
            (DomainError::email("x"), StatusCode::BAD_REQUEST),
            (DomainError::role("x"), StatusCode::BAD_REQUEST),
            (DomainError::not_found("x"), StatusCode::NOT_FOUND),
            (DomainError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (DomainError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (DomainError::Unverified, StatusCode::UNAUTHORIZED),
            (DomainError::Forbidden, StatusCode::FORBIDDEN),
            (DomainError::internal("db down"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(domain_error_to_response(err).status(), status);
        }
    }
}
