use serde::{Deserialize, Serialize};

// -------------------------
// Request DTOs
// -------------------------

/// Absent fields are treated as empty, which fails as bad credentials.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct VerifyQuery {
    #[serde(default)]
    pub token: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct EmailResponse {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct PurgeResponse {
    pub removed: u64,
}

pub const REGISTERED: MessageResponse = MessageResponse {
    message: "User registered successfully, check your inbox to validate your email.",
};

pub const VERIFIED: MessageResponse = MessageResponse {
    message: "Email verified successfully! You can now log in!",
};
