use serde::{Deserialize, Serialize};

/// Outbound email notifications requested by the account workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationEvent {
    /// Sent once an address has been confirmed.
    Welcome { email: String },
    /// Sent at registration; carries the single-use verification token.
    Verification { email: String, token: String },
}

impl NotificationEvent {
    pub fn welcome(email: impl Into<String>) -> Self {
        Self::Welcome { email: email.into() }
    }

    pub fn verification(email: impl Into<String>, token: impl Into<String>) -> Self {
        Self::Verification {
            email: email.into(),
            token: token.into(),
        }
    }

    /// Broker routing key / channel name for this event.
    pub fn routing_key(&self) -> &'static str {
        match self {
            Self::Welcome { .. } => "welcome.email",
            Self::Verification { .. } => "verification.email",
        }
    }

    /// Recipient address.
    pub fn email(&self) -> &str {
        match self {
            Self::Welcome { email } | Self::Verification { email, .. } => email,
        }
    }
}
