use serde::{Deserialize, Serialize};

/// Session-level authentication state published by the auth state machine
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, utoipa::ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AuthState {
    Idle,
    Loading,
    Success { message: String },
    Error { message: String },
    RequiresVerification { email: String },
    Verified { email: String },
}

impl AuthState {
    pub fn error(message: impl Into<String>) -> Self {
        AuthState::Error { message: message.into() }
    }

    pub fn success(message: impl Into<String>) -> Self {
        AuthState::Success { message: message.into() }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, AuthState::Error { .. })
    }
}

impl Default for AuthState {
    fn default() -> Self {
        AuthState::Idle
    }
}

/// State of the account security flows (password reset, password and email change)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, utoipa::ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AccountState {
    Idle,
    Loading,
    Success { message: String },
    Error { message: String },
}

impl AccountState {
    pub fn error(message: impl Into<String>) -> Self {
        AccountState::Error { message: message.into() }
    }
}

/// Which form the email change screen should show next
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EmailChangeStep {
    Initial,
    Reauthenticated,
    VerificationSent,
}
