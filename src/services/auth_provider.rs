use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The provider refused the operation; the message is shown to the user as-is
    #[error("{0}")]
    Rejected(String),
    /// The provider is throttling this client or device
    #[error("{0}")]
    RateLimited(String),
    #[error("No signed-in user")]
    NoSession,
    #[error("Auth provider unreachable: {0}")]
    Transport(String),
}

impl ProviderError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ProviderError::RateLimited(_))
    }
}

/// Email/password identity backend, scoped to one signed-in session.
///
/// Every call is a network round trip; callers await each one before acting
/// on its outcome.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn create_account(&self, email: &str, password: &str) -> Result<(), ProviderError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<(), ProviderError>;

    async fn current_session_email(&self) -> Option<String>;

    async fn reauthenticate(&self, email: &str, password: &str) -> Result<(), ProviderError>;

    /// Refreshes the signed-in user and returns the fresh email-verified flag
    async fn reload(&self) -> Result<bool, ProviderError>;

    /// Last known verification flag, without a round trip
    async fn is_email_verified(&self) -> bool;

    async fn send_verification_email(&self) -> Result<(), ProviderError>;

    async fn send_password_reset_email(&self, email: &str) -> Result<(), ProviderError>;

    async fn update_password(&self, new_password: &str) -> Result<(), ProviderError>;

    /// Sends a confirmation link to `new_email`; the change applies once it is followed
    async fn update_email_pending_verification(&self, new_email: &str) -> Result<(), ProviderError>;

    async fn sign_out(&self);
}

/// Builds a fresh, signed-out provider for each client session
pub trait AuthProviderFactory: Send + Sync {
    fn create(&self) -> Arc<dyn AuthProvider>;
}
