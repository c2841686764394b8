// ==================== ACCOUNT SECURITY ====================
// Password reset, password change and email change for the session's user.
// Changes to credentials require re-proving the current password first.

use crate::models::{AccountState, EmailChangeStep};
use crate::services::auth_provider::AuthProvider;
use std::sync::Arc;

pub struct AccountFlows {
    provider: Arc<dyn AuthProvider>,
    state: AccountState,
    email_step: EmailChangeStep,
}

impl AccountFlows {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self {
            provider,
            state: AccountState::Idle,
            email_step: EmailChangeStep::Initial,
        }
    }

    pub fn state(&self) -> &AccountState {
        &self.state
    }

    pub fn email_step(&self) -> EmailChangeStep {
        self.email_step
    }

    fn set(&mut self, state: AccountState) -> AccountState {
        self.state = state.clone();
        state
    }

    /// Works without a signed-in session
    pub async fn send_password_reset_email(&mut self, email: &str) -> AccountState {
        self.set(AccountState::Loading);

        match self.provider.send_password_reset_email(email).await {
            Ok(()) => {
                log::info!("📧 Password reset email sent to {}", email);
                self.set(AccountState::Success {
                    message: "Password reset email sent".to_string(),
                })
            }
            Err(e) => {
                log::warn!("❌ Password reset failed for {}: {}", email, e);
                self.set(AccountState::error(e.to_string()))
            }
        }
    }

    pub async fn change_password(&mut self, current_password: &str, new_password: &str) -> AccountState {
        let Some(email) = self.provider.current_session_email().await else {
            return self.set(AccountState::error("No user logged in"));
        };

        self.set(AccountState::Loading);

        if let Err(e) = self.provider.reauthenticate(&email, current_password).await {
            log::warn!("❌ Password change re-authentication failed for {}: {}", email, e);
            return self.set(AccountState::error(e.to_string()));
        }

        match self.provider.update_password(new_password).await {
            Ok(()) => {
                log::info!("🔑 Password changed for {}", email);
                self.set(AccountState::Success {
                    message: "Password changed successfully".to_string(),
                })
            }
            Err(e) => {
                log::warn!("❌ Password update failed for {}: {}", email, e);
                self.set(AccountState::error(e.to_string()))
            }
        }
    }

    pub async fn reauthenticate_for_email_change(&mut self, current_password: &str) -> AccountState {
        let Some(email) = self.provider.current_session_email().await else {
            return self.set(AccountState::error("No user logged in"));
        };

        self.set(AccountState::Loading);

        match self.provider.reauthenticate(&email, current_password).await {
            Ok(()) => {
                self.email_step = EmailChangeStep::Reauthenticated;
                self.set(AccountState::Idle)
            }
            Err(e) => self.set(AccountState::error(e.to_string())),
        }
    }

    /// Sends a confirmation link to the new address; the change lands once it is followed
    pub async fn update_email(&mut self, new_email: &str) -> AccountState {
        if self.provider.current_session_email().await.is_none() {
            return self.set(AccountState::error("No user logged in"));
        }
        if self.email_step != EmailChangeStep::Reauthenticated {
            return self.set(AccountState::error(
                "Confirm your current password before changing email",
            ));
        }

        self.set(AccountState::Loading);

        match self.provider.update_email_pending_verification(new_email).await {
            Ok(()) => {
                log::info!("📧 Email change verification sent to {}", new_email);
                self.email_step = EmailChangeStep::VerificationSent;
                self.set(AccountState::Idle)
            }
            Err(e) => self.set(AccountState::error(e.to_string())),
        }
    }

    pub fn reset(&mut self) {
        self.state = AccountState::Idle;
        self.email_step = EmailChangeStep::Initial;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeAuthProvider;

    const EMAIL: &str = "amy@student.edu.my";

    async fn signed_in() -> (Arc<FakeAuthProvider>, AccountFlows) {
        let provider = Arc::new(FakeAuthProvider::new());
        provider.add_account(EMAIL, "secret123", true);
        provider.sign_in(EMAIL, "secret123").await.unwrap();
        let flows = AccountFlows::new(provider.clone());
        (provider, flows)
    }

    #[tokio::test]
    async fn password_reset_reports_outcome() {
        let (provider, mut flows) = signed_in().await;

        let ok = flows.send_password_reset_email(EMAIL).await;
        assert!(matches!(ok, AccountState::Success { .. }));
        assert_eq!(provider.password_resets(), vec![EMAIL.to_string()]);

        let missing = flows.send_password_reset_email("ghost@student.edu.my").await;
        assert!(matches!(missing, AccountState::Error { .. }));
    }

    #[tokio::test]
    async fn change_password_requires_current_password() {
        let (provider, mut flows) = signed_in().await;

        let wrong = flows.change_password("wrong", "newsecret1").await;
        assert!(matches!(wrong, AccountState::Error { .. }));
        assert_eq!(provider.password_of(EMAIL).as_deref(), Some("secret123"));

        let ok = flows.change_password("secret123", "newsecret1").await;
        assert_eq!(
            ok,
            AccountState::Success {
                message: "Password changed successfully".to_string()
            }
        );
        assert_eq!(provider.password_of(EMAIL).as_deref(), Some("newsecret1"));
    }

    #[tokio::test]
    async fn change_password_without_session() {
        let provider = Arc::new(FakeAuthProvider::new());
        let mut flows = AccountFlows::new(provider);

        assert_eq!(
            flows.change_password("a", "b").await,
            AccountState::error("No user logged in")
        );
    }

    #[tokio::test]
    async fn email_change_walks_its_steps() {
        let (provider, mut flows) = signed_in().await;

        let early = flows.update_email("new@student.edu.my").await;
        assert!(matches!(early, AccountState::Error { .. }));
        assert_eq!(flows.email_step(), EmailChangeStep::Initial);

        flows.reauthenticate_for_email_change("secret123").await;
        assert_eq!(flows.email_step(), EmailChangeStep::Reauthenticated);

        let sent = flows.update_email("new@student.edu.my").await;
        assert_eq!(sent, AccountState::Idle);
        assert_eq!(flows.email_step(), EmailChangeStep::VerificationSent);
        assert_eq!(
            provider.pending_email_changes(),
            vec!["new@student.edu.my".to_string()]
        );

        flows.reset();
        assert_eq!(flows.email_step(), EmailChangeStep::Initial);
        assert_eq!(flows.state(), &AccountState::Idle);
    }
}
