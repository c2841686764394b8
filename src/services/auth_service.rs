// ==================== AUTH STATE MACHINE ====================
// Drives sign-up, login and mandatory email verification for one client
// session. Every outcome, including provider failures, lands in the published
// AuthState; nothing here returns an error to the caller.

use crate::jobs::cooldown_timer::{Cooldown, CountdownTask};
use crate::models::AuthState;
use crate::services::auth_provider::{AuthProvider, ProviderError};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{Duration, Instant};

pub const RATE_LIMITED_MESSAGE: &str = "Too many requests. Try again later.";
pub const RESEND_THROTTLED_MESSAGE: &str = "Please wait before resending the verification email.";
pub const NOT_VERIFIED_MESSAGE: &str = "Email not verified yet.";
pub const LOGIN_SUCCESS_MESSAGE: &str = "Login successful";
pub const VERIFICATION_REQUIRED_MESSAGE: &str = "Email verification has not been confirmed.";

pub struct AuthMachine {
    provider: Arc<dyn AuthProvider>,
    state: watch::Sender<AuthState>,
    cooldown: Cooldown,
    countdown: CountdownTask,
    // Success is only reachable after check_if_email_verified has seen a verified account
    verified_seen: bool,
}

impl AuthMachine {
    pub fn new(provider: Arc<dyn AuthProvider>, resend_cooldown: Duration) -> Self {
        let (state, _) = watch::channel(AuthState::Idle);
        Self {
            provider,
            state,
            cooldown: Cooldown::new(resend_cooldown),
            countdown: CountdownTask::new(),
            verified_seen: false,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Milliseconds until another verification email may be requested
    pub fn remaining_cooldown(&self) -> u64 {
        self.countdown.remaining_ms()
    }

    /// Email of the account the provider session is signed in as
    pub async fn session_email(&self) -> Option<String> {
        self.provider.current_session_email().await
    }

    /// Publishes the remaining cooldown once per second, then 0
    pub fn cooldown_receiver(&self) -> watch::Receiver<u64> {
        self.countdown.subscribe()
    }

    fn emit(&self, state: AuthState) -> AuthState {
        log::debug!("🔁 Auth state -> {:?}", state);
        self.state.send_replace(state.clone());
        state
    }

    pub async fn register(&mut self, email: &str, password: &str) -> AuthState {
        self.emit(AuthState::Loading);
        self.verified_seen = false;

        match self.provider.create_account(email, password).await {
            Ok(()) => {
                log::info!("✅ Account created: {}", email);
                self.emit(AuthState::RequiresVerification {
                    email: email.to_string(),
                });
                self.send_verification_email(false).await;
                self.state()
            }
            Err(e) => {
                log::warn!("❌ Registration failed: {} - {}", email, e);
                self.emit(AuthState::error(e.to_string()))
            }
        }
    }

    /// Signs in and always routes through verification, even for verified accounts
    pub async fn login(&mut self, email: &str, password: &str) -> AuthState {
        self.emit(AuthState::Loading);
        self.verified_seen = false;

        if let Err(e) = self.provider.sign_in(email, password).await {
            log::warn!("❌ Login failed: {} - {}", email, e);
            return self.emit(AuthState::error(e.to_string()));
        }

        let Some(session_email) = self.provider.current_session_email().await else {
            return self.emit(AuthState::error("User not found"));
        };

        self.emit(AuthState::RequiresVerification {
            email: session_email,
        });
        self.send_verification_email(false).await;
        self.state()
    }

    pub async fn confirm_login_after_verification(&mut self, email: &str, password: &str) -> AuthState {
        if !self.verified_seen {
            return self.emit(AuthState::error(VERIFICATION_REQUIRED_MESSAGE));
        }

        self.emit(AuthState::Loading);

        // The earlier session may have been invalidated while the user was in their inbox
        if let Err(e) = self.provider.reauthenticate(email, password).await {
            log::warn!("❌ Re-authentication after verification failed: {} - {}", email, e);
            return self.emit(AuthState::error(e.to_string()));
        }

        if self.provider.current_session_email().await.is_none() {
            return self.emit(AuthState::error("User not found after verification"));
        }

        match self.provider.reload().await {
            Ok(_) => {
                log::info!("✅ Login confirmed: {}", email);
                self.emit(AuthState::success(LOGIN_SUCCESS_MESSAGE))
            }
            Err(e) => {
                log::warn!("❌ Reload after verification failed: {}", e);
                self.emit(AuthState::error("Failed to verify user status"))
            }
        }
    }

    /// User-initiated resend; always reports its outcome
    pub async fn resend_verification_email(&mut self) -> AuthState {
        self.send_verification_email(true).await;
        self.state()
    }

    async fn send_verification_email(&mut self, notify: bool) {
        let Some(email) = self.provider.current_session_email().await else {
            if notify {
                self.emit(AuthState::error("User not signed in"));
            }
            return;
        };

        let now = Instant::now();
        if self.cooldown.is_active(now) {
            log::debug!(
                "⏳ Verification email throttled for {} ({}ms left)",
                email,
                self.cooldown.remaining(now).as_millis()
            );
            if notify {
                self.emit(AuthState::error(RESEND_THROTTLED_MESSAGE));
            }
            return;
        }

        let end = self.cooldown.start(now);
        self.countdown.restart(end);

        match self.provider.send_verification_email().await {
            Ok(()) => {
                log::info!("📧 Verification email sent to {}", email);
                if notify {
                    self.emit(AuthState::RequiresVerification { email });
                }
            }
            Err(ProviderError::RateLimited(msg)) => {
                log::warn!("🚫 Verification email rate limited for {}: {}", email, msg);
                self.emit(AuthState::error(RATE_LIMITED_MESSAGE));
            }
            Err(e) => {
                log::warn!("❌ Failed to send verification email to {}: {}", email, e);
                if notify {
                    self.emit(AuthState::error(e.to_string()));
                }
            }
        }
    }

    pub async fn check_if_email_verified(&mut self) -> AuthState {
        let Some(email) = self.provider.current_session_email().await else {
            return self.emit(AuthState::error("No user to check"));
        };

        self.emit(AuthState::Loading);

        match self.provider.reload().await {
            Ok(true) => {
                self.verified_seen = true;
                log::info!("✅ Email verified: {}", email);
                self.emit(AuthState::Verified { email })
            }
            Ok(false) => self.emit(AuthState::error(NOT_VERIFIED_MESSAGE)),
            Err(e) => {
                log::warn!("❌ Failed to reload user {}: {}", email, e);
                self.emit(AuthState::error(e.to_string()))
            }
        }
    }

    pub async fn sign_out(&mut self) -> AuthState {
        self.provider.sign_out().await;
        self.verified_seen = false;
        self.emit(AuthState::Idle)
    }
}
