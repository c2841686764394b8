// ==================== REGISTRATION FLOW ====================
// Scan card -> create account -> verify email -> pair NFC tag -> persist.
// Steps run strictly in that order; nothing is rolled back if a later step fails.

use crate::models::{AuthState, ScannedData, User};
use crate::services::auth_service::AuthMachine;
use crate::services::card_parser;
use crate::services::user_service::{StoreError, UserRepository};
use serde::Serialize;

/// Tag id used while pairing is simulated
pub const SIMULATED_NFC_UID: &str = "04:A3:B2:C1:89:45:80";

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStep {
    ScanCard,
    Credentials,
    AwaitingVerification,
    NfcPairing,
    Complete,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("Registration step {actual:?} cannot accept this; expected {expected:?}")]
    OutOfOrder {
        expected: RegistrationStep,
        actual: RegistrationStep,
    },
    #[error("Both the front and the back of the card must be captured")]
    MissingCapture,
    #[error("Could not read the Student ID or IC number from the card. Please scan again.")]
    UnreadableCard,
    #[error("Could not read all required details from the card ({}). Please try again in a well-lit area.", .0.join(", "))]
    IncompleteScan(Vec<&'static str>),
    #[error("{0}")]
    InvalidCredentials(&'static str),
    #[error("{0}")]
    Auth(String),
    #[error("Failed to hash password: {0}")]
    PasswordHash(String),
    #[error("Failed to save user: {0}")]
    Persistence(#[from] StoreError),
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationSnapshot {
    pub step: RegistrationStep,
    pub scanned: Option<ScannedData>,
    pub email: Option<String>,
}

pub struct RegistrationFlow {
    step: RegistrationStep,
    scanned: Option<ScannedData>,
    email: Option<String>,
    password: Option<String>,
    password_hash_cost: u32,
}

impl RegistrationFlow {
    pub fn new(password_hash_cost: u32) -> Self {
        Self {
            step: RegistrationStep::ScanCard,
            scanned: None,
            email: None,
            password: None,
            password_hash_cost,
        }
    }

    pub fn step(&self) -> RegistrationStep {
        self.step
    }

    pub fn snapshot(&self) -> RegistrationSnapshot {
        RegistrationSnapshot {
            step: self.step,
            scanned: self.scanned.clone(),
            email: self.email.clone(),
        }
    }

    fn expect_step(&self, expected: RegistrationStep) -> Result<(), RegistrationError> {
        if self.step != expected {
            return Err(RegistrationError::OutOfOrder {
                expected,
                actual: self.step,
            });
        }
        Ok(())
    }

    /// Parses the front-of-card text; both capture references are required
    pub fn submit_scan(
        &mut self,
        front_text: &str,
        front_image: Option<String>,
        back_image: Option<String>,
    ) -> Result<ScannedData, RegistrationError> {
        self.expect_step(RegistrationStep::ScanCard)?;

        let (front_image, back_image) = match (front_image, back_image) {
            (Some(front), Some(back)) if !front.trim().is_empty() && !back.trim().is_empty() => {
                (front, back)
            }
            _ => return Err(RegistrationError::MissingCapture),
        };

        let scanned = card_parser::parse_with_images(front_text, Some(front_image), None)
            .ok_or(RegistrationError::UnreadableCard)?
            .with_back_image(back_image);

        if !scanned.is_complete() {
            return Err(RegistrationError::IncompleteScan(scanned.missing_fields()));
        }

        log::info!("🪪 Card scanned for student {}", scanned.student_id);
        self.scanned = Some(scanned.clone());
        self.step = RegistrationStep::Credentials;
        Ok(scanned)
    }

    pub async fn submit_credentials(
        &mut self,
        auth: &mut AuthMachine,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<AuthState, RegistrationError> {
        self.expect_step(RegistrationStep::Credentials)?;
        validate_credentials(email, password, confirm_password)?;

        let email = email.trim();
        match auth.register(email, password).await {
            state @ AuthState::RequiresVerification { .. } => {
                self.await_verification(email, password);
                Ok(state)
            }
            // The account exists even when the verification send was refused;
            // the error is passed on and the user resends once the throttle clears
            state @ AuthState::Error { .. }
                if auth.session_email().await.as_deref() == Some(email) =>
            {
                log::warn!("⚠️ Account {} created but verification email not sent: {:?}", email, state);
                self.await_verification(email, password);
                Ok(state)
            }
            AuthState::Error { message } => Err(RegistrationError::Auth(message)),
            other => Err(RegistrationError::Auth(format!(
                "Unexpected auth state after sign-up: {:?}",
                other
            ))),
        }
    }

    fn await_verification(&mut self, email: &str, password: &str) {
        self.email = Some(email.to_string());
        self.password = Some(password.to_string());
        self.step = RegistrationStep::AwaitingVerification;
    }

    /// Advances only when the provider reports the email as verified
    pub async fn confirm_verification(&mut self, auth: &mut AuthMachine) -> Result<AuthState, RegistrationError> {
        self.expect_step(RegistrationStep::AwaitingVerification)?;

        let state = auth.check_if_email_verified().await;
        if let AuthState::Verified { .. } = state {
            self.step = RegistrationStep::NfcPairing;
        }
        Ok(state)
    }

    /// Builds and persists the user record, then ends the sign-up session
    pub async fn complete(
        &mut self,
        auth: &mut AuthMachine,
        users: &UserRepository,
        nfc_uid: Option<&str>,
    ) -> Result<User, RegistrationError> {
        self.expect_step(RegistrationStep::NfcPairing)?;

        let nfc_uid = nfc_uid
            .map(str::trim)
            .filter(|uid| !uid.is_empty())
            .unwrap_or(SIMULATED_NFC_UID);

        let (scanned, email, password) = match (&self.scanned, &self.email, &self.password) {
            (Some(scanned), Some(email), Some(password)) => (scanned, email, password),
            _ => {
                return Err(RegistrationError::OutOfOrder {
                    expected: RegistrationStep::ScanCard,
                    actual: self.step,
                })
            }
        };

        let password_hash = bcrypt::hash(password, self.password_hash_cost)
            .map_err(|e| RegistrationError::PasswordHash(e.to_string()))?;

        let user = User {
            student_id: scanned.student_id.clone(),
            email: email.clone(),
            password_hash,
            full_name: scanned.full_name.clone(),
            identification_number: scanned.identification_number.clone(),
            major: scanned.major.clone(),
            intake: scanned.intake.clone(),
            nfc_uid: Some(nfc_uid.to_string()),
            is_verified: true,
            created_at: None,
            updated_at: None,
        };

        users.save_user(&user).await?;

        // Registration does not leave the user logged in
        auth.sign_out().await;

        log::info!("✅ Registration complete: {} ({})", user.email, user.student_id);
        self.scanned = None;
        self.password = None;
        self.step = RegistrationStep::Complete;
        Ok(user)
    }

    pub fn reset(&mut self) {
        self.step = RegistrationStep::ScanCard;
        self.scanned = None;
        self.email = None;
        self.password = None;
    }
}

fn validate_credentials(email: &str, password: &str, confirm_password: &str) -> Result<(), RegistrationError> {
    if email.trim().is_empty() || password.is_empty() || confirm_password.is_empty() {
        return Err(RegistrationError::InvalidCredentials("All fields are required"));
    }
    if !email.contains('@') {
        return Err(RegistrationError::InvalidCredentials("Enter a valid email address"));
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(RegistrationError::InvalidCredentials(
            "Password must be at least 6 characters",
        ));
    }
    if password != confirm_password {
        return Err(RegistrationError::InvalidCredentials("Passwords do not match"));
    }
    Ok(())
}
