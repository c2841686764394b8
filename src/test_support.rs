// In-memory stand-ins for the auth provider and the document store

use crate::models::{User, UserField, UserPatch};
use crate::services::auth_provider::{AuthProvider, AuthProviderFactory, ProviderError};
use crate::services::session_service::{SessionRegistry, SessionSettings};
use crate::services::user_service::{StoreError, UserRepository, UserStore};
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{web, App};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct FakeAccount {
    password: String,
    verified: bool,
}

#[derive(Default)]
struct FakeState {
    accounts: HashMap<String, FakeAccount>,
    session: Option<String>,
    verification_sends: usize,
    password_resets: Vec<String>,
    pending_email_changes: Vec<String>,
    send_failure: Option<ProviderError>,
    reload_failure: Option<ProviderError>,
}

#[derive(Default)]
pub struct FakeAuthProvider {
    state: Mutex<FakeState>,
}

impl FakeAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_account(&self, email: &str, password: &str, verified: bool) {
        self.state.lock().unwrap().accounts.insert(
            email.to_string(),
            FakeAccount {
                password: password.to_string(),
                verified,
            },
        );
    }

    /// Simulates the user following the link in their inbox
    pub fn verify_email(&self, email: &str) {
        if let Some(account) = self.state.lock().unwrap().accounts.get_mut(email) {
            account.verified = true;
        }
    }

    pub fn password_of(&self, email: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .accounts
            .get(email)
            .map(|a| a.password.clone())
    }

    pub fn verification_emails_sent(&self) -> usize {
        self.state.lock().unwrap().verification_sends
    }

    pub fn password_resets(&self) -> Vec<String> {
        self.state.lock().unwrap().password_resets.clone()
    }

    pub fn pending_email_changes(&self) -> Vec<String> {
        self.state.lock().unwrap().pending_email_changes.clone()
    }

    pub fn fail_verification_sends(&self, error: ProviderError) {
        self.state.lock().unwrap().send_failure = Some(error);
    }

    pub fn fail_reloads(&self, error: ProviderError) {
        self.state.lock().unwrap().reload_failure = Some(error);
    }

    fn check_credentials(&self, email: &str, password: &str) -> Result<(), ProviderError> {
        let state = self.state.lock().unwrap();
        match state.accounts.get(email) {
            Some(account) if account.password == password => Ok(()),
            _ => Err(ProviderError::Rejected(
                "The supplied auth credential is incorrect, malformed or has expired.".to_string(),
            )),
        }
    }
}

#[async_trait]
impl AuthProvider for FakeAuthProvider {
    async fn create_account(&self, email: &str, password: &str) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        if state.accounts.contains_key(email) {
            return Err(ProviderError::Rejected(
                "The email address is already in use by another account.".to_string(),
            ));
        }
        state.accounts.insert(
            email.to_string(),
            FakeAccount {
                password: password.to_string(),
                verified: false,
            },
        );
        state.session = Some(email.to_string());
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<(), ProviderError> {
        self.check_credentials(email, password)?;
        self.state.lock().unwrap().session = Some(email.to_string());
        Ok(())
    }

    async fn current_session_email(&self) -> Option<String> {
        self.state.lock().unwrap().session.clone()
    }

    async fn reauthenticate(&self, email: &str, password: &str) -> Result<(), ProviderError> {
        self.sign_in(email, password).await
    }

    async fn reload(&self) -> Result<bool, ProviderError> {
        let state = self.state.lock().unwrap();
        if let Some(error) = state.reload_failure.clone() {
            return Err(error);
        }
        let email = state.session.as_ref().ok_or(ProviderError::NoSession)?;
        Ok(state.accounts.get(email).map_or(false, |a| a.verified))
    }

    async fn is_email_verified(&self) -> bool {
        let state = self.state.lock().unwrap();
        state
            .session
            .as_ref()
            .and_then(|email| state.accounts.get(email))
            .map_or(false, |a| a.verified)
    }

    async fn send_verification_email(&self) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        if state.session.is_none() {
            return Err(ProviderError::NoSession);
        }
        if let Some(error) = state.send_failure.clone() {
            return Err(error);
        }
        state.verification_sends += 1;
        Ok(())
    }

    async fn send_password_reset_email(&self, email: &str) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        if !state.accounts.contains_key(email) {
            return Err(ProviderError::Rejected(
                "There is no user record corresponding to this identifier.".to_string(),
            ));
        }
        state.password_resets.push(email.to_string());
        Ok(())
    }

    async fn update_password(&self, new_password: &str) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        let email = state.session.clone().ok_or(ProviderError::NoSession)?;
        if new_password.len() < 6 {
            return Err(ProviderError::Rejected(
                "The given password is invalid. [ Password should be at least 6 characters ]"
                    .to_string(),
            ));
        }
        if let Some(account) = state.accounts.get_mut(&email) {
            account.password = new_password.to_string();
        }
        Ok(())
    }

    async fn update_email_pending_verification(&self, new_email: &str) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        if state.session.is_none() {
            return Err(ProviderError::NoSession);
        }
        state.pending_email_changes.push(new_email.to_string());
        Ok(())
    }

    async fn sign_out(&self) {
        self.state.lock().unwrap().session = None;
    }
}

/// Hands out one shared fake so tests can inspect what each session did
pub struct SharedFakeFactory(pub Arc<FakeAuthProvider>);

impl AuthProviderFactory for SharedFakeFactory {
    fn create(&self) -> Arc<dyn AuthProvider> {
        self.0.clone()
    }
}

#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<Vec<User>>,
    failing: Mutex<bool>,
}

impl InMemoryUserStore {
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    fn check(&self) -> Result<(), StoreError> {
        if *self.failing.lock().unwrap() {
            return Err(StoreError::Database("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn put(&self, user: &User) -> Result<(), StoreError> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        users.retain(|u| u.email != user.email);
        users.push(user.clone());
        Ok(())
    }

    async fn get(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.find_by_field(UserField::Email, email).await
    }

    async fn find_by_field(&self, field: UserField, value: &str) -> Result<Option<User>, StoreError> {
        self.check()?;
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| field.value_of(u) == value).cloned())
    }

    async fn update(&self, email: &str, patch: UserPatch) -> Result<(), StoreError> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.email == email)
            .ok_or_else(|| StoreError::NotFound(email.to_string()))?;
        if let Some(nfc_uid) = patch.nfc_uid {
            user.nfc_uid = Some(nfc_uid);
        }
        Ok(())
    }

    async fn delete(&self, email: &str) -> Result<(), StoreError> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.email != email);
        if users.len() == before {
            return Err(StoreError::NotFound(email.to_string()));
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        self.check()?;
        Ok(self.users.lock().unwrap().clone())
    }
}

pub fn sample_user(email: &str, student_id: &str) -> User {
    User {
        student_id: student_id.to_string(),
        email: email.to_string(),
        password_hash: "$2b$04$placeholder".to_string(),
        full_name: "Amy Lee".to_string(),
        identification_number: "220077665544".to_string(),
        major: "BSc Computer Science (Hons)".to_string(),
        intake: "September 2023".to_string(),
        nfc_uid: None,
        is_verified: true,
        created_at: None,
        updated_at: None,
    }
}

/// Wires the HTTP routes over a shared fake provider and an in-memory store
pub struct TestApp {
    pub provider: Arc<FakeAuthProvider>,
    pub sessions: web::Data<SessionRegistry>,
    pub users: web::Data<UserRepository>,
}

impl TestApp {
    pub fn new() -> Self {
        let provider = Arc::new(FakeAuthProvider::new());
        let sessions = SessionRegistry::new(
            Arc::new(SharedFakeFactory(provider.clone())),
            SessionSettings {
                resend_cooldown: Duration::from_secs(30),
                password_hash_cost: 4,
            },
        );
        let users = UserRepository::new(Arc::new(InMemoryUserStore::default()));

        Self {
            provider,
            sessions: web::Data::new(sessions),
            users: web::Data::new(users),
        }
    }

    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(self.sessions.clone())
            .app_data(self.users.clone())
            .configure(crate::api::configure)
    }

    pub async fn session(&self) -> Uuid {
        self.sessions.create().await
    }
}
