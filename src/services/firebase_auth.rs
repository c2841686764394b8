// ==================== FIREBASE AUTH (Identity Toolkit REST v1) ====================
// Email/password accounts, verification mail and password management for one
// client session. The session's ID token never leaves this struct.

use super::auth_provider::{AuthProvider, AuthProviderFactory, ProviderError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

pub const DEFAULT_FIREBASE_AUTH_URL: &str = "https://identitytoolkit.googleapis.com/v1";

const RATE_LIMITED_MESSAGE: &str =
    "We have blocked all requests from this device due to unusual activity. Try again later.";

#[derive(Debug, Clone)]
struct FirebaseSession {
    id_token: String,
    email: String,
    email_verified: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    id_token: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

pub struct FirebaseAuth {
    client: Client,
    base_url: String,
    api_key: String,
    session: RwLock<Option<FirebaseSession>>,
}

impl FirebaseAuth {
    pub fn new(client: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            session: RwLock::new(None),
        }
    }

    async fn call<B, R>(&self, method: &str, body: &B) -> Result<R, ProviderError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/accounts:{}", self.base_url, method);

        let response = self
            .client
            .post(&url)
            .query(&[("key", &self.api_key)])
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if response.status().is_success() {
            return response
                .json::<R>()
                .await
                .map_err(|e| ProviderError::Transport(format!("Invalid response: {}", e)));
        }

        let status = response.status();
        match response.json::<ErrorEnvelope>().await {
            Ok(envelope) => {
                log::debug!("🔥 accounts:{} rejected ({}): {}", method, status, envelope.error.message);
                Err(map_error(&envelope.error.message))
            }
            Err(_) => Err(ProviderError::Transport(format!("HTTP {}", status))),
        }
    }

    async fn password_sign_in(
        &self,
        method: &str,
        email: &str,
        password: &str,
    ) -> Result<(), ProviderError> {
        let token: TokenResponse = self
            .call(
                method,
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;

        let mut session = FirebaseSession {
            email: token.email.unwrap_or_else(|| email.to_string()),
            id_token: token.id_token,
            email_verified: false,
        };

        // signUp/signIn responses do not carry the verification flag
        if let Ok(user) = self.lookup(&session.id_token).await {
            session.email_verified = user.email_verified;
        }

        *self.session.write().await = Some(session);
        Ok(())
    }

    async fn lookup(&self, id_token: &str) -> Result<LookupUser, ProviderError> {
        let response: LookupResponse = self
            .call("lookup", &serde_json::json!({ "idToken": id_token }))
            .await?;

        response
            .users
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Rejected("User not found".to_string()))
    }

    async fn id_token(&self) -> Result<String, ProviderError> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.id_token.clone())
            .ok_or(ProviderError::NoSession)
    }
}

#[async_trait]
impl AuthProvider for FirebaseAuth {
    async fn create_account(&self, email: &str, password: &str) -> Result<(), ProviderError> {
        self.password_sign_in("signUp", email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<(), ProviderError> {
        self.password_sign_in("signInWithPassword", email, password).await
    }

    async fn current_session_email(&self) -> Option<String> {
        self.session.read().await.as_ref().map(|s| s.email.clone())
    }

    async fn reauthenticate(&self, email: &str, password: &str) -> Result<(), ProviderError> {
        self.password_sign_in("signInWithPassword", email, password).await
    }

    async fn reload(&self) -> Result<bool, ProviderError> {
        let id_token = self.id_token().await?;
        let user = self.lookup(&id_token).await?;

        let mut guard = self.session.write().await;
        if let Some(session) = guard.as_mut() {
            session.email_verified = user.email_verified;
            if let Some(email) = user.email {
                session.email = email;
            }
        }

        Ok(user.email_verified)
    }

    async fn is_email_verified(&self) -> bool {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.email_verified)
            .unwrap_or(false)
    }

    async fn send_verification_email(&self) -> Result<(), ProviderError> {
        let id_token = self.id_token().await?;
        let _: serde_json::Value = self
            .call(
                "sendOobCode",
                &serde_json::json!({ "requestType": "VERIFY_EMAIL", "idToken": id_token }),
            )
            .await?;
        Ok(())
    }

    async fn send_password_reset_email(&self, email: &str) -> Result<(), ProviderError> {
        let _: serde_json::Value = self
            .call(
                "sendOobCode",
                &serde_json::json!({ "requestType": "PASSWORD_RESET", "email": email }),
            )
            .await?;
        Ok(())
    }

    async fn update_password(&self, new_password: &str) -> Result<(), ProviderError> {
        let id_token = self.id_token().await?;
        let token: TokenResponse = self
            .call(
                "update",
                &serde_json::json!({
                    "idToken": id_token,
                    "password": new_password,
                    "returnSecureToken": true,
                }),
            )
            .await?;

        // Changing the password revokes the old token
        if let Some(session) = self.session.write().await.as_mut() {
            session.id_token = token.id_token;
        }
        Ok(())
    }

    async fn update_email_pending_verification(&self, new_email: &str) -> Result<(), ProviderError> {
        let id_token = self.id_token().await?;
        let _: serde_json::Value = self
            .call(
                "sendOobCode",
                &serde_json::json!({
                    "requestType": "VERIFY_AND_CHANGE_EMAIL",
                    "idToken": id_token,
                    "newEmail": new_email,
                }),
            )
            .await?;
        Ok(())
    }

    async fn sign_out(&self) {
        self.session.write().await.take();
    }
}

/// Hands every session its own signed-out [`FirebaseAuth`] sharing one HTTP client
#[derive(Clone)]
pub struct FirebaseAuthFactory {
    client: Client,
    base_url: String,
    api_key: String,
}

impl FirebaseAuthFactory {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        }
    }
}

impl AuthProviderFactory for FirebaseAuthFactory {
    fn create(&self) -> Arc<dyn AuthProvider> {
        Arc::new(FirebaseAuth::new(self.client.clone(), &self.base_url, &self.api_key))
    }
}

/// Maps an Identity Toolkit error code to the message shown to users.
///
/// Codes may carry a detail suffix, e.g. `WEAK_PASSWORD : Password should be at least 6 characters`.
pub fn map_error(raw: &str) -> ProviderError {
    let (code, detail) = match raw.split_once(" : ") {
        Some((code, detail)) => (code.trim(), Some(detail.trim())),
        None => (raw.trim(), None),
    };

    let message = match code {
        "TOO_MANY_ATTEMPTS_TRY_LATER" => {
            return ProviderError::RateLimited(RATE_LIMITED_MESSAGE.to_string())
        }
        _ if raw.to_lowercase().contains("blocked all requests") => {
            return ProviderError::RateLimited(raw.to_string())
        }
        "EMAIL_EXISTS" => "The email address is already in use by another account.".to_string(),
        "INVALID_EMAIL" => "The email address is badly formatted.".to_string(),
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            "The supplied auth credential is incorrect, malformed or has expired.".to_string()
        }
        "USER_DISABLED" => "The user account has been disabled by an administrator.".to_string(),
        "WEAK_PASSWORD" => match detail {
            Some(detail) => format!("The given password is invalid. [ {} ]", detail),
            None => "The given password is invalid.".to_string(),
        },
        "CREDENTIAL_TOO_OLD_LOGIN_AGAIN" | "TOKEN_EXPIRED" | "INVALID_ID_TOKEN" | "USER_NOT_FOUND" => {
            "This operation is sensitive and requires recent authentication. Log in again before retrying this request.".to_string()
        }
        other => match detail {
            Some(detail) => format!("{}: {}", other, detail),
            None => other.to_string(),
        },
    };

    ProviderError::Rejected(message)
}
