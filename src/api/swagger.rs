use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Campus Identity API",
        version = "1.0.0",
        description = "Student identity onboarding for the campus app. \n\n**Sessions:** open one with `POST /api/v1/sessions` and send its id in the `X-Session-Id` header on auth, registration and account calls.\n\n**Features:**\n- Student card OCR parsing\n- Email/password accounts with mandatory email verification\n- Throttled verification resend\n- Card scan to NFC pairing registration flow\n- Password reset, password change and email change",
        contact(
            name = "Campus Identity Team"
        )
    ),
    paths(
        // Health
        crate::api::health::health_check,

        // Scan
        crate::api::scan::parse_card,

        // Sessions
        crate::api::sessions::create_session,
        crate::api::sessions::get_session,
        crate::api::sessions::end_session,

        // Auth
        crate::api::auth::register,
        crate::api::auth::login,
        crate::api::auth::confirm_login,
        crate::api::auth::resend_verification,
        crate::api::auth::check_verification,
        crate::api::auth::sign_out,
        crate::api::auth::get_state,

        // Registration
        crate::api::registration::get_progress,
        crate::api::registration::scan_card,
        crate::api::registration::submit_credentials,
        crate::api::registration::confirm_verification,
        crate::api::registration::complete,
        crate::api::registration::reset,

        // Account
        crate::api::account::password_reset,
        crate::api::account::password_change,
        crate::api::account::email_change_reauthenticate,
        crate::api::account::email_change,

        // Users
        crate::api::users::list_users,
        crate::api::users::get_user,
        crate::api::users::update_nfc,
        crate::api::users::delete_user,
    ),
    components(
        schemas(
            crate::api::health::HealthResponse,
            crate::api::scan::ParseCardRequest,
            crate::api::sessions::SessionView,
            crate::api::auth::CredentialsRequest,
            crate::api::registration::ScanCardRequest,
            crate::api::registration::RegistrationCredentialsRequest,
            crate::api::registration::CompleteRegistrationRequest,
            crate::api::account::PasswordResetRequest,
            crate::api::account::PasswordChangeRequest,
            crate::api::account::ReauthenticateRequest,
            crate::api::account::EmailChangeRequest,
            crate::api::users::UpdateNfcRequest,
            crate::models::ScannedData,
            crate::models::AuthState,
            crate::models::AccountState,
            crate::models::EmailChangeStep,
            crate::models::UserProfile,
            crate::services::registration_service::RegistrationStep,
            crate::services::registration_service::RegistrationSnapshot,
        )
    ),
    tags(
        (name = "Health", description = "Liveness endpoint."),
        (name = "Scan", description = "Stateless extraction of identity fields from student card OCR text."),
        (name = "Sessions", description = "Client sessions. Each one owns its own auth state machine and flows."),
        (name = "Auth", description = "Sign-up, login and email verification, including the resend cooldown."),
        (name = "Registration", description = "Scan card, create account, verify email, pair NFC tag."),
        (name = "Account", description = "Password reset, password change and email change."),
        (name = "Users", description = "Registered user records."),
    ),
    modifiers(&SessionHeader)
)]
pub struct ApiDoc;

struct SessionHeader;

impl Modify for SessionHeader {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_id",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-Session-Id"))),
            )
        }
    }
}
