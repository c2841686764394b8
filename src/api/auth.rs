use crate::middleware::CurrentSession;
use crate::models::AuthState;
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Every auth operation answers with the state it left the machine in
pub(crate) fn auth_response(state: AuthState, cooldown_remaining_ms: u64) -> HttpResponse {
    match &state {
        AuthState::Error { message } => HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": message,
            "state": state,
            "cooldownRemainingMs": cooldown_remaining_ms
        })),
        _ => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "state": state,
            "cooldownRemainingMs": cooldown_remaining_ms
        })),
    }
}

/// POST /api/v1/auth/register - Creates the provider account and mails a verification link
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Auth",
    params(("X-Session-Id" = Uuid, Header, description = "Session id")),
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Account created, verification required", body = AuthState),
        (status = 400, description = "Provider rejected the sign-up")
    )
)]
pub async fn register(current: CurrentSession, request: web::Json<CredentialsRequest>) -> impl Responder {
    log::info!("📝 POST /auth/register - {}", request.email);

    let mut session = current.session.lock().await;
    let state = session.auth.register(request.email.trim(), &request.password).await;
    auth_response(state, session.auth.remaining_cooldown())
}

/// POST /api/v1/auth/login - Signs in; always routes through verification
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    params(("X-Session-Id" = Uuid, Header, description = "Session id")),
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Signed in, verification check required", body = AuthState),
        (status = 400, description = "Bad credentials or rate limited")
    )
)]
pub async fn login(current: CurrentSession, request: web::Json<CredentialsRequest>) -> impl Responder {
    log::info!("🔐 POST /auth/login - {}", request.email);

    let mut session = current.session.lock().await;
    let state = session.auth.login(request.email.trim(), &request.password).await;
    auth_response(state, session.auth.remaining_cooldown())
}

/// POST /api/v1/auth/confirm-login - Finishes a login once the email was seen verified
#[utoipa::path(
    post,
    path = "/api/v1/auth/confirm-login",
    tag = "Auth",
    params(("X-Session-Id" = Uuid, Header, description = "Session id")),
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthState),
        (status = 400, description = "Verification not confirmed or credentials rejected")
    )
)]
pub async fn confirm_login(current: CurrentSession, request: web::Json<CredentialsRequest>) -> impl Responder {
    log::info!("🔐 POST /auth/confirm-login - {}", request.email);

    let mut session = current.session.lock().await;
    let state = session
        .auth
        .confirm_login_after_verification(request.email.trim(), &request.password)
        .await;
    auth_response(state, session.auth.remaining_cooldown())
}

/// POST /api/v1/auth/resend-verification - Throttled by the resend cooldown
#[utoipa::path(
    post,
    path = "/api/v1/auth/resend-verification",
    tag = "Auth",
    params(("X-Session-Id" = Uuid, Header, description = "Session id")),
    responses(
        (status = 200, description = "Verification email sent", body = AuthState),
        (status = 400, description = "Cooldown active, rate limited or no signed-in user")
    )
)]
pub async fn resend_verification(current: CurrentSession) -> impl Responder {
    log::info!("📧 POST /auth/resend-verification - session {}", current.id);

    let mut session = current.session.lock().await;
    let state = session.auth.resend_verification_email().await;
    auth_response(state, session.auth.remaining_cooldown())
}

/// POST /api/v1/auth/check-verification - Refreshes the user and checks the verified flag
#[utoipa::path(
    post,
    path = "/api/v1/auth/check-verification",
    tag = "Auth",
    params(("X-Session-Id" = Uuid, Header, description = "Session id")),
    responses(
        (status = 200, description = "Email verified", body = AuthState),
        (status = 400, description = "Not verified yet or no signed-in user")
    )
)]
pub async fn check_verification(current: CurrentSession) -> impl Responder {
    let mut session = current.session.lock().await;
    let state = session.auth.check_if_email_verified().await;
    auth_response(state, session.auth.remaining_cooldown())
}

/// POST /api/v1/auth/sign-out
#[utoipa::path(
    post,
    path = "/api/v1/auth/sign-out",
    tag = "Auth",
    params(("X-Session-Id" = Uuid, Header, description = "Session id")),
    responses(
        (status = 200, description = "Signed out", body = AuthState)
    )
)]
pub async fn sign_out(current: CurrentSession) -> impl Responder {
    log::info!("👋 POST /auth/sign-out - session {}", current.id);

    let mut session = current.session.lock().await;
    let state = session.auth.sign_out().await;
    session.account.reset();
    auth_response(state, session.auth.remaining_cooldown())
}

/// GET /api/v1/auth/state - Current auth state and resend cooldown
#[utoipa::path(
    get,
    path = "/api/v1/auth/state",
    tag = "Auth",
    params(("X-Session-Id" = Uuid, Header, description = "Session id")),
    responses(
        (status = 200, description = "Current state", body = AuthState)
    )
)]
pub async fn get_state(current: CurrentSession) -> impl Responder {
    let session = current.session.lock().await;
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "state": session.auth.state(),
        "cooldownRemainingMs": session.auth.remaining_cooldown()
    }))
}

#[cfg(test)]
mod tests {
    use crate::middleware::session::SESSION_HEADER;
    use crate::services::auth_service::RESEND_THROTTLED_MESSAGE;
    use crate::test_support::TestApp;
    use actix_web::{http::StatusCode, test};

    const EMAIL: &str = "amy@student.edu.my";
    const PASSWORD: &str = "secret123";

    #[actix_web::test]
    async fn register_then_resend_is_throttled() {
        let ctx = TestApp::new();
        let app = test::init_service(ctx.app()).await;
        let id = ctx.session().await;

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .insert_header((SESSION_HEADER, id.to_string()))
            .set_json(serde_json::json!({ "email": EMAIL, "password": PASSWORD }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["state"]["state"], "requires_verification");
        assert_eq!(body["state"]["email"], EMAIL);
        assert!(body["cooldownRemainingMs"].as_u64().unwrap() > 0);

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/resend-verification")
            .insert_header((SESSION_HEADER, id.to_string()))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["error"], RESEND_THROTTLED_MESSAGE);
        assert_eq!(ctx.provider.verification_emails_sent(), 1);
    }

    #[actix_web::test]
    async fn login_needs_a_verified_check_before_success() {
        let ctx = TestApp::new();
        ctx.provider.add_account(EMAIL, PASSWORD, true);
        let app = test::init_service(ctx.app()).await;
        let id = ctx.session().await;
        let creds = serde_json::json!({ "email": EMAIL, "password": PASSWORD });

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/confirm-login")
            .insert_header((SESSION_HEADER, id.to_string()))
            .set_json(&creds)
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        for uri in ["/api/v1/auth/login", "/api/v1/auth/check-verification"] {
            let req = test::TestRequest::post()
                .uri(uri)
                .insert_header((SESSION_HEADER, id.to_string()))
                .set_json(&creds)
                .to_request();
            let res = test::call_service(&app, req).await;
            assert_eq!(res.status(), StatusCode::OK, "{}", uri);
        }

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/confirm-login")
            .insert_header((SESSION_HEADER, id.to_string()))
            .set_json(&creds)
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["state"]["state"], "success");
    }

    #[actix_web::test]
    async fn unknown_session_is_not_found() {
        let ctx = TestApp::new();
        let app = test::init_service(ctx.app()).await;

        let req = test::TestRequest::get()
            .uri("/api/v1/auth/state")
            .insert_header((SESSION_HEADER, uuid::Uuid::new_v4().to_string()))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get().uri("/api/v1/auth/state").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
