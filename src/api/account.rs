use crate::middleware::CurrentSession;
use crate::models::{AccountState, EmailChangeStep};
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChangeRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReauthenticateRequest {
    pub current_password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmailChangeRequest {
    pub new_email: String,
}

fn account_response(state: AccountState, email_step: EmailChangeStep) -> HttpResponse {
    match &state {
        AccountState::Error { message } => HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": message,
            "state": state,
            "emailStep": email_step
        })),
        _ => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "state": state,
            "emailStep": email_step
        })),
    }
}

/// POST /api/v1/account/password-reset - Mails a reset link; no sign-in needed
#[utoipa::path(
    post,
    path = "/api/v1/account/password-reset",
    tag = "Account",
    params(("X-Session-Id" = Uuid, Header, description = "Session id")),
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Reset email sent", body = AccountState),
        (status = 400, description = "Provider rejected the request")
    )
)]
pub async fn password_reset(current: CurrentSession, request: web::Json<PasswordResetRequest>) -> impl Responder {
    log::info!("🔑 POST /account/password-reset - {}", request.email);

    let mut session = current.session.lock().await;
    let state = session.account.send_password_reset_email(request.email.trim()).await;
    account_response(state, session.account.email_step())
}

/// POST /api/v1/account/password-change
#[utoipa::path(
    post,
    path = "/api/v1/account/password-change",
    tag = "Account",
    params(("X-Session-Id" = Uuid, Header, description = "Session id")),
    request_body = PasswordChangeRequest,
    responses(
        (status = 200, description = "Password changed", body = AccountState),
        (status = 400, description = "Not signed in or current password rejected")
    )
)]
pub async fn password_change(current: CurrentSession, request: web::Json<PasswordChangeRequest>) -> impl Responder {
    log::info!("🔑 POST /account/password-change - session {}", current.id);

    let mut session = current.session.lock().await;
    let state = session
        .account
        .change_password(&request.current_password, &request.new_password)
        .await;
    account_response(state, session.account.email_step())
}

/// POST /api/v1/account/email-change/reauthenticate - First half of an email change
#[utoipa::path(
    post,
    path = "/api/v1/account/email-change/reauthenticate",
    tag = "Account",
    params(("X-Session-Id" = Uuid, Header, description = "Session id")),
    request_body = ReauthenticateRequest,
    responses(
        (status = 200, description = "Current password confirmed", body = AccountState),
        (status = 400, description = "Not signed in or password rejected")
    )
)]
pub async fn email_change_reauthenticate(
    current: CurrentSession,
    request: web::Json<ReauthenticateRequest>,
) -> impl Responder {
    let mut session = current.session.lock().await;
    let state = session
        .account
        .reauthenticate_for_email_change(&request.current_password)
        .await;
    account_response(state, session.account.email_step())
}

/// POST /api/v1/account/email-change - Sends a verification link to the new address
#[utoipa::path(
    post,
    path = "/api/v1/account/email-change",
    tag = "Account",
    params(("X-Session-Id" = Uuid, Header, description = "Session id")),
    request_body = EmailChangeRequest,
    responses(
        (status = 200, description = "Verification sent to the new address", body = AccountState),
        (status = 400, description = "Re-authentication required or provider error")
    )
)]
pub async fn email_change(current: CurrentSession, request: web::Json<EmailChangeRequest>) -> impl Responder {
    log::info!("✉️  POST /account/email-change - {}", request.new_email);

    let mut session = current.session.lock().await;
    let state = session.account.update_email(request.new_email.trim()).await;
    account_response(state, session.account.email_step())
}

#[cfg(test)]
mod tests {
    use crate::middleware::session::SESSION_HEADER;
    use crate::test_support::TestApp;
    use actix_web::{http::StatusCode, test};

    const EMAIL: &str = "amy@student.edu.my";

    #[actix_web::test]
    async fn email_change_requires_reauthentication() {
        let ctx = TestApp::new();
        ctx.provider.add_account(EMAIL, "secret123", true);
        let app = test::init_service(ctx.app()).await;
        let id = ctx.session().await;

        let login = test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .insert_header((SESSION_HEADER, id.to_string()))
            .set_json(serde_json::json!({ "email": EMAIL, "password": "secret123" }))
            .to_request();
        test::call_service(&app, login).await;

        let early = test::TestRequest::post()
            .uri("/api/v1/account/email-change")
            .insert_header((SESSION_HEADER, id.to_string()))
            .set_json(serde_json::json!({ "newEmail": "amy.lim@student.edu.my" }))
            .to_request();
        let res = test::call_service(&app, early).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let reauth = test::TestRequest::post()
            .uri("/api/v1/account/email-change/reauthenticate")
            .insert_header((SESSION_HEADER, id.to_string()))
            .set_json(serde_json::json!({ "currentPassword": "secret123" }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, reauth).await;
        assert_eq!(body["emailStep"], "reauthenticated");

        let change = test::TestRequest::post()
            .uri("/api/v1/account/email-change")
            .insert_header((SESSION_HEADER, id.to_string()))
            .set_json(serde_json::json!({ "newEmail": "amy.lim@student.edu.my" }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, change).await;
        assert_eq!(body["emailStep"], "verification_sent");
        assert_eq!(ctx.provider.pending_email_changes(), vec!["amy.lim@student.edu.my"]);
    }

    #[actix_web::test]
    async fn password_reset_works_signed_out() {
        let ctx = TestApp::new();
        ctx.provider.add_account(EMAIL, "secret123", false);
        let app = test::init_service(ctx.app()).await;
        let id = ctx.session().await;

        let req = test::TestRequest::post()
            .uri("/api/v1/account/password-reset")
            .insert_header((SESSION_HEADER, id.to_string()))
            .set_json(serde_json::json!({ "email": EMAIL }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(ctx.provider.password_resets(), vec![EMAIL.to_string()]);
    }
}
