use crate::middleware::CurrentSession;
use crate::models::{AuthState, UserProfile};
use crate::services::registration_service::RegistrationSnapshot;
use crate::services::UserRepository;
use crate::utils::AppError;
use actix_web::{web, HttpResponse};
use serde::Deserialize;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScanCardRequest {
    /// OCR text read from the card front
    pub front_text: String,
    pub front_image: Option<String>,
    pub back_image: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationCredentialsRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRegistrationRequest {
    /// Tag id read during pairing; the simulated tag is used when absent
    pub nfc_uid: Option<String>,
}

/// GET /api/v1/registration - Current step and captured data
#[utoipa::path(
    get,
    path = "/api/v1/registration",
    tag = "Registration",
    params(("X-Session-Id" = Uuid, Header, description = "Session id")),
    responses((status = 200, description = "Registration progress", body = RegistrationSnapshot))
)]
pub async fn get_progress(current: CurrentSession) -> HttpResponse {
    let session = current.session.lock().await;
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "registration": session.registration.snapshot()
    }))
}

/// POST /api/v1/registration/scan - Step 1: parse the captured card
#[utoipa::path(
    post,
    path = "/api/v1/registration/scan",
    tag = "Registration",
    params(("X-Session-Id" = Uuid, Header, description = "Session id")),
    request_body = ScanCardRequest,
    responses(
        (status = 200, description = "Card accepted", body = RegistrationSnapshot),
        (status = 400, description = "Front or back capture missing"),
        (status = 409, description = "Not at the scan step"),
        (status = 422, description = "Card unreadable or incomplete")
    )
)]
pub async fn scan_card(
    current: CurrentSession,
    request: web::Json<ScanCardRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    log::info!("🪪 POST /registration/scan - session {}", current.id);

    let mut session = current.session.lock().await;
    session
        .registration
        .submit_scan(&request.front_text, request.front_image, request.back_image)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "registration": session.registration.snapshot()
    })))
}

/// POST /api/v1/registration/credentials - Step 2: create the account
#[utoipa::path(
    post,
    path = "/api/v1/registration/credentials",
    tag = "Registration",
    params(("X-Session-Id" = Uuid, Header, description = "Session id")),
    request_body = RegistrationCredentialsRequest,
    responses(
        (status = 200, description = "Account created, waiting for email verification", body = AuthState),
        (status = 400, description = "Invalid credentials"),
        (status = 401, description = "Provider rejected the sign-up"),
        (status = 409, description = "Not at the credentials step")
    )
)]
pub async fn submit_credentials(
    current: CurrentSession,
    request: web::Json<RegistrationCredentialsRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("📝 POST /registration/credentials - {}", request.email);

    let mut guard = current.session.lock().await;
    let session = &mut *guard;
    let state = session
        .registration
        .submit_credentials(
            &mut session.auth,
            &request.email,
            &request.password,
            &request.confirm_password,
        )
        .await?;

    // The account exists at this point; a failed verification send is only a warning
    let warning = match &state {
        AuthState::Error { message } => Some(message.clone()),
        _ => None,
    };

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "state": state,
        "warning": warning,
        "cooldownRemainingMs": session.auth.remaining_cooldown(),
        "registration": session.registration.snapshot()
    })))
}

/// POST /api/v1/registration/verify - Step 3: check the verification link was followed
#[utoipa::path(
    post,
    path = "/api/v1/registration/verify",
    tag = "Registration",
    params(("X-Session-Id" = Uuid, Header, description = "Session id")),
    responses(
        (status = 200, description = "Verified; NFC pairing is next", body = AuthState),
        (status = 400, description = "Email not verified yet"),
        (status = 409, description = "Not waiting for verification")
    )
)]
pub async fn confirm_verification(current: CurrentSession) -> Result<HttpResponse, AppError> {
    let mut guard = current.session.lock().await;
    let session = &mut *guard;
    let state = session
        .registration
        .confirm_verification(&mut session.auth)
        .await?;

    log::debug!("🔎 Registration verify -> {:?}", session.registration.step());
    Ok(super::auth::auth_response(state, session.auth.remaining_cooldown()))
}

/// POST /api/v1/registration/complete - Step 4: pair the tag and save the user
#[utoipa::path(
    post,
    path = "/api/v1/registration/complete",
    tag = "Registration",
    params(("X-Session-Id" = Uuid, Header, description = "Session id")),
    request_body(content = CompleteRegistrationRequest, description = "Optional NFC tag id"),
    responses(
        (status = 201, description = "User saved", body = UserProfile),
        (status = 409, description = "Email not verified yet"),
        (status = 500, description = "Could not save the user")
    )
)]
pub async fn complete(
    current: CurrentSession,
    users: web::Data<UserRepository>,
    request: Option<web::Json<CompleteRegistrationRequest>>,
) -> Result<HttpResponse, AppError> {
    let request = request.map(web::Json::into_inner).unwrap_or_default();

    let mut guard = current.session.lock().await;
    let session = &mut *guard;
    let user = session
        .registration
        .complete(&mut session.auth, &users, request.nfc_uid.as_deref())
        .await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "message": "Registration complete",
        "user": UserProfile::from(user)
    })))
}

/// POST /api/v1/registration/reset - Starts over from the scan step
#[utoipa::path(
    post,
    path = "/api/v1/registration/reset",
    tag = "Registration",
    params(("X-Session-Id" = Uuid, Header, description = "Session id")),
    responses((status = 200, description = "Flow reset", body = RegistrationSnapshot))
)]
pub async fn reset(current: CurrentSession) -> HttpResponse {
    let mut session = current.session.lock().await;
    session.registration.reset();
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "registration": session.registration.snapshot()
    }))
}
