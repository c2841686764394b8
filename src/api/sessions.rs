use crate::models::{AccountState, AuthState, EmailChangeStep};
use crate::services::registration_service::RegistrationSnapshot;
use crate::services::SessionRegistry;
use crate::utils::AppError;
use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: Uuid,
    pub auth: AuthState,
    pub cooldown_remaining_ms: u64,
    pub registration: RegistrationSnapshot,
    pub account: AccountState,
    pub email_step: EmailChangeStep,
}

/// POST /api/v1/sessions - Opens a client session
#[utoipa::path(
    post,
    path = "/api/v1/sessions",
    tag = "Sessions",
    responses(
        (status = 201, description = "Session created; pass its id as X-Session-Id")
    )
)]
pub async fn create_session(sessions: web::Data<SessionRegistry>) -> impl Responder {
    let id = sessions.create().await;
    HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "sessionId": id
    }))
}

/// GET /api/v1/sessions/{id} - Everything the client needs to redraw its screens
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{id}",
    tag = "Sessions",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session state", body = SessionView),
        (status = 404, description = "Unknown or expired session")
    )
)]
pub async fn get_session(
    sessions: web::Data<SessionRegistry>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let session = sessions.get(&id).await.ok_or(AppError::SessionNotFound)?;
    let mut session = session.lock().await;
    session.touch();

    Ok(HttpResponse::Ok().json(SessionView {
        session_id: session.id,
        auth: session.auth.state(),
        cooldown_remaining_ms: session.auth.remaining_cooldown(),
        registration: session.registration.snapshot(),
        account: session.account.state().clone(),
        email_step: session.account.email_step(),
    }))
}

/// DELETE /api/v1/sessions/{id} - Signs out and discards the session
#[utoipa::path(
    delete,
    path = "/api/v1/sessions/{id}",
    tag = "Sessions",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session ended"),
        (status = 404, description = "Unknown or expired session")
    )
)]
pub async fn end_session(
    sessions: web::Data<SessionRegistry>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    if !sessions.end(&id).await {
        return Err(AppError::SessionNotFound);
    }
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Session ended"
    })))
}
