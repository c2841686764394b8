use crate::services::session_service::{Session, SessionRegistry};
use crate::utils::AppError;
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

pub const SESSION_HEADER: &str = "X-Session-Id";

/// The caller's session, resolved from the `X-Session-Id` header
pub struct CurrentSession {
    pub id: Uuid,
    pub session: Arc<Mutex<Session>>,
}

fn session_id(req: &HttpRequest) -> Result<Uuid, AppError> {
    let header = req
        .headers()
        .get(SESSION_HEADER)
        .ok_or_else(|| AppError::InvalidRequest(format!("Missing {} header", SESSION_HEADER)))?;

    header
        .to_str()
        .ok()
        .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
        .ok_or_else(|| AppError::InvalidRequest(format!("Invalid {} header", SESSION_HEADER)))
}

impl FromRequest for CurrentSession {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let id = session_id(req);
        let registry = req.app_data::<web::Data<SessionRegistry>>().cloned();

        Box::pin(async move {
            let id = id?;
            let registry =
                registry.ok_or_else(|| AppError::Internal("session registry not configured".to_string()))?;

            let session = registry.get(&id).await.ok_or(AppError::SessionNotFound)?;
            session.lock().await.touch();

            Ok(CurrentSession { id, session })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn header_must_be_a_uuid() {
        let missing = TestRequest::default().to_http_request();
        assert!(matches!(session_id(&missing), Err(AppError::InvalidRequest(_))));

        let garbage = TestRequest::default()
            .insert_header((SESSION_HEADER, "not-a-uuid"))
            .to_http_request();
        assert!(matches!(session_id(&garbage), Err(AppError::InvalidRequest(_))));

        let id = Uuid::new_v4();
        let ok = TestRequest::default()
            .insert_header((SESSION_HEADER, id.to_string()))
            .to_http_request();
        assert_eq!(session_id(&ok).unwrap(), id);
    }
}
