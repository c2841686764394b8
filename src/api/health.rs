use crate::database::MongoDB;
use crate::services::SessionRegistry;
use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub database: String,
    pub active_sessions: usize,
    pub timestamp: i64,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health_check(
    sessions: web::Data<SessionRegistry>,
    db: Option<web::Data<MongoDB>>,
) -> impl Responder {
    let database = match db {
        Some(db) if db.health_check().await => "connected",
        Some(_) => "unreachable",
        None => "not configured",
    };

    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        service: "campus-identity".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
        active_sessions: sessions.len().await,
        timestamp: chrono::Utc::now().timestamp(),
    })
}

#[cfg(test)]
mod tests {
    use crate::test_support::TestApp;
    use actix_web::test;

    #[actix_web::test]
    async fn reports_sessions_without_a_database() {
        let ctx = TestApp::new();
        ctx.session().await;
        let app = test::init_service(ctx.app()).await;

        let body: serde_json::Value =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "campus-identity");
        assert_eq!(body["activeSessions"], 1);
        assert_eq!(body["database"], "not configured");
    }
}
