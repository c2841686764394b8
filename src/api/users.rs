use crate::models::UserProfile;
use crate::services::UserRepository;
use crate::utils::AppError;
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNfcRequest {
    pub nfc_uid: String,
}

/// GET /api/v1/users - Lists registered users
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    responses((status = 200, description = "All users", body = [UserProfile]))
)]
pub async fn list_users(users: web::Data<UserRepository>) -> impl Responder {
    let profiles: Vec<UserProfile> = users
        .get_all_users()
        .await
        .into_iter()
        .map(UserProfile::from)
        .collect();

    log::info!("📋 GET /users - {} users", profiles.len());
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "count": profiles.len(),
        "users": profiles
    }))
}

/// GET /api/v1/users/{identifier} - Looks a user up by student ID, then by email
#[utoipa::path(
    get,
    path = "/api/v1/users/{identifier}",
    tag = "Users",
    params(("identifier" = String, Path, description = "Student ID or email")),
    responses(
        (status = 200, description = "User found", body = UserProfile),
        (status = 404, description = "No user with that student ID or email")
    )
)]
pub async fn get_user(
    users: web::Data<UserRepository>,
    identifier: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let identifier = identifier.into_inner();
    let user = users
        .get_user_by_identifier(identifier.trim())
        .await
        .ok_or_else(|| AppError::NotFound(format!("user {}", identifier)))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": UserProfile::from(user)
    })))
}

/// PUT /api/v1/users/{email}/nfc - Re-pairs a user with a different tag
#[utoipa::path(
    put,
    path = "/api/v1/users/{email}/nfc",
    tag = "Users",
    params(("email" = String, Path, description = "User email")),
    request_body = UpdateNfcRequest,
    responses(
        (status = 200, description = "Tag updated"),
        (status = 400, description = "Empty tag id"),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn update_nfc(
    users: web::Data<UserRepository>,
    email: web::Path<String>,
    request: web::Json<UpdateNfcRequest>,
) -> Result<HttpResponse, AppError> {
    let nfc_uid = request.nfc_uid.trim();
    if nfc_uid.is_empty() {
        return Err(AppError::InvalidRequest("nfcUid must not be empty".to_string()));
    }

    users.update_user_nfc_uid(&email, nfc_uid).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "email": email.as_str(),
        "nfcUid": nfc_uid
    })))
}

/// DELETE /api/v1/users/{email}
#[utoipa::path(
    delete,
    path = "/api/v1/users/{email}",
    tag = "Users",
    params(("email" = String, Path, description = "User email")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn delete_user(
    users: web::Data<UserRepository>,
    email: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    log::info!("🗑️  DELETE /users/{}", email);

    users.delete_user(&email).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "User deleted"
    })))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{sample_user, TestApp};
    use actix_web::{http::StatusCode, test};

    #[actix_web::test]
    async fn lookup_by_student_id_or_email() {
        let ctx = TestApp::new();
        ctx.users
            .save_user(&sample_user("amy@student.edu.my", "CS2101"))
            .await
            .unwrap();
        let app = test::init_service(ctx.app()).await;

        for identifier in ["CS2101", "amy@student.edu.my"] {
            let req = test::TestRequest::get()
                .uri(&format!("/api/v1/users/{}", identifier))
                .to_request();
            let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(body["user"]["studentId"], "CS2101");
        }

        let req = test::TestRequest::get().uri("/api/v1/users/XX9999").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn nfc_update_and_delete() {
        let ctx = TestApp::new();
        ctx.users
            .save_user(&sample_user("amy@student.edu.my", "CS2101"))
            .await
            .unwrap();
        let app = test::init_service(ctx.app()).await;

        let req = test::TestRequest::put()
            .uri("/api/v1/users/amy@student.edu.my/nfc")
            .set_json(serde_json::json!({ "nfcUid": "04:11:22:33:44:55:66" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        let stored = ctx.users.get_user_by_email("amy@student.edu.my").await.unwrap();
        assert_eq!(stored.nfc_uid.as_deref(), Some("04:11:22:33:44:55:66"));

        let req = test::TestRequest::put()
            .uri("/api/v1/users/nobody@student.edu.my/nfc")
            .set_json(serde_json::json!({ "nfcUid": "04:11" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::delete()
            .uri("/api/v1/users/amy@student.edu.my")
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(ctx.users.get_all_users().await.is_empty());
    }
}
