use crate::models::ScannedData;
use crate::services::card_parser;
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParseCardRequest {
    /// Raw OCR text of the card front
    pub text: String,
    pub front_image: Option<String>,
    pub back_image: Option<String>,
}

/// POST /api/v1/scan/parse - Extracts identity fields from OCR text
///
/// Stateless: nothing is stored and no session is needed.
#[utoipa::path(
    post,
    path = "/api/v1/scan/parse",
    tag = "Scan",
    request_body = ParseCardRequest,
    responses(
        (status = 200, description = "Card text parsed", body = ScannedData),
        (status = 422, description = "Student ID or IC number not found")
    )
)]
pub async fn parse_card(request: web::Json<ParseCardRequest>) -> impl Responder {
    let request = request.into_inner();
    log::info!("🔍 POST /scan/parse - {} chars of OCR text", request.text.len());

    match card_parser::parse_with_images(&request.text, request.front_image, request.back_image) {
        Some(data) => {
            let missing = data.missing_fields();
            if !missing.is_empty() {
                log::debug!("⚠️ Partial scan, missing: {:?}", missing);
            }
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "complete": missing.is_empty(),
                "missingFields": missing,
                "data": data
            }))
        }
        None => {
            log::warn!("⚠️ Card text had no Student ID or IC number");
            HttpResponse::UnprocessableEntity().json(serde_json::json!({
                "success": false,
                "error": "Could not read the Student ID or IC number from the card. Please scan again."
            }))
        }
    }
}
