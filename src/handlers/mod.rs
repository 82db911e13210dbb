pub mod api_v1;

use actix_web::{HttpResponse, web};

use crate::errors::AppError;
use api_v1::response::{ApiResponse, ok};

/// GET /health - liveness only, no database round trip.
async fn health() -> HttpResponse {
    ok(ApiResponse::data(serde_json::json!({ "status": "ok" })))
}

async fn not_found() -> Result<HttpResponse, AppError> {
    Err(AppError::NotFound("Route not found".to_string()))
}

/// Register every route plus JSON/query extractor error handling.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .route("/health", web::get().to(health))
    .service(web::scope("/api/v1").configure(api_v1::configure))
    .default_service(web::to(not_found));
}
