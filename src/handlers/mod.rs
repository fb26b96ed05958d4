use actix_web::{get, HttpResponse, Responder};

pub mod admin;
pub mod businesses;
pub mod claims;
pub mod listings;
pub mod otp;
pub mod payments;
pub mod reviews;
pub mod services;
pub mod uploads;
pub mod users;

// ============================================================================
// HEALTH CHECK
// ============================================================================

#[get("/health")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "directory-service",
        "timestamp": chrono::Utc::now()
    }))
}
