use actix_web::{post, web, HttpResponse};
use chrono::{Duration, Utc};
use validator::Validate;

use crate::auth;
use crate::clients::sms::SmsClient;
use crate::database::Database;
use crate::errors::ApiError;
use crate::models::{ApiResponse, SendOtpRequest, VerifyOtpRequest};

const OTP_TTL_MINUTES: i64 = 10;

/// Issues a six digit code with a ten minute expiry. Resending replaces
/// the previous code and resets the attempt counter.
#[post("/otp/send")]
pub async fn send_otp(
    db: web::Data<Database>,
    sms: web::Data<SmsClient>,
    payload: web::Json<SendOtpRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = payload.into_inner();
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let code = auth::generate_otp_code();
    let expires_at = Utc::now() + Duration::minutes(OTP_TTL_MINUTES);
    db.upsert_otp(&body.phone, &code, expires_at).await?;

    if let Err(err) = sms.send_otp(&body.phone, &code).await {
        log::error!("Failed to send OTP to {}: {err}", body.phone);
        return Err(ApiError::Gateway(
            "Could not deliver the verification code".into(),
        ));
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success("Verification code sent")))
}

/// Three attempts per issued code; an exhausted or expired code requires a
/// fresh send.
#[post("/otp/verify")]
pub async fn verify_otp(
    db: web::Data<Database>,
    payload: web::Json<VerifyOtpRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = payload.into_inner();
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let otp = db
        .get_otp(&body.phone)
        .await?
        .ok_or_else(|| ApiError::NotFound("No verification code for this phone".into()))?;

    if otp.is_expired(Utc::now()) {
        return Err(ApiError::Validation(
            "The verification code has expired".into(),
        ));
    }
    if otp.attempts_exhausted() {
        return Err(ApiError::Conflict(
            "Too many attempts, request a new code".into(),
        ));
    }

    if otp.code != body.code {
        let attempts = db.increment_otp_attempts(&body.phone).await?;
        if attempts >= crate::models::MAX_OTP_ATTEMPTS {
            // Exhausted codes are removed; the caller has to request a new one.
            db.delete_otp(&body.phone).await?;
            return Err(ApiError::Conflict(
                "Too many attempts, request a new code".into(),
            ));
        }
        log::info!("OTP mismatch for {} (attempt {attempts})", body.phone);
        return Err(ApiError::Validation("Incorrect verification code".into()));
    }

    db.mark_otp_verified(&body.phone).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Phone number verified")))
}
