use actix_web::{get, post, put, web, HttpResponse};
use chrono::{Duration, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{self, AuthenticatedUser};
use crate::clients::mail::Mailer;
use crate::config::AppConfig;
use crate::database::Database;
use crate::errors::ApiError;
use crate::models::{
    ApiResponse, AuthResponse, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest,
    NewUser, OauthLoginRequest, ResetPasswordRequest, UpdateProfileRequest, UserRole,
};

const RESET_TOKEN_TTL_HOURS: i64 = 1;

// ============================================================================
// AUTHENTICATION
// ============================================================================

#[post("/user/login")]
pub async fn login(
    db: web::Data<Database>,
    config: web::Data<AppConfig>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = payload.into_inner();
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let user = db
        .get_user_by_email(&body.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".into()))?;

    // Reviewer accounts are provisioned through the OAuth flow and carry no
    // password; steer them back there instead of a generic rejection.
    if user.role == UserRole::Reviewer || user.password_hash.is_none() {
        return Err(ApiError::Unauthorized(
            "This account signs in with OAuth, not a password".into(),
        ));
    }

    let hash = user
        .password_hash
        .as_deref()
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".into()))?;

    if !auth::verify_password(&body.password, hash)? {
        return Err(ApiError::Unauthorized("Invalid email or password".into()));
    }

    let token = auth::create_token(&user, &config.jwt_secret)?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(AuthResponse { token, user })))
}

/// Identity already verified by the OAuth provider; unknown emails get a
/// reviewer account on the spot.
#[post("/user/oauth")]
pub async fn oauth_login(
    db: web::Data<Database>,
    config: web::Data<AppConfig>,
    payload: web::Json<OauthLoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = payload.into_inner();
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let user = match db.get_user_by_email(&body.email).await? {
        Some(user) => user,
        None => {
            let now = Utc::now();
            db.create_user(NewUser {
                id: Uuid::new_v4(),
                full_name: body.full_name,
                email: body.email,
                phone: None,
                password_hash: None,
                role: UserRole::Reviewer,
                profile_picture_url: body.profile_picture_url,
                phone_verified: false,
                created_at: now,
                updated_at: now,
            })
            .await?
        }
    };

    let token = auth::create_token(&user, &config.jwt_secret)?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(AuthResponse { token, user })))
}

// ============================================================================
// PROFILE
// ============================================================================

#[get("/user/me")]
pub async fn get_profile(
    db: web::Data<Database>,
    caller: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let user = db
        .get_user(caller.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(user)))
}

#[put("/user/me")]
pub async fn update_profile(
    db: web::Data<Database>,
    caller: AuthenticatedUser,
    payload: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = payload.into_inner();
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let user = db
        .update_profile(
            caller.user_id,
            &body.full_name,
            body.phone.as_deref(),
            body.profile_picture_url.as_deref(),
        )
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(user)))
}

// ============================================================================
// PASSWORD MANAGEMENT
// ============================================================================

#[post("/user/change-password")]
pub async fn change_password(
    db: web::Data<Database>,
    caller: AuthenticatedUser,
    payload: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = payload.into_inner();
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let user = db
        .get_user(caller.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let hash = user
        .password_hash
        .as_deref()
        .ok_or_else(|| ApiError::Conflict("This account has no password set".into()))?;

    if !auth::verify_password(&body.current_password, hash)? {
        return Err(ApiError::Unauthorized("Current password is incorrect".into()));
    }

    let new_hash = auth::hash_password(&body.new_password)?;
    db.set_password_hash(caller.user_id, &new_hash).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Password changed")))
}

/// Always answers 200 so the endpoint does not leak which emails exist.
#[post("/user/forgot-password")]
pub async fn forgot_password(
    db: web::Data<Database>,
    config: web::Data<AppConfig>,
    mailer: web::Data<Mailer>,
    payload: web::Json<ForgotPasswordRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = payload.into_inner();
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    if let Some(user) = db.get_user_by_email(&body.email).await? {
        let token = Uuid::new_v4();
        let expires_at = Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS);
        db.set_reset_token(user.id, token, expires_at).await?;

        if let Err(err) = mailer
            .send_reset_link(&user.email, &config.frontend_base_url, &token.to_string())
            .await
        {
            log::warn!("Failed to send reset email to {}: {err}", user.email);
        }
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "If that email exists, a reset link has been sent",
    )))
}

#[post("/user/reset-password")]
pub async fn reset_password(
    db: web::Data<Database>,
    payload: web::Json<ResetPasswordRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = payload.into_inner();
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let user = db
        .get_user_by_reset_token(body.token)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invalid or expired reset token".into()))?;

    let still_valid = user
        .reset_token_expires_at
        .map(|t| t > Utc::now())
        .unwrap_or(false);
    if !still_valid {
        return Err(ApiError::NotFound("Invalid or expired reset token".into()));
    }

    let new_hash = auth::hash_password(&body.new_password)?;
    db.reset_password(user.id, &new_hash).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Password has been reset")))
}
