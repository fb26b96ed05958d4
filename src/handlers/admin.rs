use actix_web::{delete, get, post, put, web, HttpResponse};
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthenticatedUser;
use crate::cache::ResponseCache;
use crate::clients::mail::Mailer;
use crate::database::Database;
use crate::errors::ApiError;
use crate::models::{
    ApiResponse, ListingStatus, PendingListings, SetListingStatusRequest, UpsertSettingRequest,
    UserRole,
};

// ============================================================================
// MODERATION QUEUE
// ============================================================================

#[get("/admin/listings/pending")]
pub async fn pending_listings(
    db: web::Data<Database>,
    caller: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    caller.require_admin()?;

    let businesses = db.list_pending_businesses().await?;
    let services = db.list_pending_services().await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(PendingListings {
        businesses,
        services,
    })))
}

/// Approve or reject a business listing; the owner is notified by email.
#[post("/admin/business/{business_id}/status")]
pub async fn set_business_status(
    db: web::Data<Database>,
    cache: web::Data<ResponseCache>,
    mailer: web::Data<Mailer>,
    caller: AuthenticatedUser,
    business_id: web::Path<Uuid>,
    payload: web::Json<SetListingStatusRequest>,
) -> Result<HttpResponse, ApiError> {
    caller.require_admin()?;

    let body = payload.into_inner();
    body.validate_business_rules()
        .map_err(ApiError::Validation)?;

    let business = db
        .set_business_status(
            business_id.into_inner(),
            body.status,
            body.reason.as_deref(),
        )
        .await?;

    cache.flush_all().await;

    if let Some(owner) = db.get_user(business.owner_user_id).await? {
        notify_owner(&mailer, &owner.email, &business.name, body.status, body.reason.as_deref())
            .await;
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(business)))
}

#[post("/admin/service/{service_id}/status")]
pub async fn set_service_status(
    db: web::Data<Database>,
    cache: web::Data<ResponseCache>,
    mailer: web::Data<Mailer>,
    caller: AuthenticatedUser,
    service_id: web::Path<Uuid>,
    payload: web::Json<SetListingStatusRequest>,
) -> Result<HttpResponse, ApiError> {
    caller.require_admin()?;

    let body = payload.into_inner();
    body.validate_business_rules()
        .map_err(ApiError::Validation)?;

    let service = db
        .set_service_status(service_id.into_inner(), body.status, body.reason.as_deref())
        .await?;

    cache.flush_all().await;

    if let Some(owner) = db.get_user(service.owner_user_id).await? {
        notify_owner(&mailer, &owner.email, &service.name, body.status, body.reason.as_deref())
            .await;
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(service)))
}

/// Best-effort decision email; the moderation write has already committed.
async fn notify_owner(
    mailer: &Mailer,
    email: &str,
    listing_name: &str,
    status: ListingStatus,
    reason: Option<&str>,
) {
    let outcome = match status {
        ListingStatus::Verified => mailer.send_listing_approved(email, listing_name).await,
        ListingStatus::Rejected => {
            mailer
                .send_listing_rejected(email, listing_name, reason.unwrap_or(""))
                .await
        }
        ListingStatus::Pending => return,
    };
    if let Err(err) = outcome {
        log::warn!("Failed to notify {email} about listing decision: {err}");
    }
}

// ============================================================================
// DASHBOARD & USERS
// ============================================================================

#[get("/admin/stats")]
pub async fn admin_stats(
    db: web::Data<Database>,
    caller: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    caller.require_admin()?;
    let stats = db.get_admin_stats().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(stats)))
}

#[get("/admin/users")]
pub async fn list_users(
    db: web::Data<Database>,
    caller: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    caller.require_admin()?;
    let users = db.list_users().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(users)))
}

#[delete("/admin/user/{user_id}")]
pub async fn delete_user(
    db: web::Data<Database>,
    cache: web::Data<ResponseCache>,
    caller: AuthenticatedUser,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    caller.require_role(&[UserRole::Superadmin])?;

    let user_id = user_id.into_inner();
    if user_id == caller.user_id {
        return Err(ApiError::Conflict(
            "You cannot delete your own account".into(),
        ));
    }

    db.delete_user(user_id).await?;

    cache.flush_all().await;

    Ok(HttpResponse::Ok().json(ApiResponse::success("User deleted")))
}

// ============================================================================
// SETTINGS
// ============================================================================

#[get("/admin/settings")]
pub async fn list_settings(
    db: web::Data<Database>,
    caller: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    caller.require_admin()?;
    let settings = db.list_settings().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(settings)))
}

#[put("/admin/settings")]
pub async fn upsert_setting(
    db: web::Data<Database>,
    cache: web::Data<ResponseCache>,
    caller: AuthenticatedUser,
    payload: web::Json<UpsertSettingRequest>,
) -> Result<HttpResponse, ApiError> {
    caller.require_role(&[UserRole::Superadmin])?;

    let body = payload.into_inner();
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let setting = db.upsert_setting(&body.key, body.value).await?;

    cache.flush_all().await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(setting)))
}
