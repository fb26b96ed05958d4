use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{self, AuthenticatedUser};
use crate::cache::ResponseCache;
use crate::clients::mail::Mailer;
use crate::database::Database;
use crate::errors::{is_unique_violation, ApiError};
use crate::listings::{paginate, ListingQuery};
use crate::models::{
    ApiResponse, ListingStatus, RegisterServiceRequest, UpdateListingRequest,
};

/// Like business registration, but the contact phone must have passed OTP
/// verification first. The consumed OTP row is deleted on success.
#[post("/service/register")]
pub async fn register_service(
    db: web::Data<Database>,
    cache: web::Data<ResponseCache>,
    mailer: web::Data<Mailer>,
    payload: web::Json<RegisterServiceRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = payload.into_inner();
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let otp = db
        .get_otp(&body.owner_phone)
        .await?
        .filter(|otp| otp.verified && !otp.is_expired(Utc::now()))
        .ok_or_else(|| {
            ApiError::Forbidden("Phone number has not been verified".into())
        })?;

    if db.get_user_by_email(&body.owner_email).await?.is_some() {
        return Err(ApiError::Conflict(
            "An account with this email already exists".into(),
        ));
    }

    let password = auth::generate_password();
    let password_hash = auth::hash_password(&password)?;
    let (owner, service) = body.into_new_owner_and_service(password_hash);

    let (user, service) = db.register_service(owner, service).await.map_err(|err| {
        if is_unique_violation(&err) {
            ApiError::Conflict("An account with this email already exists".into())
        } else {
            ApiError::Database(err)
        }
    })?;

    db.delete_otp(&otp.phone).await?;

    cache.flush_all().await;

    if let Err(err) = mailer
        .send_password_email(&user.email, &user.full_name, &password)
        .await
    {
        log::warn!("Failed to send credentials to {}: {err}", user.email);
    }

    Ok(HttpResponse::Created().json(ApiResponse::success(service)))
}

#[get("/service")]
pub async fn list_services(
    db: web::Data<Database>,
    cache: web::Data<ResponseCache>,
    req: HttpRequest,
    query: web::Query<ListingQuery>,
) -> Result<HttpResponse, ApiError> {
    let key = ResponseCache::key(req.path(), req.query_string());
    if let Some(cached) = cache.get(&key).await {
        return Ok(HttpResponse::Ok().json(cached));
    }

    let services = db
        .list_verified_services(query.q.as_deref(), query.category.as_deref())
        .await?;
    let page = paginate(services, query.page, query.limit);

    let body = serde_json::to_value(ApiResponse::success(page))
        .map_err(|e| ApiError::Internal(format!("response serialization failed: {e}")))?;
    cache.insert(key, body.clone()).await;

    Ok(HttpResponse::Ok().json(body))
}

#[get("/service/category/{category}")]
pub async fn services_by_category(
    db: web::Data<Database>,
    cache: web::Data<ResponseCache>,
    req: HttpRequest,
    category: web::Path<String>,
    query: web::Query<ListingQuery>,
) -> Result<HttpResponse, ApiError> {
    let key = ResponseCache::key(req.path(), req.query_string());
    if let Some(cached) = cache.get(&key).await {
        return Ok(HttpResponse::Ok().json(cached));
    }

    let services = db
        .list_verified_services(None, Some(category.as_str()))
        .await?;
    let page = paginate(services, query.page, query.limit);

    let body = serde_json::to_value(ApiResponse::success(page))
        .map_err(|e| ApiError::Internal(format!("response serialization failed: {e}")))?;
    cache.insert(key, body.clone()).await;

    Ok(HttpResponse::Ok().json(body))
}

#[get("/service/{service_id}")]
pub async fn get_service(
    db: web::Data<Database>,
    service_id: web::Path<Uuid>,
    caller: Option<AuthenticatedUser>,
) -> Result<HttpResponse, ApiError> {
    let service = db
        .get_service(service_id.into_inner())
        .await?
        .ok_or_else(|| ApiError::NotFound("Service not found".into()))?;

    if service.status != ListingStatus::Verified {
        let visible = caller
            .map(|c| c.can_act_for(service.owner_user_id))
            .unwrap_or(false);
        if !visible {
            return Err(ApiError::NotFound("Service not found".into()));
        }
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(service)))
}

#[get("/service/mine")]
pub async fn my_services(
    db: web::Data<Database>,
    caller: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let services = db.list_services_for_owner(caller.user_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(services)))
}

#[put("/service/{service_id}")]
pub async fn update_service(
    db: web::Data<Database>,
    cache: web::Data<ResponseCache>,
    caller: AuthenticatedUser,
    service_id: web::Path<Uuid>,
    payload: web::Json<UpdateListingRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = payload.into_inner();
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let mut service = db
        .get_service(service_id.into_inner())
        .await?
        .ok_or_else(|| ApiError::NotFound("Service not found".into()))?;

    if !caller.can_act_for(service.owner_user_id) {
        return Err(ApiError::Forbidden(
            "Only the owner can update this listing".into(),
        ));
    }

    body.apply_to_service(&mut service);
    let service = db.update_service(service).await?;

    cache.flush_all().await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(service)))
}

/// Removing a service also removes its reviews and the owning account.
#[delete("/service/{service_id}")]
pub async fn delete_service(
    db: web::Data<Database>,
    cache: web::Data<ResponseCache>,
    caller: AuthenticatedUser,
    service_id: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let service_id = service_id.into_inner();

    let service = db
        .get_service(service_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Service not found".into()))?;

    if !caller.can_act_for(service.owner_user_id) {
        return Err(ApiError::Forbidden(
            "Only the owner can delete this listing".into(),
        ));
    }

    db.delete_service_cascade(service_id).await?;

    cache.flush_all().await;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Service deleted")))
}
