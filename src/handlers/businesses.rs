use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{self, AuthenticatedUser};
use crate::cache::ResponseCache;
use crate::clients::mail::Mailer;
use crate::database::Database;
use crate::errors::{is_unique_violation, ApiError};
use crate::listings::{paginate, ListingQuery};
use crate::models::{
    ApiResponse, ListingStatus, RegisterBusinessRequest, UpdateListingRequest,
};

/// Creates the owner account and the pending listing in one step. The
/// generated initial password goes out by email; a delivery failure is
/// logged but does not undo the registration.
#[post("/business/register")]
pub async fn register_business(
    db: web::Data<Database>,
    cache: web::Data<ResponseCache>,
    mailer: web::Data<Mailer>,
    payload: web::Json<RegisterBusinessRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = payload.into_inner();
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    if db.get_user_by_email(&body.owner_email).await?.is_some() {
        return Err(ApiError::Conflict(
            "An account with this email already exists".into(),
        ));
    }

    let password = auth::generate_password();
    let password_hash = auth::hash_password(&password)?;
    let (owner, business) = body.into_new_owner_and_business(password_hash);

    let (user, business) = db.register_business(owner, business).await.map_err(|err| {
        if is_unique_violation(&err) {
            ApiError::Conflict("An account with this email already exists".into())
        } else {
            ApiError::Database(err)
        }
    })?;

    cache.flush_all().await;

    if let Err(err) = mailer
        .send_password_email(&user.email, &user.full_name, &password)
        .await
    {
        log::warn!("Failed to send credentials to {}: {err}", user.email);
    }

    Ok(HttpResponse::Created().json(ApiResponse::success(business)))
}

#[get("/business")]
pub async fn list_businesses(
    db: web::Data<Database>,
    cache: web::Data<ResponseCache>,
    req: HttpRequest,
    query: web::Query<ListingQuery>,
) -> Result<HttpResponse, ApiError> {
    let key = ResponseCache::key(req.path(), req.query_string());
    if let Some(cached) = cache.get(&key).await {
        return Ok(HttpResponse::Ok().json(cached));
    }

    let businesses = db
        .list_verified_businesses(query.q.as_deref(), query.category.as_deref())
        .await?;
    let page = paginate(businesses, query.page, query.limit);

    let body = serde_json::to_value(ApiResponse::success(page))
        .map_err(|e| ApiError::Internal(format!("response serialization failed: {e}")))?;
    cache.insert(key, body.clone()).await;

    Ok(HttpResponse::Ok().json(body))
}

#[get("/business/category/{category}")]
pub async fn businesses_by_category(
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

    let businesses = db
        .list_verified_businesses(None, Some(category.as_str()))
        .await?;
    let page = paginate(businesses, query.page, query.limit);

    let body = serde_json::to_value(ApiResponse::success(page))
        .map_err(|e| ApiError::Internal(format!("response serialization failed: {e}")))?;
    cache.insert(key, body.clone()).await;

    Ok(HttpResponse::Ok().json(body))
}

/// Public detail for verified listings. Pending and rejected listings are
/// only visible to their owner or an admin.
#[get("/business/{business_id}")]
pub async fn get_business(
    db: web::Data<Database>,
    business_id: web::Path<Uuid>,
    caller: Option<AuthenticatedUser>,
) -> Result<HttpResponse, ApiError> {
    let business = db
        .get_business(business_id.into_inner())
        .await?
        .ok_or_else(|| ApiError::NotFound("Business not found".into()))?;

    if business.status != ListingStatus::Verified {
        let visible = caller
            .map(|c| c.can_act_for(business.owner_user_id))
            .unwrap_or(false);
        if !visible {
            return Err(ApiError::NotFound("Business not found".into()));
        }
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(business)))
}

#[get("/business/mine")]
pub async fn my_businesses(
    db: web::Data<Database>,
    caller: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let businesses = db.list_businesses_for_owner(caller.user_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(businesses)))
}

#[put("/business/{business_id}")]
pub async fn update_business(
    db: web::Data<Database>,
    cache: web::Data<ResponseCache>,
    caller: AuthenticatedUser,
    business_id: web::Path<Uuid>,
    payload: web::Json<UpdateListingRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = payload.into_inner();
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let mut business = db
        .get_business(business_id.into_inner())
        .await?
        .ok_or_else(|| ApiError::NotFound("Business not found".into()))?;

    if !caller.can_act_for(business.owner_user_id) {
        return Err(ApiError::Forbidden(
            "Only the owner can update this listing".into(),
        ));
    }

    body.apply_to_business(&mut business);
    let business = db.update_business(business).await?;

    cache.flush_all().await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(business)))
}

/// Removing a business also removes its reviews and the owning account.
#[delete("/business/{business_id}")]
pub async fn delete_business(
    db: web::Data<Database>,
    cache: web::Data<ResponseCache>,
    caller: AuthenticatedUser,
    business_id: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let business_id = business_id.into_inner();

    let business = db
        .get_business(business_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Business not found".into()))?;

    if !caller.can_act_for(business.owner_user_id) {
        return Err(ApiError::Forbidden(
            "Only the owner can delete this listing".into(),
        ));
    }

    db.delete_business_cascade(business_id).await?;

    cache.flush_all().await;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Business deleted")))
}
