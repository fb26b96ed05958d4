use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthenticatedUser;
use crate::cache::ResponseCache;
use crate::database::Database;
use crate::errors::ApiError;
use crate::models::{ApiResponse, ClaimStatus, CreateClaimRequest, ListingStatus, RejectRequest};

#[derive(Debug, Deserialize)]
pub struct ClaimFilter {
    pub status: Option<ClaimStatus>,
}

/// Any authenticated user may claim an unclaimed, verified business. One
/// pending claim per (business, claimant) at a time.
#[post("/claim")]
pub async fn create_claim(
    db: web::Data<Database>,
    caller: AuthenticatedUser,
    payload: web::Json<CreateClaimRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = payload.into_inner();
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let business = db
        .get_business(body.business_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Business not found".into()))?;

    if business.status != ListingStatus::Verified {
        return Err(ApiError::NotFound("Business not found".into()));
    }
    if business.claimed {
        return Err(ApiError::Conflict(
            "This business has already been claimed".into(),
        ));
    }
    if db
        .find_pending_claim(business.id, caller.user_id)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(
            "You already have a pending claim for this business".into(),
        ));
    }

    let claim = db.create_claim(body.into_new_claim(caller.user_id)).await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(claim)))
}

#[get("/claim/mine")]
pub async fn my_claims(
    db: web::Data<Database>,
    caller: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let claims = db.list_claims_for_claimant(caller.user_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(claims)))
}

#[get("/claim/{claim_id}")]
pub async fn get_claim(
    db: web::Data<Database>,
    caller: AuthenticatedUser,
    claim_id: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let claim = db
        .get_claim(claim_id.into_inner())
        .await?
        .ok_or_else(|| ApiError::NotFound("Claim not found".into()))?;

    if !caller.can_act_for(claim.claimant_user_id) {
        return Err(ApiError::Forbidden(
            "This claim belongs to another user".into(),
        ));
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(claim)))
}

#[get("/claim")]
pub async fn list_claims(
    db: web::Data<Database>,
    caller: AuthenticatedUser,
    filter: web::Query<ClaimFilter>,
) -> Result<HttpResponse, ApiError> {
    caller.require_admin()?;
    let claims = db.list_claims(filter.status).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(claims)))
}

/// Transfers ownership to the claimant and consumes the claim row. A
/// repeated approval of the same claim id answers 404.
#[post("/claim/{claim_id}/approve")]
pub async fn approve_claim(
    db: web::Data<Database>,
    cache: web::Data<ResponseCache>,
    caller: AuthenticatedUser,
    claim_id: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    caller.require_admin()?;

    let business = db.approve_claim(claim_id.into_inner()).await?;

    cache.flush_all().await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(business)))
}

#[post("/claim/{claim_id}/reject")]
pub async fn reject_claim(
    db: web::Data<Database>,
    caller: AuthenticatedUser,
    claim_id: web::Path<Uuid>,
    payload: web::Json<RejectRequest>,
) -> Result<HttpResponse, ApiError> {
    caller.require_admin()?;

    let body = payload.into_inner();
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let claim = db.reject_claim(claim_id.into_inner(), &body.reason).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(claim)))
}
