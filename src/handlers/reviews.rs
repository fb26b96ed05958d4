use actix_web::{delete, get, post, put, web, HttpResponse};
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthenticatedUser;
use crate::cache::ResponseCache;
use crate::database::Database;
use crate::errors::{is_unique_violation, ApiError};
use crate::models::{
    ApiResponse, CreateReviewRequest, ListingStatus, ListingType, ReplyReviewRequest, UserRole,
};

/// Resolves the target listing's moderation status and owner. NotFound
/// covers both a missing row and a listing the public cannot see.
async fn listing_owner_if_verified(
    db: &Database,
    listing_type: ListingType,
    listing_id: Uuid,
) -> Result<Uuid, ApiError> {
    let (status, owner) = match listing_type {
        ListingType::Business => {
            let business = db
                .get_business(listing_id)
                .await?
                .ok_or_else(|| ApiError::NotFound("Listing not found".into()))?;
            (business.status, business.owner_user_id)
        }
        ListingType::Service => {
            let service = db
                .get_service(listing_id)
                .await?
                .ok_or_else(|| ApiError::NotFound("Listing not found".into()))?;
            (service.status, service.owner_user_id)
        }
    };

    if status != ListingStatus::Verified {
        return Err(ApiError::NotFound("Listing not found".into()));
    }

    Ok(owner)
}

/// One review per reviewer per listing. The insert and the listing's
/// average recomputation happen in one transaction.
#[post("/review")]
pub async fn create_review(
    db: web::Data<Database>,
    cache: web::Data<ResponseCache>,
    caller: AuthenticatedUser,
    payload: web::Json<CreateReviewRequest>,
) -> Result<HttpResponse, ApiError> {
    caller.require_role(&[UserRole::Reviewer])?;

    let body = payload.into_inner();
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    listing_owner_if_verified(&db, body.listing_type, body.listing_id).await?;

    let review = db
        .create_review_with_aggregate(body.into_new_review(caller.user_id))
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                ApiError::Conflict("You have already reviewed this listing".into())
            } else {
                ApiError::Database(err)
            }
        })?;

    cache.flush_all().await;

    Ok(HttpResponse::Created().json(ApiResponse::success(review)))
}

#[get("/review/mine")]
pub async fn my_reviews(
    db: web::Data<Database>,
    caller: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let reviews = db.list_reviews_for_user(caller.user_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(reviews)))
}

#[get("/review/{listing_type}/{listing_id}")]
pub async fn list_reviews(
    db: web::Data<Database>,
    path: web::Path<(ListingType, Uuid)>,
) -> Result<HttpResponse, ApiError> {
    let (listing_type, listing_id) = path.into_inner();
    let reviews = db.list_reviews_for_listing(listing_type, listing_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(reviews)))
}

/// Single-level reply by the reviewed listing's owner (or an admin). A
/// review can only be replied to once.
#[put("/review/{review_id}/reply")]
pub async fn reply_to_review(
    db: web::Data<Database>,
    cache: web::Data<ResponseCache>,
    caller: AuthenticatedUser,
    review_id: web::Path<Uuid>,
    payload: web::Json<ReplyReviewRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = payload.into_inner();
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let review = db
        .get_review(review_id.into_inner())
        .await?
        .ok_or_else(|| ApiError::NotFound("Review not found".into()))?;

    if review.reply.is_some() {
        return Err(ApiError::Conflict(
            "This review already has a reply".into(),
        ));
    }

    let owner = listing_owner_if_verified(&db, review.listing_type, review.listing_id).await?;
    if !caller.can_act_for(owner) {
        return Err(ApiError::Forbidden(
            "Only the listing owner can reply to this review".into(),
        ));
    }

    let review = db.set_review_reply(review.id, &body.reply).await?;

    cache.flush_all().await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(review)))
}

/// Author or admin removal; the listing average is recomputed in the same
/// transaction.
#[delete("/review/{review_id}")]
pub async fn delete_review(
    db: web::Data<Database>,
    cache: web::Data<ResponseCache>,
    caller: AuthenticatedUser,
    review_id: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let review = db
        .get_review(review_id.into_inner())
        .await?
        .ok_or_else(|| ApiError::NotFound("Review not found".into()))?;

    if !caller.can_act_for(review.user_id) {
        return Err(ApiError::Forbidden(
            "Only the author can delete this review".into(),
        ));
    }

    db.delete_review_with_aggregate(review.id).await?;

    cache.flush_all().await;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Review deleted")))
}
