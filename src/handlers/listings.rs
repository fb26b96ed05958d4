use actix_web::{get, web, HttpRequest, HttpResponse};

use crate::cache::ResponseCache;
use crate::database::Database;
use crate::errors::ApiError;
use crate::listings::{paginate, sort_listings, ListingCard, ListingQuery};
use crate::models::{ApiResponse, ListingType};

/// Combined search across verified businesses and services. Both kinds are
/// merged into one card list, sorted with a total order and paginated in
/// memory. Results are cached per path+query until the TTL or the next
/// write flush.
#[get("/listing")]
pub async fn search_listings(
    db: web::Data<Database>,
    cache: web::Data<ResponseCache>,
    req: HttpRequest,
    query: web::Query<ListingQuery>,
) -> Result<HttpResponse, ApiError> {
    let key = ResponseCache::key(req.path(), req.query_string());
    if let Some(cached) = cache.get(&key).await {
        return Ok(HttpResponse::Ok().json(cached));
    }

    let query = query.into_inner();

    let businesses = db
        .list_verified_businesses(query.q.as_deref(), query.category.as_deref())
        .await?;
    let services = db
        .list_verified_services(query.q.as_deref(), query.category.as_deref())
        .await?;

    let business_ids: Vec<_> = businesses.iter().map(|b| b.id).collect();
    let service_ids: Vec<_> = services.iter().map(|s| s.id).collect();
    let business_counts = db
        .review_counts(ListingType::Business, &business_ids)
        .await?;
    let service_counts = db.review_counts(ListingType::Service, &service_ids).await?;

    let mut cards: Vec<ListingCard> = businesses
        .into_iter()
        .map(|b| {
            let count = business_counts.get(&b.id).copied().unwrap_or(0);
            ListingCard::from_business(b, count)
        })
        .chain(services.into_iter().map(|s| {
            let count = service_counts.get(&s.id).copied().unwrap_or(0);
            ListingCard::from_service(s, count)
        }))
        .collect();

    sort_listings(&mut cards, query.sort.unwrap_or_default());
    let page = paginate(cards, query.page, query.limit);

    let body = serde_json::to_value(ApiResponse::success(page))
        .map_err(|e| ApiError::Internal(format!("response serialization failed: {e}")))?;
    cache.insert(key, body.clone()).await;

    Ok(HttpResponse::Ok().json(body))
}

/// Category tree maintained by admins under the "categories" setting.
#[get("/listing/categories")]
pub async fn list_categories(
    db: web::Data<Database>,
    cache: web::Data<ResponseCache>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let key = ResponseCache::key(req.path(), req.query_string());
    if let Some(cached) = cache.get(&key).await {
        return Ok(HttpResponse::Ok().json(cached));
    }

    let categories = db
        .get_setting("categories")
        .await?
        .map(|s| s.value)
        .unwrap_or_else(|| serde_json::json!({}));

    let body = serde_json::to_value(ApiResponse::success(categories))
        .map_err(|e| ApiError::Internal(format!("response serialization failed: {e}")))?;
    cache.insert(key, body.clone()).await;

    Ok(HttpResponse::Ok().json(body))
}
