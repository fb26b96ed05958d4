use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::{Business, ListingType, Service};

/// One row of the combined Business+Service search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingCard {
    pub listing_type: ListingType,
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub address: String,
    pub images: Value,
    pub average_rating: f64,
    pub review_count: i64,
    pub created_at: DateTime<Utc>,
}

impl ListingCard {
    pub fn from_business(business: Business, review_count: i64) -> Self {
        Self {
            listing_type: ListingType::Business,
            id: business.id,
            name: business.name,
            category: business.category,
            description: business.description,
            address: business.address,
            images: business.images,
            average_rating: business.average_rating,
            review_count,
            created_at: business.created_at,
        }
    }

    pub fn from_service(service: Service, review_count: i64) -> Self {
        Self {
            listing_type: ListingType::Service,
            id: service.id,
            name: service.name,
            category: service.category,
            description: service.description,
            address: service.address,
            images: service.images,
            average_rating: service.average_rating,
            review_count,
            created_at: service.created_at,
        }
    }
}

/// Fixed sort criteria for the combined listing search.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ListingSort {
    #[default]
    Newest,
    Oldest,
    TopRated,
    MostReviewed,
}

/// Sorts in place with a total order. Every branch falls back to the id so
/// equal keys still compare deterministically.
pub fn sort_listings(cards: &mut [ListingCard], sort: ListingSort) {
    match sort {
        ListingSort::Newest => cards.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        }),
        ListingSort::Oldest => cards.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        }),
        ListingSort::TopRated => cards.sort_by(|a, b| {
            b.average_rating
                .total_cmp(&a.average_rating)
                .then_with(|| b.review_count.cmp(&a.review_count))
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| a.id.cmp(&b.id))
        }),
        ListingSort::MostReviewed => cards.sort_by(|a, b| {
            b.review_count
                .cmp(&a.review_count)
                .then_with(|| b.average_rating.total_cmp(&a.average_rating))
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| a.id.cmp(&b.id))
        }),
    }
}

/// One page of a sliced result set.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub limit: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Slices the already-sorted set for the requested page. total_pages is
/// ceil(total/limit); a page past the end yields an empty item list.
pub fn paginate<T>(items: Vec<T>, page: Option<i64>, limit: Option<i64>) -> Page<T> {
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
    let page = page.unwrap_or(1).max(1);
    let total_items = items.len() as i64;
    let total_pages = (total_items + limit - 1) / limit;

    // An absurdly large page would overflow the offset multiply; treat it
    // as past the end instead.
    let start = (page - 1)
        .checked_mul(limit)
        .map_or(total_items, |s| s.min(total_items)) as usize;
    let items: Vec<T> = items
        .into_iter()
        .skip(start)
        .take(limit as usize)
        .collect();

    Page {
        items,
        page,
        limit,
        total_items,
        total_pages,
    }
}

/// Query parameters accepted by the combined listing search.
#[derive(Debug, Deserialize)]
pub struct ListingQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub sort: Option<ListingSort>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn card(rating: f64, reviews: i64, age_secs: i64) -> ListingCard {
        ListingCard {
            listing_type: ListingType::Business,
            id: Uuid::new_v4(),
            name: "x".into(),
            category: "cat".into(),
            description: None,
            address: "somewhere".into(),
            images: json!([]),
            average_rating: rating,
            review_count: reviews,
            created_at: Utc::now() - chrono::Duration::seconds(age_secs),
        }
    }

    #[test]
    fn pagination_respects_limit_and_page_count() {
        let items: Vec<i32> = (0..45).collect();
        let page = paginate(items, Some(1), Some(10));
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.total_items, 45);
        assert_eq!(page.total_pages, 5); // ceil(45/10)

        let items: Vec<i32> = (0..45).collect();
        let last = paginate(items, Some(5), Some(10));
        assert_eq!(last.items.len(), 5);

        let items: Vec<i32> = (0..45).collect();
        let past_end = paginate(items, Some(6), Some(10));
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.total_pages, 5);
    }

    #[test]
    fn pagination_defaults_and_clamps() {
        let page = paginate((0..10).collect::<Vec<i32>>(), None, None);
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, DEFAULT_PAGE_LIMIT);

        let clamped = paginate((0..10).collect::<Vec<i32>>(), Some(-3), Some(100000));
        assert_eq!(clamped.page, 1);
        assert_eq!(clamped.limit, MAX_PAGE_LIMIT);

        let empty = paginate(Vec::<i32>::new(), Some(1), Some(10));
        assert_eq!(empty.total_pages, 0);
        assert!(empty.items.is_empty());
    }

    #[test]
    fn pagination_survives_huge_page_numbers() {
        let far = paginate((0..3).collect::<Vec<i32>>(), Some(i64::MAX), Some(100));
        assert!(far.items.is_empty());
        assert_eq!(far.total_items, 3);

        let far = paginate((0..3).collect::<Vec<i32>>(), Some(i64::MAX), None);
        assert!(far.items.is_empty());
    }

    #[test]
    fn top_rated_orders_by_rating_then_reviews() {
        let mut cards = vec![card(3.5, 10, 0), card(4.8, 2, 0), card(4.8, 9, 0)];
        sort_listings(&mut cards, ListingSort::TopRated);
        assert_eq!(cards[0].average_rating, 4.8);
        assert_eq!(cards[0].review_count, 9);
        assert_eq!(cards[1].review_count, 2);
        assert_eq!(cards[2].average_rating, 3.5);
    }

    #[test]
    fn most_reviewed_orders_by_count() {
        let mut cards = vec![card(5.0, 1, 0), card(2.0, 30, 0), card(4.0, 30, 0)];
        sort_listings(&mut cards, ListingSort::MostReviewed);
        assert_eq!(cards[0].review_count, 30);
        assert_eq!(cards[0].average_rating, 4.0);
        assert_eq!(cards[2].review_count, 1);
    }

    #[test]
    fn recency_sorts_are_inverses() {
        let mut newest = vec![card(0.0, 0, 300), card(0.0, 0, 100), card(0.0, 0, 200)];
        let mut oldest = newest.clone();

        sort_listings(&mut newest, ListingSort::Newest);
        sort_listings(&mut oldest, ListingSort::Oldest);

        assert!(newest[0].created_at > newest[1].created_at);
        assert!(oldest[0].created_at < oldest[1].created_at);
        assert_eq!(newest.first().unwrap().id, oldest.last().unwrap().id);
    }

    #[test]
    fn sort_is_deterministic_for_equal_keys() {
        let a = card(4.0, 5, 100);
        let b = card(4.0, 5, 100);
        // Same keys both orders: the id tiebreak must agree.
        let mut lhs = vec![a.clone(), b.clone()];
        let mut rhs = vec![b, a];
        sort_listings(&mut lhs, ListingSort::TopRated);
        sort_listings(&mut rhs, ListingSort::TopRated);
        assert_eq!(lhs[0].id, rhs[0].id);
        assert_eq!(lhs[1].id, rhs[1].id);
    }
}
