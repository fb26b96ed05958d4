use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

// ============================================================================
// ENUMS
// ============================================================================

/// Account role (also a Postgres enum)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Business,
    Service,
    Reviewer,
    Admin,
    Superadmin,
}

impl UserRole {
    pub fn is_admin(self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Superadmin)
    }
}

/// Listing moderation lifecycle (also a Postgres enum)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "listing_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Pending,
    Verified,
    Rejected,
}

/// Discriminates the two reviewable listing kinds (also a Postgres enum)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "listing_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ListingType {
    Business,
    Service,
}

/// Claim lifecycle (also a Postgres enum)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "claim_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    Pending,
    Approved,
    Rejected,
}

impl ClaimStatus {
    /// Approval and rejection are only reachable from pending.
    pub fn can_resolve(self) -> bool {
        matches!(self, ClaimStatus::Pending)
    }
}

/// Payment lifecycle (also a Postgres enum)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Processing,
    Successful,
    Failed,
}

impl PaymentStatus {
    pub fn is_final(self) -> bool {
        !matches!(self, PaymentStatus::Processing)
    }

    /// Status only moves processing -> successful or processing -> failed.
    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        matches!(self, PaymentStatus::Processing) && next.is_final()
    }
}

/// What a payment pays for (also a Postgres enum)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "payment_entity_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentEntityType {
    Business,
    Service,
    Claim,
}

impl PaymentEntityType {
    /// Settings key the price for this entity kind is stored under.
    pub fn price_key(self) -> &'static str {
        match self {
            PaymentEntityType::Business => "business_listing_price",
            PaymentEntityType::Service => "service_listing_price",
            PaymentEntityType::Claim => "claim_fee",
        }
    }
}

// ============================================================================
// USERS
// ============================================================================

/// Platform account. `password_hash` is NULL for OAuth-provisioned reviewers.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub role: UserRole,
    pub profile_picture_url: Option<String>,
    pub phone_verified: bool,
    #[serde(skip_serializing)]
    pub reset_token: Option<Uuid>,
    #[serde(skip_serializing)]
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Helper struct used when inserting a new user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: Option<String>,
    pub role: UserRole,
    pub profile_picture_url: Option<String>,
    pub phone_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// BUSINESSES
// ============================================================================

/// Directory business listing
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Business {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub address: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub images: Value,
    pub status: ListingStatus,
    pub average_rating: f64,
    pub claimed: bool,
    pub proof_document_url: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Helper for creating a new business
#[derive(Debug, Clone)]
pub struct NewBusiness {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub address: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub images: Value,
    pub status: ListingStatus,
    pub claimed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// SERVICES
// ============================================================================

/// Service-provider listing; same lifecycle and rating pattern as Business
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Service {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub address: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub images: Value,
    pub status: ListingStatus,
    pub average_rating: f64,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Helper for creating a new service
#[derive(Debug, Clone)]
pub struct NewService {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub address: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub images: Value,
    pub status: ListingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// REVIEWS
// ============================================================================

/// Star rating + comment against either listing kind
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub listing_type: ListingType,
    pub listing_id: Uuid,
    pub star_rating: i32,
    pub comment: String,
    pub reply: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Helper for creating a new review
#[derive(Debug, Clone)]
pub struct NewReview {
    pub id: Uuid,
    pub user_id: Uuid,
    pub listing_type: ListingType,
    pub listing_id: Uuid,
    pub star_rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Arithmetic mean of the given star ratings, rounded to one decimal.
/// An empty slice yields 0.0 (listing with no reviews).
pub fn round_average(ratings: &[i32]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: i64 = ratings.iter().map(|r| *r as i64).sum();
    let mean = sum as f64 / ratings.len() as f64;
    (mean * 10.0).round() / 10.0
}

// ============================================================================
// CLAIMS
// ============================================================================

/// Request to take ownership of an unclaimed business
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Claim {
    pub id: Uuid,
    pub business_id: Uuid,
    pub claimant_user_id: Uuid,
    pub status: ClaimStatus,
    pub proof_document_url: String,
    pub message: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Helper for creating a new claim
#[derive(Debug, Clone)]
pub struct NewClaim {
    pub id: Uuid,
    pub business_id: Uuid,
    pub claimant_user_id: Uuid,
    pub status: ClaimStatus,
    pub proof_document_url: String,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// PAYMENTS
// ============================================================================

/// Listing-tier or claim payment tracked against the external gateway
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub entity_type: PaymentEntityType,
    pub entity_id: Uuid,
    pub amount_minor: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub gateway_reference: String,
    pub authorization_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Helper for creating a new payment
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub entity_type: PaymentEntityType,
    pub entity_id: Uuid,
    pub amount_minor: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub gateway_reference: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// ADMIN SETTINGS & OTP
// ============================================================================

/// Generic key/value row for prices and category lists
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AdminSetting {
    pub key: String,
    pub value: Value,
    pub updated_at: DateTime<Utc>,
}

pub const MAX_OTP_ATTEMPTS: i32 = 3;

/// Short-lived phone verification code, one row per phone number
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OtpCode {
    pub phone: String,
    #[serde(skip_serializing)]
    pub code: String,
    pub attempts: i32,
    pub verified: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl OtpCode {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn attempts_exhausted(&self) -> bool {
        self.attempts >= MAX_OTP_ATTEMPTS
    }
}

// ============================================================================
// REQUEST/RESPONSE DTOs
// ============================================================================

/// API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: Utc::now(),
        }
    }
}

/// Token + profile returned by the login endpoints
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// Password login payload
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Provider-verified identity forwarded after the OAuth handshake
#[derive(Debug, Deserialize, Validate)]
pub struct OauthLoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 120))]
    pub full_name: String,
    pub profile_picture_url: Option<String>,
}

/// Profile update payload
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 120))]
    pub full_name: String,
    #[validate(length(min = 7, max = 20))]
    pub phone: Option<String>,
    #[validate(length(max = 1024))]
    pub profile_picture_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1))]
    pub current_password: String,
    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    pub token: Uuid,
    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

/// Payload sent by business owners to register a listing. Creates the owner
/// account and the pending listing together.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterBusinessRequest {
    #[validate(length(min = 1, max = 120))]
    pub owner_full_name: String,
    #[validate(email)]
    pub owner_email: String,
    #[validate(length(min = 7, max = 20))]
    pub owner_phone: Option<String>,
    #[validate(length(min = 3, max = 120))]
    pub name: String,
    #[validate(length(min = 2, max = 120))]
    pub category: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(min = 5, max = 300))]
    pub address: String,
    #[validate(length(min = 7, max = 20))]
    pub phone: Option<String>,
    #[validate(length(max = 1024))]
    pub website: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub images: Option<Vec<String>>,
}

impl RegisterBusinessRequest {
    pub fn into_new_owner_and_business(self, password_hash: String) -> (NewUser, NewBusiness) {
        let now = Utc::now();
        let owner = NewUser {
            id: Uuid::new_v4(),
            full_name: self.owner_full_name,
            email: self.owner_email,
            phone: self.owner_phone,
            password_hash: Some(password_hash),
            role: UserRole::Business,
            profile_picture_url: None,
            phone_verified: false,
            created_at: now,
            updated_at: now,
        };
        let business = NewBusiness {
            id: Uuid::new_v4(),
            owner_user_id: owner.id,
            name: self.name,
            category: self.category,
            description: self.description,
            address: self.address,
            phone: self.phone,
            website: self.website,
            email: self.email,
            images: images_value(self.images),
            status: ListingStatus::Pending,
            // Listings start unclaimed; ownership is asserted later through
            // the claim flow with proof of business.
            claimed: false,
            created_at: now,
            updated_at: now,
        };
        (owner, business)
    }
}

/// Payload sent by service providers to register a listing. The contact
/// phone must have passed OTP verification first.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterServiceRequest {
    #[validate(length(min = 1, max = 120))]
    pub owner_full_name: String,
    #[validate(email)]
    pub owner_email: String,
    #[validate(length(min = 7, max = 20))]
    pub owner_phone: String,
    #[validate(length(min = 3, max = 120))]
    pub name: String,
    #[validate(length(min = 2, max = 120))]
    pub category: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(min = 5, max = 300))]
    pub address: String,
    #[validate(length(min = 7, max = 20))]
    pub phone: Option<String>,
    #[validate(length(max = 1024))]
    pub website: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub images: Option<Vec<String>>,
}

impl RegisterServiceRequest {
    pub fn into_new_owner_and_service(self, password_hash: String) -> (NewUser, NewService) {
        let now = Utc::now();
        let owner = NewUser {
            id: Uuid::new_v4(),
            full_name: self.owner_full_name,
            email: self.owner_email,
            phone: Some(self.owner_phone),
            password_hash: Some(password_hash),
            role: UserRole::Service,
            profile_picture_url: None,
            phone_verified: true,
            created_at: now,
            updated_at: now,
        };
        let service = NewService {
            id: Uuid::new_v4(),
            owner_user_id: owner.id,
            name: self.name,
            category: self.category,
            description: self.description,
            address: self.address,
            phone: self.phone,
            website: self.website,
            email: self.email,
            images: images_value(self.images),
            status: ListingStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        (owner, service)
    }
}

/// Owner/admin update of a listing's profile fields
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateListingRequest {
    #[validate(length(min = 3, max = 120))]
    pub name: String,
    #[validate(length(min = 2, max = 120))]
    pub category: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(min = 5, max = 300))]
    pub address: String,
    #[validate(length(min = 7, max = 20))]
    pub phone: Option<String>,
    #[validate(length(max = 1024))]
    pub website: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub images: Option<Vec<String>>,
}

impl UpdateListingRequest {
    pub fn apply_to_business(&self, existing: &mut Business) {
        existing.name = self.name.clone();
        existing.category = self.category.clone();
        existing.description = self.description.clone();
        existing.address = self.address.clone();
        existing.phone = self.phone.clone();
        existing.website = self.website.clone();
        existing.email = self.email.clone();
        if let Some(images) = &self.images {
            existing.images = images_value(Some(images.clone()));
        }
        existing.updated_at = Utc::now();
    }

    pub fn apply_to_service(&self, existing: &mut Service) {
        existing.name = self.name.clone();
        existing.category = self.category.clone();
        existing.description = self.description.clone();
        existing.address = self.address.clone();
        existing.phone = self.phone.clone();
        existing.website = self.website.clone();
        existing.email = self.email.clone();
        if let Some(images) = &self.images {
            existing.images = images_value(Some(images.clone()));
        }
        existing.updated_at = Utc::now();
    }
}

/// Review submission
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    pub listing_type: ListingType,
    pub listing_id: Uuid,
    #[validate(range(min = 1, max = 5))]
    pub star_rating: i32,
    #[validate(length(min = 1, max = 2000))]
    pub comment: String,
}

impl CreateReviewRequest {
    pub fn into_new_review(self, user_id: Uuid) -> NewReview {
        let now = Utc::now();
        NewReview {
            id: Uuid::new_v4(),
            user_id,
            listing_type: self.listing_type,
            listing_id: self.listing_id,
            star_rating: self.star_rating,
            comment: self.comment,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Single-level owner reply to a review
#[derive(Debug, Deserialize, Validate)]
pub struct ReplyReviewRequest {
    #[validate(length(min = 1, max = 2000))]
    pub reply: String,
}

/// Ownership claim submission
#[derive(Debug, Deserialize, Validate)]
pub struct CreateClaimRequest {
    pub business_id: Uuid,
    #[validate(length(min = 1, max = 1024))]
    pub proof_document_url: String,
    #[validate(length(max = 2000))]
    pub message: Option<String>,
}

impl CreateClaimRequest {
    pub fn into_new_claim(self, claimant_user_id: Uuid) -> NewClaim {
        let now = Utc::now();
        NewClaim {
            id: Uuid::new_v4(),
            business_id: self.business_id,
            claimant_user_id,
            status: ClaimStatus::Pending,
            proof_document_url: self.proof_document_url,
            message: self.message,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Rejection payload shared by claim and listing moderation
#[derive(Debug, Deserialize, Validate)]
pub struct RejectRequest {
    #[validate(length(min = 1, max = 2000))]
    pub reason: String,
}

/// Admin decision on a pending listing
#[derive(Debug, Deserialize)]
pub struct SetListingStatusRequest {
    pub status: ListingStatus,
    pub reason: Option<String>,
}

impl SetListingStatusRequest {
    pub fn validate_business_rules(&self) -> Result<(), String> {
        match self.status {
            ListingStatus::Pending => Err("A listing cannot be moved back to pending".into()),
            ListingStatus::Rejected if self.reason.is_none() => {
                Err("A reason is required when rejecting a listing".into())
            }
            _ => Ok(()),
        }
    }
}

/// Payment initialization payload
#[derive(Debug, Deserialize)]
pub struct InitializePaymentRequest {
    pub entity_type: PaymentEntityType,
    pub entity_id: Uuid,
}

/// Settings upsert payload
#[derive(Debug, Deserialize, Validate)]
pub struct UpsertSettingRequest {
    #[validate(length(min = 1, max = 100))]
    pub key: String,
    pub value: Value,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendOtpRequest {
    #[validate(length(min = 7, max = 20))]
    pub phone: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(length(min = 7, max = 20))]
    pub phone: String,
    #[validate(length(equal = 6))]
    pub code: String,
}

// ============================================================================
// COMPOSITE RESPONSE TYPES
// ============================================================================

/// Moderation queue for the admin dashboard
#[derive(Debug, Serialize)]
pub struct PendingListings {
    pub businesses: Vec<Business>,
    pub services: Vec<Service>,
}

/// Aggregated counters for the admin dashboard
#[derive(Debug, Serialize)]
pub struct AdminStats {
    pub pending_businesses: i64,
    pub pending_services: i64,
    pub verified_listings: i64,
    pub rejected_listings: i64,
    pub reviews_today: i64,
}

/// Stored paths returned by the multipart upload endpoint
#[derive(Debug, Default, Serialize)]
pub struct UploadResponse {
    pub images: Vec<String>,
    pub proofs: Vec<String>,
}

fn images_value(images: Option<Vec<String>>) -> Value {
    serde_json::to_value(images.unwrap_or_default()).unwrap_or(Value::Array(Vec::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_is_rounded_to_one_decimal() {
        assert_eq!(round_average(&[4, 4, 5]), 4.3);
        assert_eq!(round_average(&[1, 2]), 1.5);
        assert_eq!(round_average(&[5]), 5.0);
        assert_eq!(round_average(&[]), 0.0);
        assert_eq!(round_average(&[2, 2, 3, 3, 3]), 2.6);
    }

    #[test]
    fn payment_status_never_moves_backward() {
        use PaymentStatus::*;
        assert!(Processing.can_transition_to(Successful));
        assert!(Processing.can_transition_to(Failed));
        assert!(!Successful.can_transition_to(Failed));
        assert!(!Successful.can_transition_to(Processing));
        assert!(!Failed.can_transition_to(Successful));
        assert!(!Processing.can_transition_to(Processing));
    }

    #[test]
    fn claims_resolve_only_from_pending() {
        assert!(ClaimStatus::Pending.can_resolve());
        assert!(!ClaimStatus::Approved.can_resolve());
        assert!(!ClaimStatus::Rejected.can_resolve());
    }

    #[test]
    fn registered_businesses_start_pending_and_unclaimed() {
        let request = RegisterBusinessRequest {
            owner_full_name: "Ada Chukwu".into(),
            owner_email: "ada@example.com".into(),
            owner_phone: None,
            name: "Ada's Bakery".into(),
            category: "Food".into(),
            description: None,
            address: "12 Allen Avenue, Ikeja".into(),
            phone: None,
            website: None,
            email: None,
            images: None,
        };
        let (owner, business) = request.into_new_owner_and_business("hash".into());
        assert_eq!(business.owner_user_id, owner.id);
        assert_eq!(business.status, ListingStatus::Pending);
        assert!(!business.claimed);
    }

    #[test]
    fn otp_expiry_and_attempts() {
        let now = Utc::now();
        let otp = OtpCode {
            phone: "+15550001111".into(),
            code: "123456".into(),
            attempts: 0,
            verified: false,
            expires_at: now + chrono::Duration::minutes(10),
            created_at: now,
        };
        assert!(!otp.is_expired(now));
        assert!(otp.is_expired(now + chrono::Duration::minutes(10)));
        assert!(!otp.attempts_exhausted());

        let worn = OtpCode {
            attempts: MAX_OTP_ATTEMPTS,
            ..otp
        };
        assert!(worn.attempts_exhausted());
    }

    #[test]
    fn listing_status_requests_are_checked() {
        let approve = SetListingStatusRequest {
            status: ListingStatus::Verified,
            reason: None,
        };
        assert!(approve.validate_business_rules().is_ok());

        let silent_reject = SetListingStatusRequest {
            status: ListingStatus::Rejected,
            reason: None,
        };
        assert!(silent_reject.validate_business_rules().is_err());

        let back_to_pending = SetListingStatusRequest {
            status: ListingStatus::Pending,
            reason: None,
        };
        assert!(back_to_pending.validate_business_rules().is_err());
    }

    #[test]
    fn review_request_validation_bounds() {
        let bad = CreateReviewRequest {
            listing_type: ListingType::Business,
            listing_id: Uuid::new_v4(),
            star_rating: 6,
            comment: "too high".into(),
        };
        assert!(bad.validate().is_err());

        let good = CreateReviewRequest {
            star_rating: 5,
            ..bad
        };
        assert!(good.validate().is_ok());
    }
}
