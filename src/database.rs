use std::{borrow::Cow, collections::HashMap, time::Duration};

use chrono::{DateTime, Utc};
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    Connection, Executor, PgPool, Postgres, Row, Transaction,
};
use uuid::Uuid;

use crate::models::{
    round_average, AdminSetting, AdminStats, Business, Claim, ClaimStatus, ListingStatus,
    ListingType, NewBusiness, NewClaim, NewPayment, NewReview, NewService, NewUser, OtpCode,
    Payment, PaymentStatus, Review, Service, User,
};

const USER_COLUMNS: &str = "id, full_name, email, phone, password_hash, role, \
     profile_picture_url, phone_verified, reset_token, reset_token_expires_at, \
     created_at, updated_at";

const BUSINESS_COLUMNS: &str = "id, owner_user_id, name, category, description, address, \
     phone, website, email, images, status, average_rating, claimed, proof_document_url, \
     rejection_reason, created_at, updated_at";

const SERVICE_COLUMNS: &str = "id, owner_user_id, name, category, description, address, \
     phone, website, email, images, status, average_rating, rejection_reason, \
     created_at, updated_at";

const REVIEW_COLUMNS: &str =
    "id, user_id, listing_type, listing_id, star_rating, comment, reply, created_at, updated_at";

const CLAIM_COLUMNS: &str = "id, business_id, claimant_user_id, status, proof_document_url, \
     message, rejection_reason, created_at, updated_at";

const PAYMENT_COLUMNS: &str = "id, user_id, entity_type, entity_id, amount_minor, currency, \
     status, gateway_reference, authorization_url, created_at, updated_at";

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = match PgPoolOptions::new()
            .max_connections(10)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Some(Duration::from_secs(600)))
            .test_before_acquire(true)
            .connect(database_url)
            .await
        {
            Ok(pool) => pool,
            Err(sqlx::Error::Database(db_err)) if db_err.code() == Some(Cow::Borrowed("3D000")) => {
                log::info!("Database missing, attempting to create it");
                create_database_if_missing(database_url).await?;

                PgPoolOptions::new()
                    .max_connections(10)
                    .min_connections(2)
                    .acquire_timeout(Duration::from_secs(5))
                    .idle_timeout(Some(Duration::from_secs(600)))
                    .test_before_acquire(true)
                    .connect(database_url)
                    .await?
            }
            Err(err) => return Err(err),
        };

        // Run embedded migrations
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    // ========================================================================
    // USERS
    // ========================================================================

    pub async fn create_user(&self, user: NewUser) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (
                id, full_name, email, phone, password_hash, role,
                profile_picture_url, phone_verified, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(user.full_name)
        .bind(user.email)
        .bind(user.phone)
        .bind(user.password_hash)
        .bind(user.role)
        .bind(user.profile_picture_url)
        .bind(user.phone_verified)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn list_users(&self) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        full_name: &str,
        phone: Option<&str>,
        profile_picture_url: Option<&str>,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET full_name = $2, phone = $3, profile_picture_url = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(full_name)
        .bind(phone)
        .bind(profile_picture_url)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn set_password_hash(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_reset_token(
        &self,
        user_id: Uuid,
        token: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET reset_token = $2, reset_token_expires_at = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_user_by_reset_token(&self, token: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE reset_token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await
    }

    /// Stores the new credential and consumes the reset token.
    pub async fn reset_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, reset_token = NULL, reset_token_expires_at = NULL,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Deleting a user cascades to their reviews, so every listing they
    /// rated gets its average recomputed in the same transaction.
    pub async fn delete_user(&self, user_id: Uuid) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let rated: Vec<(ListingType, Uuid)> = sqlx::query_as(
            "SELECT DISTINCT listing_type, listing_id FROM reviews WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(tx.as_mut())
        .await?;

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(tx.as_mut())
            .await?;
        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        for (listing_type, listing_id) in rated {
            Self::refresh_average(&mut tx, listing_type, listing_id).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    // ========================================================================
    // BUSINESSES
    // ========================================================================

    /// Owner account and pending listing are created together; a duplicate
    /// owner email aborts both.
    pub async fn register_business(
        &self,
        owner: NewUser,
        business: NewBusiness,
    ) -> Result<(User, Business), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let user = Self::insert_user(&mut tx, owner).await?;

        let record = sqlx::query_as::<_, Business>(&format!(
            r#"
            INSERT INTO businesses (
                id, owner_user_id, name, category, description, address,
                phone, website, email, images, status, claimed, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {BUSINESS_COLUMNS}
            "#
        ))
        .bind(business.id)
        .bind(business.owner_user_id)
        .bind(business.name)
        .bind(business.category)
        .bind(business.description)
        .bind(business.address)
        .bind(business.phone)
        .bind(business.website)
        .bind(business.email)
        .bind(business.images)
        .bind(business.status)
        .bind(business.claimed)
        .bind(business.created_at)
        .bind(business.updated_at)
        .fetch_one(tx.as_mut())
        .await?;

        tx.commit().await?;

        Ok((user, record))
    }

    async fn insert_user(
        tx: &mut Transaction<'_, Postgres>,
        user: NewUser,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (
                id, full_name, email, phone, password_hash, role,
                profile_picture_url, phone_verified, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(user.full_name)
        .bind(user.email)
        .bind(user.phone)
        .bind(user.password_hash)
        .bind(user.role)
        .bind(user.profile_picture_url)
        .bind(user.phone_verified)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(tx.as_mut())
        .await
    }

    pub async fn get_business(&self, business_id: Uuid) -> Result<Option<Business>, sqlx::Error> {
        sqlx::query_as::<_, Business>(&format!(
            "SELECT {BUSINESS_COLUMNS} FROM businesses WHERE id = $1"
        ))
        .bind(business_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Verified businesses matching an optional text filter and category.
    pub async fn list_verified_businesses(
        &self,
        q: Option<&str>,
        category: Option<&str>,
    ) -> Result<Vec<Business>, sqlx::Error> {
        let pattern = q.map(|q| format!("%{}%", q));
        sqlx::query_as::<_, Business>(&format!(
            r#"
            SELECT {BUSINESS_COLUMNS}
            FROM businesses
            WHERE status = 'verified'
              AND ($1::text IS NULL OR name ILIKE $1 OR category ILIKE $1 OR description ILIKE $1)
              AND ($2::text IS NULL OR category = $2)
            ORDER BY created_at DESC, id
            "#
        ))
        .bind(pattern)
        .bind(category)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn list_businesses_for_owner(
        &self,
        owner_user_id: Uuid,
    ) -> Result<Vec<Business>, sqlx::Error> {
        sqlx::query_as::<_, Business>(&format!(
            r#"
            SELECT {BUSINESS_COLUMNS}
            FROM businesses
            WHERE owner_user_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(owner_user_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn update_business(&self, business: Business) -> Result<Business, sqlx::Error> {
        sqlx::query_as::<_, Business>(&format!(
            r#"
            UPDATE businesses
            SET name = $2, category = $3, description = $4, address = $5, phone = $6,
                website = $7, email = $8, images = $9, updated_at = NOW()
            WHERE id = $1
            RETURNING {BUSINESS_COLUMNS}
            "#
        ))
        .bind(business.id)
        .bind(business.name)
        .bind(business.category)
        .bind(business.description)
        .bind(business.address)
        .bind(business.phone)
        .bind(business.website)
        .bind(business.email)
        .bind(business.images)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn set_business_status(
        &self,
        business_id: Uuid,
        status: ListingStatus,
        rejection_reason: Option<&str>,
    ) -> Result<Business, sqlx::Error> {
        sqlx::query_as::<_, Business>(&format!(
            r#"
            UPDATE businesses
            SET status = $2, rejection_reason = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {BUSINESS_COLUMNS}
            "#
        ))
        .bind(business_id)
        .bind(status)
        .bind(rejection_reason)
        .fetch_one(&self.pool)
        .await
    }

    /// Deletes the business, its reviews and its owning user in one
    /// transaction. The business row itself goes via the FK cascade when the
    /// user row is removed.
    pub async fn delete_business_cascade(&self, business_id: Uuid) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let owner_user_id: Uuid =
            sqlx::query_scalar("SELECT owner_user_id FROM businesses WHERE id = $1")
                .bind(business_id)
                .fetch_one(tx.as_mut())
                .await?;

        sqlx::query("DELETE FROM reviews WHERE listing_type = 'business' AND listing_id = $1")
            .bind(business_id)
            .execute(tx.as_mut())
            .await?;

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(owner_user_id)
            .execute(tx.as_mut())
            .await?;

        tx.commit().await?;

        Ok(())
    }

    pub async fn list_pending_businesses(&self) -> Result<Vec<Business>, sqlx::Error> {
        sqlx::query_as::<_, Business>(&format!(
            r#"
            SELECT {BUSINESS_COLUMNS}
            FROM businesses
            WHERE status = 'pending'
            ORDER BY created_at ASC
            "#
        ))
        .fetch_all(&self.pool)
        .await
    }

    // ========================================================================
    // SERVICES
    // ========================================================================

    pub async fn register_service(
        &self,
        owner: NewUser,
        service: NewService,
    ) -> Result<(User, Service), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let user = Self::insert_user(&mut tx, owner).await?;

        let record = sqlx::query_as::<_, Service>(&format!(
            r#"
            INSERT INTO services (
                id, owner_user_id, name, category, description, address,
                phone, website, email, images, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {SERVICE_COLUMNS}
            "#
        ))
        .bind(service.id)
        .bind(service.owner_user_id)
        .bind(service.name)
        .bind(service.category)
        .bind(service.description)
        .bind(service.address)
        .bind(service.phone)
        .bind(service.website)
        .bind(service.email)
        .bind(service.images)
        .bind(service.status)
        .bind(service.created_at)
        .bind(service.updated_at)
        .fetch_one(tx.as_mut())
        .await?;

        tx.commit().await?;

        Ok((user, record))
    }

    pub async fn get_service(&self, service_id: Uuid) -> Result<Option<Service>, sqlx::Error> {
        sqlx::query_as::<_, Service>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM services WHERE id = $1"
        ))
        .bind(service_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn list_verified_services(
        &self,
        q: Option<&str>,
        category: Option<&str>,
    ) -> Result<Vec<Service>, sqlx::Error> {
        let pattern = q.map(|q| format!("%{}%", q));
        sqlx::query_as::<_, Service>(&format!(
            r#"
            SELECT {SERVICE_COLUMNS}
            FROM services
            WHERE status = 'verified'
              AND ($1::text IS NULL OR name ILIKE $1 OR category ILIKE $1 OR description ILIKE $1)
              AND ($2::text IS NULL OR category = $2)
            ORDER BY created_at DESC, id
            "#
        ))
        .bind(pattern)
        .bind(category)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn list_services_for_owner(
        &self,
        owner_user_id: Uuid,
    ) -> Result<Vec<Service>, sqlx::Error> {
        sqlx::query_as::<_, Service>(&format!(
            r#"
            SELECT {SERVICE_COLUMNS}
            FROM services
            WHERE owner_user_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(owner_user_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn update_service(&self, service: Service) -> Result<Service, sqlx::Error> {
        sqlx::query_as::<_, Service>(&format!(
            r#"
            UPDATE services
            SET name = $2, category = $3, description = $4, address = $5, phone = $6,
                website = $7, email = $8, images = $9, updated_at = NOW()
            WHERE id = $1
            RETURNING {SERVICE_COLUMNS}
            "#
        ))
        .bind(service.id)
        .bind(service.name)
        .bind(service.category)
        .bind(service.description)
        .bind(service.address)
        .bind(service.phone)
        .bind(service.website)
        .bind(service.email)
        .bind(service.images)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn set_service_status(
        &self,
        service_id: Uuid,
        status: ListingStatus,
        rejection_reason: Option<&str>,
    ) -> Result<Service, sqlx::Error> {
        sqlx::query_as::<_, Service>(&format!(
            r#"
            UPDATE services
            SET status = $2, rejection_reason = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {SERVICE_COLUMNS}
            "#
        ))
        .bind(service_id)
        .bind(status)
        .bind(rejection_reason)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn delete_service_cascade(&self, service_id: Uuid) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let owner_user_id: Uuid =
            sqlx::query_scalar("SELECT owner_user_id FROM services WHERE id = $1")
                .bind(service_id)
                .fetch_one(tx.as_mut())
                .await?;

        sqlx::query("DELETE FROM reviews WHERE listing_type = 'service' AND listing_id = $1")
            .bind(service_id)
            .execute(tx.as_mut())
            .await?;

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(owner_user_id)
            .execute(tx.as_mut())
            .await?;

        tx.commit().await?;

        Ok(())
    }

    pub async fn list_pending_services(&self) -> Result<Vec<Service>, sqlx::Error> {
        sqlx::query_as::<_, Service>(&format!(
            r#"
            SELECT {SERVICE_COLUMNS}
            FROM services
            WHERE status = 'pending'
            ORDER BY created_at ASC
            "#
        ))
        .fetch_all(&self.pool)
        .await
    }

    // ========================================================================
    // REVIEWS
    // ========================================================================

    /// Inserts the review and recomputes the listing's denormalized average
    /// in the same transaction. The (user, listing) unique constraint
    /// surfaces duplicates as a database error.
    pub async fn create_review_with_aggregate(
        &self,
        review: NewReview,
    ) -> Result<Review, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, Review>(&format!(
            r#"
            INSERT INTO reviews (
                id, user_id, listing_type, listing_id, star_rating, comment,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {REVIEW_COLUMNS}
            "#
        ))
        .bind(review.id)
        .bind(review.user_id)
        .bind(review.listing_type)
        .bind(review.listing_id)
        .bind(review.star_rating)
        .bind(review.comment)
        .bind(review.created_at)
        .bind(review.updated_at)
        .fetch_one(tx.as_mut())
        .await?;

        Self::refresh_average(&mut tx, record.listing_type, record.listing_id).await?;

        tx.commit().await?;

        Ok(record)
    }

    /// Removes the review and recomputes the listing average transactionally.
    pub async fn delete_review_with_aggregate(&self, review_id: Uuid) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let review = sqlx::query_as::<_, Review>(&format!(
            "DELETE FROM reviews WHERE id = $1 RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(review_id)
        .fetch_one(tx.as_mut())
        .await?;

        Self::refresh_average(&mut tx, review.listing_type, review.listing_id).await?;

        tx.commit().await?;

        Ok(())
    }

    async fn refresh_average(
        tx: &mut Transaction<'_, Postgres>,
        listing_type: ListingType,
        listing_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        let ratings: Vec<i32> = sqlx::query_scalar(
            "SELECT star_rating FROM reviews WHERE listing_type = $1 AND listing_id = $2",
        )
        .bind(listing_type)
        .bind(listing_id)
        .fetch_all(tx.as_mut())
        .await?;

        let average = round_average(&ratings);

        let sql = match listing_type {
            ListingType::Business => {
                "UPDATE businesses SET average_rating = $2, updated_at = NOW() WHERE id = $1"
            }
            ListingType::Service => {
                "UPDATE services SET average_rating = $2, updated_at = NOW() WHERE id = $1"
            }
        };
        sqlx::query(sql)
            .bind(listing_id)
            .bind(average)
            .execute(tx.as_mut())
            .await?;

        Ok(())
    }

    pub async fn get_review(&self, review_id: Uuid) -> Result<Option<Review>, sqlx::Error> {
        sqlx::query_as::<_, Review>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1"
        ))
        .bind(review_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn list_reviews_for_listing(
        &self,
        listing_type: ListingType,
        listing_id: Uuid,
    ) -> Result<Vec<Review>, sqlx::Error> {
        sqlx::query_as::<_, Review>(&format!(
            r#"
            SELECT {REVIEW_COLUMNS}
            FROM reviews
            WHERE listing_type = $1 AND listing_id = $2
            ORDER BY created_at DESC
            "#
        ))
        .bind(listing_type)
        .bind(listing_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn list_reviews_for_user(&self, user_id: Uuid) -> Result<Vec<Review>, sqlx::Error> {
        sqlx::query_as::<_, Review>(&format!(
            r#"
            SELECT {REVIEW_COLUMNS}
            FROM reviews
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn set_review_reply(
        &self,
        review_id: Uuid,
        reply: &str,
    ) -> Result<Review, sqlx::Error> {
        sqlx::query_as::<_, Review>(&format!(
            r#"
            UPDATE reviews
            SET reply = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {REVIEW_COLUMNS}
            "#
        ))
        .bind(review_id)
        .bind(reply)
        .fetch_one(&self.pool)
        .await
    }

    /// Review counts for a batch of listing ids of one kind.
    pub async fn review_counts(
        &self,
        listing_type: ListingType,
        listing_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, i64>, sqlx::Error> {
        if listing_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(Uuid, i64)> = sqlx::query_as(
            r#"
            SELECT listing_id, COUNT(*)
            FROM reviews
            WHERE listing_type = $1 AND listing_id = ANY($2)
            GROUP BY listing_id
            "#,
        )
        .bind(listing_type)
        .bind(listing_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    // ========================================================================
    // CLAIMS
    // ========================================================================

    pub async fn create_claim(&self, claim: NewClaim) -> Result<Claim, sqlx::Error> {
        sqlx::query_as::<_, Claim>(&format!(
            r#"
            INSERT INTO claims (
                id, business_id, claimant_user_id, status, proof_document_url,
                message, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {CLAIM_COLUMNS}
            "#
        ))
        .bind(claim.id)
        .bind(claim.business_id)
        .bind(claim.claimant_user_id)
        .bind(claim.status)
        .bind(claim.proof_document_url)
        .bind(claim.message)
        .bind(claim.created_at)
        .bind(claim.updated_at)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn get_claim(&self, claim_id: Uuid) -> Result<Option<Claim>, sqlx::Error> {
        sqlx::query_as::<_, Claim>(&format!("SELECT {CLAIM_COLUMNS} FROM claims WHERE id = $1"))
            .bind(claim_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn list_claims(
        &self,
        status: Option<ClaimStatus>,
    ) -> Result<Vec<Claim>, sqlx::Error> {
        sqlx::query_as::<_, Claim>(&format!(
            r#"
            SELECT {CLAIM_COLUMNS}
            FROM claims
            WHERE ($1::claim_status IS NULL OR status = $1)
            ORDER BY created_at ASC
            "#
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn list_claims_for_claimant(
        &self,
        claimant_user_id: Uuid,
    ) -> Result<Vec<Claim>, sqlx::Error> {
        sqlx::query_as::<_, Claim>(&format!(
            r#"
            SELECT {CLAIM_COLUMNS}
            FROM claims
            WHERE claimant_user_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(claimant_user_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find_pending_claim(
        &self,
        business_id: Uuid,
        claimant_user_id: Uuid,
    ) -> Result<Option<Claim>, sqlx::Error> {
        sqlx::query_as::<_, Claim>(&format!(
            r#"
            SELECT {CLAIM_COLUMNS}
            FROM claims
            WHERE business_id = $1 AND claimant_user_id = $2 AND status = 'pending'
            "#
        ))
        .bind(business_id)
        .bind(claimant_user_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Approval deletes the claim row and, in the same transaction, copies
    /// the proof onto the business, marks it claimed and transfers
    /// ownership. Only a pending claim matches, so a second approval of the
    /// same id observes RowNotFound.
    pub async fn approve_claim(&self, claim_id: Uuid) -> Result<Business, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let claim = sqlx::query_as::<_, Claim>(&format!(
            r#"
            DELETE FROM claims
            WHERE id = $1 AND status = 'pending'
            RETURNING {CLAIM_COLUMNS}
            "#
        ))
        .bind(claim_id)
        .fetch_one(tx.as_mut())
        .await?;

        let business = sqlx::query_as::<_, Business>(&format!(
            r#"
            UPDATE businesses
            SET owner_user_id = $2, claimed = TRUE, proof_document_url = $3,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {BUSINESS_COLUMNS}
            "#
        ))
        .bind(claim.business_id)
        .bind(claim.claimant_user_id)
        .bind(&claim.proof_document_url)
        .fetch_one(tx.as_mut())
        .await?;

        tx.commit().await?;

        Ok(business)
    }

    pub async fn reject_claim(&self, claim_id: Uuid, reason: &str) -> Result<Claim, sqlx::Error> {
        sqlx::query_as::<_, Claim>(&format!(
            r#"
            UPDATE claims
            SET status = 'rejected', rejection_reason = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {CLAIM_COLUMNS}
            "#
        ))
        .bind(claim_id)
        .bind(reason)
        .fetch_one(&self.pool)
        .await
    }

    // ========================================================================
    // PAYMENTS
    // ========================================================================

    pub async fn create_payment(&self, payment: NewPayment) -> Result<Payment, sqlx::Error> {
        sqlx::query_as::<_, Payment>(&format!(
            r#"
            INSERT INTO payments (
                id, user_id, entity_type, entity_id, amount_minor, currency,
                status, gateway_reference, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(payment.id)
        .bind(payment.user_id)
        .bind(payment.entity_type)
        .bind(payment.entity_id)
        .bind(payment.amount_minor)
        .bind(payment.currency)
        .bind(payment.status)
        .bind(payment.gateway_reference)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn set_authorization_url(
        &self,
        payment_id: Uuid,
        authorization_url: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE payments SET authorization_url = $2, updated_at = NOW() WHERE id = $1")
            .bind(payment_id)
            .bind(authorization_url)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_payment_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Payment>, sqlx::Error> {
        sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE gateway_reference = $1"
        ))
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
    }

    /// Guarded transition: only a processing payment can be finalized, so a
    /// settled status never moves backward.
    pub async fn finalize_payment(
        &self,
        reference: &str,
        status: PaymentStatus,
    ) -> Result<Payment, sqlx::Error> {
        sqlx::query_as::<_, Payment>(&format!(
            r#"
            UPDATE payments
            SET status = $2, updated_at = NOW()
            WHERE gateway_reference = $1 AND status = 'processing'
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(reference)
        .bind(status)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn list_payments(&self) -> Result<Vec<Payment>, sqlx::Error> {
        sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
    }

    pub async fn list_payments_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Payment>, sqlx::Error> {
        sqlx::query_as::<_, Payment>(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS}
            FROM payments
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    // ========================================================================
    // ADMIN SETTINGS
    // ========================================================================

    pub async fn get_setting(&self, key: &str) -> Result<Option<AdminSetting>, sqlx::Error> {
        sqlx::query_as::<_, AdminSetting>(
            "SELECT key, value, updated_at FROM admin_settings WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn list_settings(&self) -> Result<Vec<AdminSetting>, sqlx::Error> {
        sqlx::query_as::<_, AdminSetting>(
            "SELECT key, value, updated_at FROM admin_settings ORDER BY key ASC",
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn upsert_setting(
        &self,
        key: &str,
        value: serde_json::Value,
    ) -> Result<AdminSetting, sqlx::Error> {
        sqlx::query_as::<_, AdminSetting>(
            r#"
            INSERT INTO admin_settings (key, value, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            RETURNING key, value, updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .fetch_one(&self.pool)
        .await
    }

    // ========================================================================
    // OTP
    // ========================================================================

    /// One live code per phone; resending replaces the previous code and
    /// resets the attempt counter.
    pub async fn upsert_otp(
        &self,
        phone: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<OtpCode, sqlx::Error> {
        sqlx::query_as::<_, OtpCode>(
            r#"
            INSERT INTO otp_codes (phone, code, attempts, verified, expires_at, created_at)
            VALUES ($1, $2, 0, FALSE, $3, NOW())
            ON CONFLICT (phone) DO UPDATE
            SET code = EXCLUDED.code, attempts = 0, verified = FALSE,
                expires_at = EXCLUDED.expires_at, created_at = NOW()
            RETURNING phone, code, attempts, verified, expires_at, created_at
            "#,
        )
        .bind(phone)
        .bind(code)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn get_otp(&self, phone: &str) -> Result<Option<OtpCode>, sqlx::Error> {
        sqlx::query_as::<_, OtpCode>(
            r#"
            SELECT phone, code, attempts, verified, expires_at, created_at
            FROM otp_codes
            WHERE phone = $1
            "#,
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn increment_otp_attempts(&self, phone: &str) -> Result<i32, sqlx::Error> {
        sqlx::query_scalar(
            "UPDATE otp_codes SET attempts = attempts + 1 WHERE phone = $1 RETURNING attempts",
        )
        .bind(phone)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn mark_otp_verified(&self, phone: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE otp_codes SET verified = TRUE WHERE phone = $1")
            .bind(phone)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete_otp(&self, phone: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM otp_codes WHERE phone = $1")
            .bind(phone)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ========================================================================
    // ADMIN STATS
    // ========================================================================

    pub async fn get_admin_stats(&self) -> Result<AdminStats, sqlx::Error> {
        let record = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM businesses WHERE status = 'pending') AS pending_businesses,
                (SELECT COUNT(*) FROM services WHERE status = 'pending') AS pending_services,
                (SELECT COUNT(*) FROM businesses WHERE status = 'verified')
                    + (SELECT COUNT(*) FROM services WHERE status = 'verified') AS verified_listings,
                (SELECT COUNT(*) FROM businesses WHERE status = 'rejected')
                    + (SELECT COUNT(*) FROM services WHERE status = 'rejected') AS rejected_listings,
                (SELECT COUNT(*) FROM reviews
                    WHERE created_at >= NOW() - INTERVAL '1 day') AS reviews_today
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(AdminStats {
            pending_businesses: record.try_get("pending_businesses")?,
            pending_services: record.try_get("pending_services")?,
            verified_listings: record.try_get("verified_listings")?,
            rejected_listings: record.try_get("rejected_listings")?,
            reviews_today: record.try_get("reviews_today")?,
        })
    }
}

async fn create_database_if_missing(database_url: &str) -> Result<(), sqlx::Error> {
    let options: PgConnectOptions = database_url.parse()?;
    let database_name = options
        .get_database()
        .map(|name| name.to_string())
        .unwrap_or_else(|| "postgres".to_string());

    // Already targeting the maintenance database, nothing to create.
    if database_name.eq_ignore_ascii_case("postgres") {
        return Ok(());
    }

    let maintenance_options = options.clone().database("postgres");

    let mut connection = sqlx::postgres::PgConnection::connect_with(&maintenance_options).await?;

    let escaped_name = database_name.replace('"', "\"\"");
    let create_stmt = format!("CREATE DATABASE \"{}\"", escaped_name);

    match connection.execute(create_stmt.as_str()).await {
        Ok(_) => {
            log::info!("Created database '{}'", database_name);
            Ok(())
        }
        Err(sqlx::Error::Database(db_err)) if db_err.code() == Some(Cow::Borrowed("42P04")) => {
            log::info!("Database '{}' already exists", database_name);
            Ok(())
        }
        Err(err) => Err(err),
    }
}
