use actix_web::{get, post, web, HttpResponse};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::clients::payments::PaymentGatewayClient;
use crate::database::Database;
use crate::errors::ApiError;
use crate::models::{
    ApiResponse, InitializePaymentRequest, NewPayment, PaymentEntityType, PaymentStatus,
};

const CURRENCY: &str = "NGN";

async fn entity_exists(
    db: &Database,
    entity_type: PaymentEntityType,
    entity_id: Uuid,
) -> Result<bool, ApiError> {
    let exists = match entity_type {
        PaymentEntityType::Business => db.get_business(entity_id).await?.is_some(),
        PaymentEntityType::Service => db.get_service(entity_id).await?.is_some(),
        PaymentEntityType::Claim => db.get_claim(entity_id).await?.is_some(),
    };
    Ok(exists)
}

/// Creates a processing payment priced from the admin settings, then asks
/// the gateway for a checkout session. A gateway failure finalizes the
/// payment as failed straight away.
#[post("/payment/initialize")]
pub async fn initialize_payment(
    db: web::Data<Database>,
    gateway: web::Data<PaymentGatewayClient>,
    caller: AuthenticatedUser,
    payload: web::Json<InitializePaymentRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = payload.into_inner();

    if !entity_exists(&db, body.entity_type, body.entity_id).await? {
        return Err(ApiError::NotFound("Payment target not found".into()));
    }

    let user = db
        .get_user(caller.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let price_key = body.entity_type.price_key();
    let amount_minor = db
        .get_setting(price_key)
        .await?
        .and_then(|s| s.value.as_i64())
        .ok_or_else(|| ApiError::Internal(format!("price setting '{price_key}' missing")))?;

    let now = Utc::now();
    let reference = Uuid::new_v4().to_string();
    let payment = db
        .create_payment(NewPayment {
            id: Uuid::new_v4(),
            user_id: caller.user_id,
            entity_type: body.entity_type,
            entity_id: body.entity_id,
            amount_minor,
            currency: CURRENCY.to_string(),
            status: PaymentStatus::Processing,
            gateway_reference: reference.clone(),
            created_at: now,
            updated_at: now,
        })
        .await?;

    let session = match gateway
        .initialize(&user.email, amount_minor, CURRENCY, &reference)
        .await
    {
        Ok(session) => session,
        Err(err) => {
            log::error!("Gateway initialize failed for {reference}: {err}");
            db.finalize_payment(&reference, PaymentStatus::Failed).await?;
            return Err(ApiError::Gateway("Could not start the payment".into()));
        }
    };

    db.set_authorization_url(payment.id, &session.authorization_url)
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(serde_json::json!({
        "payment": payment,
        "authorization_url": session.authorization_url,
        "reference": session.reference,
    }))))
}

/// Pull-based settlement: the caller re-checks the reference against the
/// gateway. Once a payment is final the stored status is returned as-is,
/// so repeated verification cannot flip it.
#[get("/payment/verify/{reference}")]
pub async fn verify_payment(
    db: web::Data<Database>,
    gateway: web::Data<PaymentGatewayClient>,
    caller: AuthenticatedUser,
    reference: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let reference = reference.into_inner();

    let payment = db
        .get_payment_by_reference(&reference)
        .await?
        .ok_or_else(|| ApiError::NotFound("Payment not found".into()))?;

    if !caller.can_act_for(payment.user_id) {
        return Err(ApiError::Forbidden(
            "This payment belongs to another user".into(),
        ));
    }

    if payment.status.is_final() {
        return Ok(HttpResponse::Ok().json(ApiResponse::success(payment)));
    }

    let verdict = gateway
        .verify(&reference)
        .await
        .map_err(|err| ApiError::Gateway(format!("Verification failed: {err}")))?;

    // Non-terminal gateway statuses (pending, abandoned checkout) leave the
    // payment processing so a later poll can still settle it.
    let payment = if verdict.is_successful() {
        db.finalize_payment(&reference, PaymentStatus::Successful)
            .await?
    } else if verdict.is_failed() {
        db.finalize_payment(&reference, PaymentStatus::Failed).await?
    } else {
        payment
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(payment)))
}

#[get("/payment/mine")]
pub async fn my_payments(
    db: web::Data<Database>,
    caller: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let payments = db.list_payments_for_user(caller.user_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(payments)))
}

#[get("/admin/payments")]
pub async fn list_payments(
    db: web::Data<Database>,
    caller: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    caller.require_admin()?;
    let payments = db.list_payments().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(payments)))
}
