//! Order creation and payment verification handlers.

use axum::extract::{Json, State};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::handlers::courses::CourseSummary;
use crate::middleware::AuthUser;
use crate::services::razorpay::PaymentVerification;
use crate::AppState;

/// Request to create an order for a set of catalog courses.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(rename = "courseIds")]
    pub course_ids: Vec<i64>,
}

/// Response after creating an order.
#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub order: OrderResponse,
    pub courses: Vec<CourseSummary>,
    /// Total in major currency units.
    pub amount: i64,
    /// Razorpay key id for frontend checkout initialization.
    #[serde(rename = "keyId")]
    pub key_id: String,
}

/// Provider order fields the frontend needs for checkout.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: String,
    /// Amount in minor currency units, as held by the provider.
    pub amount: u64,
    pub currency: String,
    pub receipt: Option<String>,
    pub status: String,
}

/// Payment proof submitted by the client after checkout.
///
/// `courseIds` is accepted for client compatibility but the grant always
/// uses the course set persisted with the order.
#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
    #[serde(rename = "courseIds", default)]
    pub course_ids: Option<Vec<i64>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentResponse {
    pub success: bool,
    /// Course ids newly granted by this verification.
    pub granted_course_ids: Vec<i64>,
    /// Course ids that were already owned (retried verification).
    pub already_owned_course_ids: Vec<i64>,
}

/// Create a Razorpay order for the requested courses.
///
/// POST /api/payment/create-order
pub async fn create_order(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<Json<CreateOrderResponse>, AppError> {
    tracing::info!(
        user_id = %claims.sub,
        course_ids = ?payload.course_ids,
        "Creating order"
    );

    let (provider_order, selection) = state
        .orders
        .create_order(claims.sub, &payload.course_ids)
        .await?;

    Ok(Json(CreateOrderResponse {
        order: OrderResponse {
            id: provider_order.id,
            amount: provider_order.amount,
            currency: provider_order.currency,
            receipt: provider_order.receipt,
            status: provider_order.status,
        },
        courses: selection
            .courses
            .into_iter()
            .map(CourseSummary::from)
            .collect(),
        amount: selection.amount,
        key_id: state.razorpay.key_id().to_string(),
    }))
}

/// Verify a completed payment and grant course access.
///
/// POST /api/payment/verify
pub async fn verify_payment(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<VerifyPaymentRequest>,
) -> Result<Json<VerifyPaymentResponse>, AppError> {
    let verification = PaymentVerification {
        razorpay_order_id: payload.razorpay_order_id,
        razorpay_payment_id: payload.razorpay_payment_id,
        razorpay_signature: payload.razorpay_signature,
    };

    let granted = state
        .grants
        .verify_and_grant(claims.sub, &verification, payload.course_ids.as_deref())
        .await?;

    Ok(Json(VerifyPaymentResponse {
        success: true,
        granted_course_ids: granted.granted,
        already_owned_course_ids: granted.already_owned,
    }))
}
