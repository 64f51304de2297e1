use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::{
        orders::OrderData,
        payments::{
            CreateIntentRequest, CreateIntentResponse, IntentOrder, VerifiedOrder,
            VerifyPaymentRequest, VerifyPaymentResponse,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    pricing,
    services::order_service::{self, CommitArgs, DeclaredTotals, PaymentCapture},
    state::AppState,
};

/// Creates a gateway intent for the rupee amount. Nothing is written locally;
/// the intent only links to an order once its payment verifies.
pub async fn create_intent(
    state: &AppState,
    user: &AuthUser,
    payload: CreateIntentRequest,
) -> AppResult<CreateIntentResponse> {
    let CreateIntentRequest {
        amount,
        currency,
        receipt,
        notes,
    } = payload;

    if amount <= rust_decimal::Decimal::ZERO {
        return Err(AppError::BadRequest("amount must be greater than 0".into()));
    }
    let amount_minor = pricing::to_minor_units(amount)
        .ok_or_else(|| AppError::BadRequest("amount out of range".into()))?;

    let currency = currency.unwrap_or_else(|| "INR".to_string());
    let receipt = receipt.unwrap_or_else(default_receipt);

    let order = state
        .gateway
        .create_order(amount_minor, &currency, &receipt, notes.as_ref())
        .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "payment_intent_created",
        Some("payments"),
        Some(serde_json::json!({ "intent_id": order.id, "amount": order.amount })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(CreateIntentResponse {
        success: true,
        order: IntentOrder {
            id: order.id,
            amount: order.amount,
            currency: order.currency,
            receipt: order.receipt,
        },
    })
}

/// The signature is the only proof money moved. A verified one leads into
/// the transactional order commit with payment recorded as completed; a bad
/// one fails closed before anything is written.
pub async fn verify_and_commit(
    state: &AppState,
    user: &AuthUser,
    payload: VerifyPaymentRequest,
) -> AppResult<VerifyPaymentResponse> {
    let VerifyPaymentRequest {
        intent_id,
        payment_id,
        signature,
        order_data,
    } = payload;

    if intent_id.is_empty() || payment_id.is_empty() || signature.is_empty() {
        return Err(AppError::BadRequest(
            "Missing payment verification fields".into(),
        ));
    }

    if !state
        .gateway
        .verify_signature(&intent_id, &payment_id, &signature)
    {
        if let Err(err) = log_audit(
            &state.pool,
            Some(user.user_id),
            "payment_rejected",
            Some("payments"),
            Some(serde_json::json!({ "intent_id": intent_id, "payment_id": payment_id })),
        )
        .await
        {
            tracing::warn!(error = %err, "audit log failed");
        }
        return Err(AppError::InvalidSignature);
    }

    let OrderData {
        items,
        table_id,
        coupon_id,
        subtotal,
        discount,
        total,
    } = order_data;

    let committed = order_service::commit_order(
        state,
        user,
        CommitArgs {
            items,
            table_id,
            coupon_id,
            payment: Some(PaymentCapture {
                payment_id: payment_id.clone(),
            }),
            declared: Some(DeclaredTotals {
                subtotal,
                discount,
                total,
            }),
        },
    )
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "payment_verified",
        Some("payments"),
        Some(serde_json::json!({
            "intent_id": intent_id,
            "payment_id": payment_id,
            "order_id": committed.order.id,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(VerifyPaymentResponse {
        success: true,
        order: VerifiedOrder {
            id: committed.order.id,
            order_number: committed.order.order_number,
        },
    })
}

fn default_receipt() -> String {
    let id = Uuid::new_v4().to_string();
    format!("order_rcpt_{}", &id[..8])
}
