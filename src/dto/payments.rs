use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::orders::OrderData;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateIntentRequest {
    /// Amount in rupees; converted to paise for the gateway.
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub currency: Option<String>,
    pub receipt: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub notes: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IntentOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub receipt: Option<String>,
}

// The two payment endpoints predate the envelope and keep their original
// flat `{success, order}` / `{error}` bodies.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateIntentResponse {
    pub success: bool,
    pub order: IntentOrder,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyPaymentRequest {
    pub intent_id: String,
    pub payment_id: String,
    pub signature: String,
    pub order_data: OrderData,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerifiedOrder {
    pub id: Uuid,
    pub order_number: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub order: VerifiedOrder,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentErrorBody {
    pub error: String,
}
