use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::coupons::DiscountType;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApplyCouponRequest {
    pub code: String,
    #[schema(value_type = f64)]
    pub subtotal: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CouponDto {
    pub id: Uuid,
    pub code: String,
    #[schema(value_type = String)]
    pub discount_type: DiscountType,
    #[schema(value_type = f64)]
    pub discount_value: Decimal,
    #[schema(value_type = f64)]
    pub min_order: Decimal,
    pub max_uses: i32,
    pub used_count: i32,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Wire form of the validator outcome. `coupon` is set only when eligible,
/// `amount_short` only when the subtotal misses the minimum.
#[derive(Debug, Serialize, ToSchema)]
pub struct CouponVerdict {
    pub verdict: String,
    pub coupon: Option<CouponDto>,
    #[schema(value_type = Option<f64>)]
    pub amount_short: Option<Decimal>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CouponList {
    pub items: Vec<CouponDto>,
}
