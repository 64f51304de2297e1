use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::orders::{OrderStatus, PaymentStatus};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OrderItemInput {
    pub menu_item_id: Uuid,
    pub quantity: i32,
}

/// Pay-at-counter order. The server prices every line from the live menu,
/// so the client sends no amounts.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemInput>,
    pub table_id: Uuid,
    pub coupon_id: Option<Uuid>,
}

/// Client-declared order carried inside a payment verification. The declared
/// totals are cross-checked against server pricing before anything persists.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OrderData {
    pub items: Vec<OrderItemInput>,
    pub table_id: Uuid,
    pub coupon_id: Option<Uuid>,
    #[schema(value_type = f64)]
    pub subtotal: Decimal,
    #[schema(value_type = f64)]
    pub discount: Decimal,
    #[schema(value_type = f64)]
    pub total: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderView {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub table_id: Uuid,
    pub coupon_id: Option<Uuid>,
    #[schema(value_type = f64)]
    pub subtotal: Decimal,
    #[schema(value_type = f64)]
    pub discount: Decimal,
    #[schema(value_type = f64)]
    pub total: Decimal,
    #[schema(value_type = String)]
    pub status: OrderStatus,
    pub payment_id: Option<String>,
    #[schema(value_type = String)]
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemView {
    pub id: Uuid,
    pub menu_item_id: Uuid,
    pub name: String,
    pub quantity: i32,
    #[schema(value_type = f64)]
    pub unit_price: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: OrderView,
    pub items: Vec<OrderItemView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<OrderView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MyOrdersList {
    pub items: Vec<OrderWithItems>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BoardItem {
    pub name: String,
    pub quantity: i32,
}

/// Kitchen display row: everything a screen needs without a follow-up query.
#[derive(Debug, Serialize, ToSchema)]
pub struct BoardOrder {
    pub id: Uuid,
    pub order_number: String,
    #[schema(value_type = String)]
    pub status: OrderStatus,
    pub table_number: i32,
    pub created_at: DateTime<Utc>,
    pub items: Vec<BoardItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BoardList {
    pub items: Vec<BoardOrder>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_orders: i64,
    pub pending: i64,
    pub preparing: i64,
    pub ready: i64,
    pub served: i64,
    pub today_orders: i64,
    #[schema(value_type = f64)]
    pub today_revenue: Decimal,
}
