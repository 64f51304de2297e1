use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::{
    dto::orders::{DashboardStats, MyOrdersList, OrderView, OrderWithItems},
    entity::orders::{Column as OrderCol, Entity as Orders, Model as OrderModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{CustomerSummary, StatusCount},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::order_service,
    state::AppState,
};

pub async fn dashboard_stats(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<DashboardStats>> {
    ensure_admin(user)?;

    let counts: Vec<StatusCount> =
        sqlx::query_as("SELECT status, COUNT(*) AS count FROM orders GROUP BY status")
            .fetch_all(&state.pool)
            .await?;

    let mut stats = DashboardStats {
        total_orders: 0,
        pending: 0,
        preparing: 0,
        ready: 0,
        served: 0,
        today_orders: 0,
        today_revenue: Decimal::ZERO,
    };
    for row in counts {
        stats.total_orders += row.count;
        match row.status.as_str() {
            "pending" => stats.pending = row.count,
            "preparing" => stats.preparing = row.count,
            "ready" => stats.ready = row.count,
            "served" => stats.served = row.count,
            _ => {}
        }
    }

    // Day boundary is the database clock, UTC in deployment.
    let today: (i64, Option<Decimal>) = sqlx::query_as(
        "SELECT COUNT(*), SUM(total) FILTER (WHERE payment_status = 'completed')
         FROM orders
         WHERE created_at >= date_trunc('day', now())",
    )
    .fetch_one(&state.pool)
    .await?;

    stats.today_orders = today.0;
    stats.today_revenue = today.1.unwrap_or(Decimal::ZERO);

    Ok(ApiResponse::success(
        "Dashboard",
        stats,
        Some(Meta::empty()),
    ))
}

pub async fn list_customers(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<Vec<CustomerSummary>>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM profiles WHERE role = 'customer'")
        .fetch_one(&state.pool)
        .await?;

    let customers: Vec<CustomerSummary> = sqlx::query_as(
        "SELECT p.id, p.email, p.full_name, p.created_at,
                COUNT(o.id) AS order_count,
                COALESCE(SUM(o.total), 0) AS total_spent
         FROM profiles p
         LEFT JOIN orders o ON o.user_id = p.id
         WHERE p.role = 'customer'
         GROUP BY p.id
         ORDER BY p.created_at DESC
         LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success("Customers", customers, Some(meta)))
}

pub async fn customer_orders(
    state: &AppState,
    user: &AuthUser,
    customer_id: Uuid,
) -> AppResult<ApiResponse<MyOrdersList>> {
    ensure_admin(user)?;

    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM profiles WHERE id = $1")
        .bind(customer_id)
        .fetch_optional(&state.pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound);
    }

    let orders = Orders::find()
        .filter(OrderCol::UserId.eq(customer_id))
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let mut items_by_order = order_service::load_item_views(&state.pool, &ids).await?;

    let items = orders
        .into_iter()
        .map(|order| {
            let items = items_by_order.remove(&order.id).unwrap_or_default();
            OrderWithItems {
                order: order_from_entity(order),
                items,
            }
        })
        .collect();

    Ok(ApiResponse::success(
        "Customer orders",
        MyOrdersList { items },
        Some(Meta::empty()),
    ))
}

fn order_from_entity(model: OrderModel) -> OrderView {
    OrderView {
        id: model.id,
        order_number: model.order_number,
        user_id: model.user_id,
        table_id: model.table_id,
        coupon_id: model.coupon_id,
        subtotal: model.subtotal,
        discount: model.discount,
        total: model.total,
        status: model.status,
        payment_id: model.payment_id,
        payment_status: model.payment_status,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
