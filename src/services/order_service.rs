use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::orders::{
        BoardItem, BoardList, BoardOrder, CreateOrderRequest, MyOrdersList, OrderItemInput,
        OrderItemView, OrderList, OrderView, OrderWithItems,
    },
    entity::{
        cafe_tables::{Column as TableCol, Entity as CafeTables},
        menu_items::{Column as MenuItemCol, Entity as MenuItems},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
        },
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
            OrderStatus, PaymentStatus,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    pricing,
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::coupon_service,
    state::AppState,
};

/// Largest drift tolerated between client-declared totals and the server
/// quote before the commit is rejected.
const DECLARED_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Gateway capture attached when the commit follows a verified payment.
pub struct PaymentCapture {
    pub payment_id: String,
}

pub struct DeclaredTotals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

pub struct CommitArgs {
    pub items: Vec<OrderItemInput>,
    pub table_id: Uuid,
    pub coupon_id: Option<Uuid>,
    pub payment: Option<PaymentCapture>,
    pub declared: Option<DeclaredTotals>,
}

/// The single write path for new orders. Prices every line from the live
/// menu, re-validates the coupon, and inserts order + items + coupon usage
/// in one transaction, so a failed step leaves nothing behind.
pub(crate) async fn commit_order(
    state: &AppState,
    user: &AuthUser,
    args: CommitArgs,
) -> AppResult<OrderWithItems> {
    let CommitArgs {
        items,
        table_id,
        coupon_id,
        payment,
        declared,
    } = args;

    if items.is_empty() {
        return Err(AppError::BadRequest("Order has no items".into()));
    }
    for line in &items {
        if line.quantity <= 0 {
            return Err(AppError::BadRequest("Order has invalid quantity".into()));
        }
    }

    let txn = state.orm.begin().await?;

    let table = CafeTables::find_by_id(table_id).one(&txn).await?;
    if table.is_none() {
        return Err(AppError::BadRequest("Table not found".into()));
    }

    struct ResolvedLine {
        menu_item_id: Uuid,
        name: String,
        unit_price: Decimal,
        quantity: i32,
    }

    let menu_ids: Vec<Uuid> = items.iter().map(|line| line.menu_item_id).collect();
    let menu_rows = MenuItems::find()
        .filter(MenuItemCol::Id.is_in(menu_ids))
        .all(&txn)
        .await?;
    let menu: HashMap<Uuid, _> = menu_rows.iter().map(|m| (m.id, m)).collect();

    let mut resolved: Vec<ResolvedLine> = Vec::with_capacity(items.len());
    for line in &items {
        let item = match menu.get(&line.menu_item_id) {
            Some(m) => *m,
            None => {
                return Err(AppError::BadRequest(format!(
                    "Menu item {} not found",
                    line.menu_item_id
                )));
            }
        };
        if !item.available {
            return Err(AppError::BadRequest(format!(
                "{} is currently unavailable",
                item.name
            )));
        }
        resolved.push(ResolvedLine {
            menu_item_id: item.id,
            name: item.name.clone(),
            unit_price: item.price,
            quantity: line.quantity,
        });
    }

    let lines: Vec<(Decimal, i32)> = resolved
        .iter()
        .map(|line| (line.unit_price, line.quantity))
        .collect();
    let subtotal = pricing::subtotal(&lines);

    let coupon_terms = match coupon_id {
        Some(id) => {
            let coupon = coupon_service::require_eligible_by_id(&txn, id, subtotal).await?;
            Some((coupon.discount_type.clone(), coupon.discount_value))
        }
        None => None,
    };

    let totals = pricing::quote(&lines, coupon_terms.as_ref().map(|(kind, value)| (kind, *value)));

    if let Some(declared) = &declared {
        check_declared(declared, &totals)?;
    }

    let order_id = Uuid::new_v4();
    let order_number = build_order_number(order_id);
    let (payment_status, payment_id) = match payment {
        Some(capture) => (PaymentStatus::Completed, Some(capture.payment_id)),
        None => (PaymentStatus::Pending, None),
    };

    let order = OrderActive {
        id: Set(order_id),
        order_number: Set(order_number),
        user_id: Set(user.user_id),
        table_id: Set(table_id),
        coupon_id: Set(coupon_id),
        subtotal: Set(totals.subtotal),
        discount: Set(totals.discount),
        total: Set(totals.total),
        status: Set(OrderStatus::Pending),
        payment_id: Set(payment_id),
        payment_status: Set(payment_status),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut order_items: Vec<OrderItemView> = Vec::new();

    for line in &resolved {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            menu_item_id: Set(line.menu_item_id),
            quantity: Set(line.quantity),
            unit_price: Set(line.unit_price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;

        order_items.push(OrderItemView {
            id: item.id,
            menu_item_id: item.menu_item_id,
            name: line.name.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
        });
    }

    if let Some(id) = coupon_id {
        coupon_service::redeem(&txn, id).await?;
    }

    txn.commit()
        .await
        .map_err(|e| AppError::PartialCommit(e.to_string()))?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_commit",
        Some("orders"),
        Some(serde_json::json!({
            "order_id": order.id,
            "order_number": order.order_number,
            "total": order.total,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }
    state.feed.publish("orders", "insert", Some(order.id));

    Ok(OrderWithItems {
        order: order_view(order),
        items: order_items,
    })
}

pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let CreateOrderRequest {
        items,
        table_id,
        coupon_id,
    } = payload;

    let order = commit_order(
        state,
        user,
        CommitArgs {
            items,
            table_id,
            coupon_id,
            payment: None,
            declared: None,
        },
    )
    .await?;

    Ok(ApiResponse::success(
        "Order placed",
        order,
        Some(Meta::empty()),
    ))
}

pub async fn list_my_orders(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<MyOrdersList>> {
    let orders = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let mut items_by_order = load_item_views(&state.pool, &ids).await?;

    let items = orders
        .into_iter()
        .map(|order| {
            let items = items_by_order.remove(&order.id).unwrap_or_default();
            OrderWithItems {
                order: order_view(order),
                items,
            }
        })
        .collect();

    Ok(ApiResponse::success(
        "Ok",
        MyOrdersList { items },
        Some(Meta::empty()),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let mut items_by_order = load_item_views(&state.pool, &[order.id]).await?;
    let items = items_by_order.remove(&order.id).unwrap_or_default();

    Ok(ApiResponse::success(
        "Ok",
        OrderWithItems {
            order: order_view(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(parse_status(status)?));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_view)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_admin(user)?;

    let order = Orders::find_by_id(id).one(&state.orm).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let mut items_by_order = load_item_views(&state.pool, &[order.id]).await?;
    let items = items_by_order.remove(&order.id).unwrap_or_default();

    Ok(ApiResponse::success(
        "Ok",
        OrderWithItems {
            order: order_view(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn advance_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderView>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let current = order.status;
    let next = current.next();
    if next == current {
        txn.commit().await?;
        return Ok(ApiResponse::success(
            "Order already served",
            order_view(order),
            Some(Meta::empty()),
        ));
    }

    let mut active: OrderActive = order.into();
    active.status = Set(next);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_advance",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "status": order.status.as_str() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }
    state.feed.publish("orders", "update", Some(order.id));

    Ok(ApiResponse::success(
        "Order status updated",
        order_view(order),
        Some(Meta::empty()),
    ))
}

pub async fn delete_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    if order.is_none() {
        return Err(AppError::NotFound);
    }

    OrderItems::delete_many()
        .filter(OrderItemCol::OrderId.eq(id))
        .exec(&txn)
        .await?;
    Orders::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_delete",
        Some("orders"),
        Some(serde_json::json!({ "order_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }
    state.feed.publish("orders", "delete", Some(id));

    Ok(ApiResponse::success(
        "Order deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Everything a kitchen screen shows: open orders oldest first, with table
/// numbers and line items resolved.
pub async fn kitchen_board(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<BoardList>> {
    ensure_admin(user)?;

    let orders = Orders::find()
        .filter(OrderCol::Status.ne(OrderStatus::Served))
        .order_by_asc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let table_ids: Vec<Uuid> = orders.iter().map(|o| o.table_id).collect();
    let tables: HashMap<Uuid, i32> = CafeTables::find()
        .filter(TableCol::Id.is_in(table_ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|t| (t.id, t.table_number))
        .collect();

    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let mut items_by_order = load_item_views(&state.pool, &ids).await?;

    let items = orders
        .into_iter()
        .map(|order| {
            let lines = items_by_order
                .remove(&order.id)
                .unwrap_or_default()
                .into_iter()
                .map(|item| BoardItem {
                    name: item.name,
                    quantity: item.quantity,
                })
                .collect();
            BoardOrder {
                id: order.id,
                order_number: order.order_number.clone(),
                status: order.status,
                table_number: tables.get(&order.table_id).copied().unwrap_or(0),
                created_at: order.created_at.with_timezone(&Utc),
                items: lines,
            }
        })
        .collect();

    Ok(ApiResponse::success(
        "Board",
        BoardList { items },
        Some(Meta::empty()),
    ))
}

#[derive(sqlx::FromRow)]
struct ItemViewRow {
    id: Uuid,
    order_id: Uuid,
    menu_item_id: Uuid,
    name: String,
    quantity: i32,
    unit_price: Decimal,
}

/// Line items for a batch of orders with menu names resolved, grouped by
/// order id.
pub(crate) async fn load_item_views(
    pool: &DbPool,
    order_ids: &[Uuid],
) -> AppResult<HashMap<Uuid, Vec<OrderItemView>>> {
    let mut grouped: HashMap<Uuid, Vec<OrderItemView>> = HashMap::new();
    if order_ids.is_empty() {
        return Ok(grouped);
    }

    let rows: Vec<ItemViewRow> = sqlx::query_as(
        "SELECT oi.id, oi.order_id, oi.menu_item_id, mi.name, oi.quantity, oi.unit_price
         FROM order_items oi
         JOIN menu_items mi ON mi.id = oi.menu_item_id
         WHERE oi.order_id = ANY($1)
         ORDER BY oi.created_at",
    )
    .bind(order_ids)
    .fetch_all(pool)
    .await?;

    for row in rows {
        grouped
            .entry(row.order_id)
            .or_default()
            .push(OrderItemView {
                id: row.id,
                menu_item_id: row.menu_item_id,
                name: row.name,
                quantity: row.quantity,
                unit_price: row.unit_price,
            });
    }
    Ok(grouped)
}

fn check_declared(declared: &DeclaredTotals, totals: &pricing::Totals) -> AppResult<()> {
    let drift = [
        (declared.subtotal - totals.subtotal).abs(),
        (declared.discount - totals.discount).abs(),
        (declared.total - totals.total).abs(),
    ];
    if drift.iter().any(|d| *d > DECLARED_TOLERANCE) {
        return Err(AppError::BadRequest(
            "Order totals do not match server pricing".into(),
        ));
    }
    Ok(())
}

fn parse_status(raw: &str) -> AppResult<OrderStatus> {
    let status = match raw {
        "pending" => OrderStatus::Pending,
        "preparing" => OrderStatus::Preparing,
        "ready" => OrderStatus::Ready,
        "served" => OrderStatus::Served,
        _ => return Err(AppError::BadRequest("Invalid order status".into())),
    };
    Ok(status)
}

pub(crate) fn order_view(model: OrderModel) -> OrderView {
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

fn build_order_number(order_id: Uuid) -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix = order_id.to_string();
    let short = &suffix[..8];
    format!("ORD-{}-{}", date, short)
}
